//! HTTP API server
//!
//! One endpoint per operation, named after the operation. Endpoints accept
//! any HTTP method.

use axum::{
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::store::DocumentStore;

pub mod error;
pub mod handlers;
pub mod state;

pub use error::{ApiError, ApiResult, ErrorKind};
pub use state::AppState;

/// Build the API router using the provided application state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/getTeams", any(handlers::get_teams))
        .route("/addTeam", any(handlers::add_team))
        .route("/deleteTeam", any(handlers::delete_team))
        .route("/getMembers", any(handlers::get_members))
        .route("/updateMembers", any(handlers::update_members))
        .route("/deleteMember", any(handlers::delete_member))
        .route("/changeTeamName", any(handlers::change_team_name))
        .route("/getWatchLists", any(handlers::get_watch_lists))
        .route("/createWatchList", any(handlers::create_watch_list))
        .route("/deleteWatchList", any(handlers::delete_watch_list))
        .route("/getWatchList", any(handlers::get_watch_list))
        .route("/saveSchedule", any(handlers::save_schedule))
        .route("/addList", any(handlers::add_list))
        .route("/deleteList", any(handlers::delete_list))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Convenience helper for tests and embedded use
pub fn create_store_router(store: Arc<DocumentStore>, node_id: &str) -> Router {
    create_router(AppState::new(store, node_id))
}
