//! API server state

use std::sync::Arc;

use crate::repository::Repository;
use crate::store::DocumentStore;

/// API server state, built once at startup and shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Team and watch-list operations
    pub repo: Repository,

    /// Identifier reported by the health probe
    pub node_id: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<DocumentStore>, node_id: impl Into<Arc<str>>) -> Self {
        Self {
            repo: Repository::new(store),
            node_id: node_id.into(),
        }
    }

    /// Get this node's ID
    pub fn node_id(&self) -> &str {
        &self.node_id
    }
}
