//! API handlers
//!
//! Every handler checks its required parameters first and answers 400
//! without touching the store when one is missing. A parameter counts as
//! missing when it is absent, `null` or an empty string.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::repository::Removal;
use crate::types::{Fields, ListData, Members, WatchList, WatchListEntry};
use crate::Error;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamQuery {
    pub team_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberQuery {
    pub team_name: Option<String>,
    pub member_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameQuery {
    pub old_team_name: Option<String>,
    pub new_team_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub team_name: Option<String>,
    pub list_name: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Parse an optional JSON request body. An empty body is `None`.
fn parse_body(body: &Bytes) -> ApiResult<Option<Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))
}

/// A non-empty string field of a JSON object body
fn body_str(body: Option<&Value>, field: &str) -> Option<String> {
    match body?.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// A body field holding a truthy value: not `null`, `false`, `0` or `""`
fn body_value(body: Option<&Value>, field: &str) -> Option<Value> {
    match body?.get(field)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.clone()),
    }
}

/// The whole body as a JSON object
fn body_object(body: Option<Value>) -> Option<Fields> {
    match body? {
        Value::Object(fields) => Some(fields),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub node_id: String,
    pub teams: usize,
}

/// Health check with system status
pub async fn health(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let teams = state
        .repo
        .team_names()
        .await
        .map_err(|e| ApiError::store("checking health", e))?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        node_id: state.node_id().to_string(),
        teams: teams.len(),
    }))
}

pub async fn get_teams(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    let teams = state
        .repo
        .team_names()
        .await
        .map_err(|e| ApiError::store("getting teams", e))?;
    Ok(Json(teams))
}

pub async fn add_team(State(state): State<AppState>, body: Bytes) -> ApiResult<&'static str> {
    let body = parse_body(&body)?;
    let name = body_str(body.as_ref(), "name")
        .ok_or_else(|| ApiError::bad_request("Team name is required"))?;

    state
        .repo
        .put_team(&name)
        .await
        .map_err(|e| ApiError::store("adding team", e))?;

    tracing::info!(team = %name, "Team added");
    Ok("Team added successfully")
}

/// Delete a team. Its watch lists are left in place.
pub async fn delete_team(
    State(state): State<AppState>,
    Query(query): Query<TeamQuery>,
) -> ApiResult<&'static str> {
    let team = present(query.team_name)
        .ok_or_else(|| ApiError::bad_request("Team name is required"))?;

    state
        .repo
        .delete_team(&team)
        .await
        .map_err(|e| ApiError::store("deleting team", e))?;

    tracing::info!(%team, "Team deleted");
    Ok("Team deleted successfully")
}

pub async fn get_members(
    State(state): State<AppState>,
    Query(query): Query<TeamQuery>,
) -> ApiResult<Json<Members>> {
    let team = present(query.team_name)
        .ok_or_else(|| ApiError::bad_request("Team name is required"))?;

    state
        .repo
        .members(&team)
        .await
        .map_err(|e| ApiError::store("getting members", e))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Team not found"))
}

/// Replace a team's members with the request body
pub async fn update_members(
    State(state): State<AppState>,
    Query(query): Query<TeamQuery>,
    body: Bytes,
) -> ApiResult<&'static str> {
    let body = parse_body(&body)?;
    let (Some(team), Some(members)) = (present(query.team_name), body_object(body)) else {
        return Err(ApiError::bad_request("Team name and members are required"));
    };

    state
        .repo
        .set_members(&team, members)
        .await
        .map_err(|e| match e {
            Error::DocumentNotFound(_) => ApiError::not_found("Team not found"),
            other => ApiError::store("updating members", other),
        })?;

    Ok("Members updated successfully")
}

pub async fn delete_member(
    State(state): State<AppState>,
    Query(query): Query<MemberQuery>,
) -> ApiResult<&'static str> {
    let (Some(team), Some(member)) = (present(query.team_name), present(query.member_name))
    else {
        return Err(ApiError::bad_request(
            "Team name and member name are required",
        ));
    };

    let outcome = state
        .repo
        .remove_member(&team, &member)
        .await
        .map_err(|e| ApiError::store("deleting member", e))?;

    match outcome {
        Removal::Removed => Ok("Member deleted successfully"),
        Removal::TeamNotFound => Err(ApiError::not_found("Team not found")),
        Removal::MemberNotFound => Err(ApiError::not_found("Member not found")),
    }
}

/// Rename a team by moving its document. Watch lists keep the old name.
pub async fn change_team_name(
    State(state): State<AppState>,
    Query(query): Query<RenameQuery>,
) -> ApiResult<&'static str> {
    let (Some(old_name), Some(new_name)) =
        (present(query.old_team_name), present(query.new_team_name))
    else {
        return Err(ApiError::bad_request(
            "Old team name and new team name are required",
        ));
    };

    let renamed = state
        .repo
        .rename_team(&old_name, &new_name)
        .await
        .map_err(|e| ApiError::store("changing team name", e))?;

    if !renamed {
        return Err(ApiError::not_found("Old team not found"));
    }
    Ok("Team name changed successfully")
}

pub async fn get_watch_lists(
    State(state): State<AppState>,
    Query(query): Query<TeamQuery>,
) -> ApiResult<Json<Vec<WatchListEntry>>> {
    let team = present(query.team_name)
        .ok_or_else(|| ApiError::bad_request("Team name is required"))?;

    let lists = state
        .repo
        .watch_lists(&team)
        .await
        .map_err(|e| ApiError::store("getting watch lists", e))?;
    Ok(Json(lists))
}

pub async fn create_watch_list(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<&'static str> {
    let body = parse_body(&body)?;
    let body = body.as_ref();
    let (Some(team), Some(list), Some(timestamp)) = (
        body_str(body, "teamName"),
        body_str(body, "listName"),
        body_value(body, "timestamp"),
    ) else {
        return Err(ApiError::bad_request(
            "Team name, list name, and timestamp are required",
        ));
    };

    state
        .repo
        .put_watch_list(&team, &list, timestamp)
        .await
        .map_err(|e| ApiError::store("creating watch list", e))?;

    tracing::info!(%team, %list, "Watch list created");
    Ok("Watch list created successfully")
}

pub async fn delete_watch_list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<&'static str> {
    let (team, list) = required_list(query)?;

    state
        .repo
        .delete_watch_list(&team, &list)
        .await
        .map_err(|e| ApiError::store("deleting watch list", e))?;

    Ok("Watch list deleted successfully")
}

pub async fn get_watch_list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<WatchList>> {
    let (team, list) = required_list(query)?;

    state
        .repo
        .watch_list(&team, &list)
        .await
        .map_err(|e| ApiError::store("fetching document", e))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Document not found"))
}

/// Merge the request body into a watch list as schedule data
pub async fn save_schedule(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    body: Bytes,
) -> ApiResult<&'static str> {
    let body = parse_body(&body)?;
    let (Some(team), Some(list), Some(schedule)) = (
        present(query.team_name),
        present(query.list_name),
        body_object(body),
    ) else {
        return Err(ApiError::bad_request(
            "Team name, list name, and schedule data are required",
        ));
    };

    state
        .repo
        .save_schedule(&team, &list, schedule)
        .await
        .map_err(|e| ApiError::store("saving schedule", e))?;

    Ok("Schedule successfully saved!")
}

/// Store `body.listData` as a list document named by its `listName`
pub async fn add_list(
    State(state): State<AppState>,
    Query(query): Query<TeamQuery>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let body = parse_body(&body)?;
    let list_data = body
        .and_then(|mut b| b.get_mut("listData").map(Value::take))
        .filter(Value::is_object);

    let (Some(team), Some(list_data)) = (present(query.team_name), list_data) else {
        return Err(ApiError::bad_request("Team name and list data are required"));
    };

    let list_data: ListData = serde_json::from_value(list_data)
        .map_err(|e| ApiError::bad_request(format!("Invalid list data: {}", e)))?;
    if list_data.list_name.is_empty() {
        return Err(ApiError::bad_request("List name is required"));
    }

    state
        .repo
        .put_list(&team, &list_data)
        .await
        .map_err(|e| ApiError::store("adding list", e))?;

    Ok(StatusCode::OK)
}

/// Same behaviour as `delete_watch_list`, different confirmation text
pub async fn delete_list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<&'static str> {
    let (team, list) = required_list(query)?;

    state
        .repo
        .delete_watch_list(&team, &list)
        .await
        .map_err(|e| ApiError::store("deleting document", e))?;

    Ok("Document successfully deleted!")
}

fn required_list(query: ListQuery) -> ApiResult<(String, String)> {
    match (present(query.team_name), present(query.list_name)) {
        (Some(team), Some(list)) => Ok((team, list)),
        _ => Err(ApiError::bad_request("Team name and list name are required")),
    }
}
