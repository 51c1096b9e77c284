//! Community watchlist routes

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use scamguard_core::{WatchlistEntry, WatchlistStore, WatchlistType};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;

#[derive(Deserialize)]
pub struct WatchlistRequest {
    pub value: Option<String>,
    #[serde(rename = "type")]
    pub entry_type: Option<String>,
}

#[derive(Serialize)]
pub struct WatchlistEntryResponse {
    pub message: String,
    pub entry: WatchlistEntry,
}

fn parse_request(payload: WatchlistRequest) -> Result<(String, WatchlistType), ApiError> {
    let value = payload
        .value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| {
            ApiError::Validation("Value and valid type (phone/email/url) are required".to_string())
        })?;
    let entry_type = payload.entry_type.as_deref().ok_or_else(|| {
        ApiError::Validation("Value and valid type (phone/email/url) are required".to_string())
    })?;
    Ok((value, WatchlistType::parse(entry_type)?))
}

async fn report_entry(
    state: &AppState,
    user: &AuthUser,
    payload: WatchlistRequest,
    message: &str,
) -> Result<(StatusCode, Json<WatchlistEntryResponse>), ApiError> {
    let (value, entry_type) = parse_request(payload)?;
    let entry = state.watchlist.report(user.id, &value, entry_type).await?;

    Ok((
        StatusCode::CREATED,
        Json(WatchlistEntryResponse {
            message: message.to_string(),
            entry,
        }),
    ))
}

pub async fn add_entry(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<WatchlistRequest>,
) -> Result<(StatusCode, Json<WatchlistEntryResponse>), ApiError> {
    report_entry(state.as_ref(), &user, payload, "Added to watchlist").await
}

pub async fn report(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<WatchlistRequest>,
) -> Result<(StatusCode, Json<WatchlistEntryResponse>), ApiError> {
    report_entry(state.as_ref(), &user, payload, "Reported successfully").await
}

#[derive(Serialize)]
pub struct WatchlistResponse {
    pub watchlist: Vec<WatchlistEntry>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<WatchlistResponse>, ApiError> {
    let watchlist = state.watchlist.list_for_user(user.id).await?;
    Ok(Json(WatchlistResponse { watchlist }))
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn delete_entry(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.watchlist.delete(id, user.id).await?;
    Ok(Json(MessageResponse {
        message: "Entry removed successfully".to_string(),
    }))
}
