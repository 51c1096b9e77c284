//! Public scam advisory routes

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{self, schema::ScamUpdate};
use crate::error::ApiError;
use crate::AppState;

#[derive(Deserialize)]
pub struct AddUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub update_type: Option<String>,
}

#[derive(Serialize)]
pub struct AddUpdateResponse {
    pub message: String,
    pub update: ScamUpdate,
}

pub async fn add_update(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AddUpdateRequest>,
) -> Result<(StatusCode, Json<AddUpdateResponse>), ApiError> {
    let (title, description, update_type) = match (
        payload.title,
        payload.description,
        payload.update_type,
    ) {
        (Some(t), Some(d), Some(ty)) if !t.is_empty() && !d.is_empty() && !ty.is_empty() => {
            (t, d, ty)
        }
        _ => return Err(ApiError::Validation("Fields missing".to_string())),
    };

    let update = db::insert_update(&state.db, &title, &description, &update_type).await?;

    Ok((
        StatusCode::CREATED,
        Json(AddUpdateResponse {
            message: "Scam update added".to_string(),
            update,
        }),
    ))
}

#[derive(Serialize)]
pub struct UpdatesResponse {
    pub updates: Vec<ScamUpdate>,
}

pub async fn list_updates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UpdatesResponse>, ApiError> {
    let updates = db::list_updates(&state.db).await?;
    Ok(Json(UpdatesResponse { updates }))
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn delete_update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    // deletion is idempotent: removing an absent advisory still succeeds
    db::delete_update(&state.db, id).await?;
    Ok(Json(MessageResponse {
        message: "Scam update deleted".to_string(),
    }))
}
