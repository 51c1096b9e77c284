//! User profile routes

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use scamguard_core::StoreError;

use crate::auth::AuthUser;
use crate::db::{schema::User, ProfilePatch, UserStore};
use crate::error::ApiError;
use crate::AppState;

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<User>, ApiError> {
    let profile = state
        .users
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(profile))
}

/// Password is deliberately not part of this shape; it cannot be changed
/// through the profile path.
#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub occupation: Option<String>,
    #[serde(rename = "profilePicture")]
    pub profile_picture: Option<String>,
    #[serde(rename = "phoneNumber")]
    pub phone_number: Option<String>,
}

#[derive(Serialize)]
pub struct UpdateProfileResponse {
    pub message: String,
    #[serde(rename = "updatedUser")]
    pub updated_user: User,
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UpdateProfileResponse>, ApiError> {
    let patch = ProfilePatch {
        name: payload.name,
        age: payload.age,
        occupation: payload.occupation,
        profile_picture: payload.profile_picture,
        phone_number: payload.phone_number,
    };

    let updated_user = state
        .users
        .update_profile(user.id, patch)
        .await
        .map_err(|e| match e {
            StoreError::DuplicateEntry => {
                ApiError::Conflict("Email or phone number already in use".to_string())
            }
            other => other.into(),
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UpdateProfileResponse {
        message: "Profile updated successfully".to_string(),
        updated_user,
    }))
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    // history cascades with the row; watchlist entries survive with the
    // reporter reference severed
    let deleted = state.users.delete(user.id).await?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    Ok(Json(MessageResponse {
        message: "Account deleted successfully".to_string(),
    }))
}
