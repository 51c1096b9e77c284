//! Authentication routes: register, login, refresh, logout
//!
//! The handlers are thin wrappers over functions that take the user
//! store as a trait object, so the credential flows are testable without
//! a database.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use scamguard_core::StoreError;

use crate::auth::{
    self, create_access_token, create_refresh_token, verify_password, verify_refresh_token,
    AuthUser,
};
use crate::db::{NewUser, UserStore};
use crate::error::ApiError;
use crate::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub age: Option<i32>,
    pub occupation: Option<String>,
    #[serde(rename = "phoneNumber")]
    pub phone_number: Option<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    register_user(state.users.as_ref(), payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered successfully".to_string(),
        }),
    ))
}

async fn register_user(users: &dyn UserStore, payload: RegisterRequest) -> Result<Uuid, ApiError> {
    // missing and empty-string fields are both rejected
    let (name, email, password, age, occupation, phone_number) = match (
        non_empty(payload.name),
        non_empty(payload.email),
        non_empty(payload.password),
        payload.age,
        non_empty(payload.occupation),
        non_empty(payload.phone_number),
    ) {
        (Some(n), Some(e), Some(p), Some(a), Some(o), Some(ph)) => (n, e, p, a, o, ph),
        _ => return Err(ApiError::Validation("All fields are required".to_string())),
    };

    if users.find_by_email(&email).await?.is_some()
        || users.find_by_phone(&phone_number).await?.is_some()
    {
        return Err(ApiError::Validation("User already exists".to_string()));
    }

    let password_hash = auth::hash_password(&password)?;
    users
        .insert(NewUser {
            name: &name,
            email: &email,
            password_hash: &password_hash,
            age: Some(age),
            occupation: &occupation,
            phone_number: &phone_number,
        })
        .await
        .map_err(|e| match e {
            // a concurrent registration slipped past the check above
            StoreError::DuplicateEntry => ApiError::Conflict("User already exists".to_string()),
            other => other.into(),
        })
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    #[serde(rename = "phoneNumber")]
    pub phone_number: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    login_user(
        state.users.as_ref(),
        &state.config.access_token_secret,
        &state.config.refresh_token_secret,
        payload,
    )
    .await
    .map(Json)
}

async fn login_user(
    users: &dyn UserStore,
    access_secret: &str,
    refresh_secret: &str,
    payload: LoginRequest,
) -> Result<LoginResponse, ApiError> {
    let password = non_empty(payload.password)
        .ok_or_else(|| ApiError::Validation("Password is required".to_string()))?;

    // phone number takes precedence when both identifiers are present
    let user = match (non_empty(payload.phone_number), non_empty(payload.email)) {
        (Some(phone), _) => users.find_by_phone(&phone).await?,
        (None, Some(email)) => users.find_by_email(&email).await?,
        (None, None) => {
            return Err(ApiError::Validation("Phone or email required".to_string()));
        }
    }
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !verify_password(&password, &user.password_hash)? {
        return Err(ApiError::Auth("Invalid credentials".to_string()));
    }

    let access_token = create_access_token(user.id, &user.email, access_secret)?;
    let refresh_token = create_refresh_token(user.id, refresh_secret)?;
    users.set_refresh_token(user.id, Some(&refresh_token)).await?;

    Ok(LoginResponse {
        message: "Login successful".to_string(),
        user_id: user.id,
        access_token,
        refresh_token,
    })
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let presented = payload
        .refresh_token
        .ok_or_else(|| ApiError::Validation("Refresh token is required".to_string()))?;

    rotate_refresh_token(
        state.users.as_ref(),
        &state.config.access_token_secret,
        &state.config.refresh_token_secret,
        &presented,
    )
    .await
    .map(Json)
}

async fn rotate_refresh_token(
    users: &dyn UserStore,
    access_secret: &str,
    refresh_secret: &str,
    presented: &str,
) -> Result<RefreshResponse, ApiError> {
    let claims = verify_refresh_token(presented, refresh_secret)?;

    let user = users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    // a rotated-out or logged-out token verifies but no longer matches
    if user.refresh_token.as_deref() != Some(presented) {
        return Err(ApiError::Forbidden("Invalid refresh token".to_string()));
    }

    let access_token = create_access_token(user.id, &user.email, access_secret)?;
    let refresh_token = create_refresh_token(user.id, refresh_secret)?;
    users.set_refresh_token(user.id, Some(&refresh_token)).await?;

    Ok(RefreshResponse {
        access_token,
        refresh_token,
    })
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    state.users.set_refresh_token(user.id, None).await?;
    Ok(Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use crate::db::{schema::User, ProfilePatch};

    use super::*;

    struct MemoryUsers {
        rows: Mutex<Vec<User>>,
    }

    impl MemoryUsers {
        fn new() -> Self {
            Self {
                rows: Mutex::new(Vec::new()),
            }
        }

        fn seed(&self, email: &str, phone: &str, password: &str, refresh_token: Option<&str>) -> Uuid {
            let id = Uuid::new_v4();
            self.rows.lock().unwrap().push(User {
                id,
                name: "Test User".to_string(),
                email: email.to_string(),
                password_hash: bcrypt::hash(password, 4).unwrap(),
                age: Some(30),
                occupation: Some("tester".to_string()),
                profile_picture: String::new(),
                phone_number: phone.to_string(),
                refresh_token: refresh_token.map(str::to_string),
                created_at: Utc::now(),
            });
            id
        }

        fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }

        fn stored_refresh_token(&self, id: Uuid) -> Option<String> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.id == id)
                .and_then(|u| u.refresh_token.clone())
        }
    }

    #[async_trait]
    impl UserStore for MemoryUsers {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.id == id)
                .map(clone_user))
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email == email)
                .map(clone_user))
        }

        async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>, StoreError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.phone_number == phone_number)
                .map(clone_user))
        }

        async fn insert(&self, user: NewUser<'_>) -> Result<Uuid, StoreError> {
            let mut rows = self.rows.lock().unwrap();
            if rows
                .iter()
                .any(|u| u.email == user.email || u.phone_number == user.phone_number)
            {
                return Err(StoreError::DuplicateEntry);
            }
            let id = Uuid::new_v4();
            rows.push(User {
                id,
                name: user.name.to_string(),
                email: user.email.to_string(),
                password_hash: user.password_hash.to_string(),
                age: user.age,
                occupation: Some(user.occupation.to_string()),
                profile_picture: String::new(),
                phone_number: user.phone_number.to_string(),
                refresh_token: None,
                created_at: Utc::now(),
            });
            Ok(id)
        }

        async fn set_refresh_token(
            &self,
            user_id: Uuid,
            refresh_token: Option<&str>,
        ) -> Result<(), StoreError> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(user) = rows.iter_mut().find(|u| u.id == user_id) {
                user.refresh_token = refresh_token.map(str::to_string);
            }
            Ok(())
        }

        async fn update_profile(
            &self,
            _user_id: Uuid,
            _patch: ProfilePatch,
        ) -> Result<Option<User>, StoreError> {
            unimplemented!("not exercised here")
        }

        async fn delete(&self, user_id: Uuid) -> Result<bool, StoreError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|u| u.id != user_id);
            Ok(rows.len() != before)
        }
    }

    /// Lookups see nothing, the insert still collides. Models a
    /// concurrent registration landing between the check and the insert.
    struct RacingUsers(MemoryUsers);

    #[async_trait]
    impl UserStore for RacingUsers {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
            self.0.find_by_id(id).await
        }

        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
            Ok(None)
        }

        async fn find_by_phone(&self, _phone_number: &str) -> Result<Option<User>, StoreError> {
            Ok(None)
        }

        async fn insert(&self, user: NewUser<'_>) -> Result<Uuid, StoreError> {
            self.0.insert(user).await
        }

        async fn set_refresh_token(
            &self,
            user_id: Uuid,
            refresh_token: Option<&str>,
        ) -> Result<(), StoreError> {
            self.0.set_refresh_token(user_id, refresh_token).await
        }

        async fn update_profile(
            &self,
            user_id: Uuid,
            patch: ProfilePatch,
        ) -> Result<Option<User>, StoreError> {
            self.0.update_profile(user_id, patch).await
        }

        async fn delete(&self, user_id: Uuid) -> Result<bool, StoreError> {
            self.0.delete(user_id).await
        }
    }

    fn clone_user(user: &User) -> User {
        User {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            age: user.age,
            occupation: user.occupation.clone(),
            profile_picture: user.profile_picture.clone(),
            phone_number: user.phone_number.clone(),
            refresh_token: user.refresh_token.clone(),
            created_at: user.created_at,
        }
    }

    fn register_payload(email: &str, phone: &str) -> RegisterRequest {
        RegisterRequest {
            name: Some("Test User".to_string()),
            email: Some(email.to_string()),
            password: Some("hunter2hunter2".to_string()),
            age: Some(30),
            occupation: Some("tester".to_string()),
            phone_number: Some(phone.to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_empty_string_fields() {
        let users = MemoryUsers::new();
        let mut payload = register_payload("a@b.test", "+15550001111");
        payload.email = Some("  ".to_string());

        let err = register_user(&users, payload).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(users.len(), 0);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_leaves_single_row() {
        let users = MemoryUsers::new();
        register_user(&users, register_payload("a@b.test", "+15550001111"))
            .await
            .unwrap();

        let err = register_user(&users, register_payload("a@b.test", "+15550002222"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Validation(_) | ApiError::Conflict(_)
        ));
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn test_register_duplicate_insert_race_maps_to_conflict() {
        let users = RacingUsers(MemoryUsers::new());
        users.0.seed("a@b.test", "+15550001111", "pw", None);

        let err = register_user(&users, register_payload("a@b.test", "+15550002222"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(users.0.len(), 1);
    }

    #[tokio::test]
    async fn test_login_phone_takes_precedence_over_email() {
        let users = MemoryUsers::new();
        users.seed("first@b.test", "+15550001111", "first-pw", None);
        let second = users.seed("second@b.test", "+15550002222", "second-pw", None);

        let response = login_user(
            &users,
            "access-secret",
            "refresh-secret",
            LoginRequest {
                email: Some("first@b.test".to_string()),
                phone_number: Some("+15550002222".to_string()),
                password: Some("second-pw".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(response.user_id, second);
    }

    #[tokio::test]
    async fn test_login_ignores_empty_phone_and_uses_email() {
        let users = MemoryUsers::new();
        let id = users.seed("a@b.test", "+15550001111", "pw", None);

        let response = login_user(
            &users,
            "access-secret",
            "refresh-secret",
            LoginRequest {
                email: Some("a@b.test".to_string()),
                phone_number: Some("".to_string()),
                password: Some("pw".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(response.user_id, id);
    }

    #[tokio::test]
    async fn test_refresh_with_stale_token_is_forbidden_and_keeps_stored_token() {
        let users = MemoryUsers::new();
        let id = users.seed("a@b.test", "+15550001111", "pw", Some("current-token"));

        // verifies against the secret but was rotated out of the user row
        let stale = create_refresh_token(id, "refresh-secret").unwrap();

        let err = rotate_refresh_token(&users, "access-secret", "refresh-secret", &stale)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        assert_eq!(
            users.stored_refresh_token(id).as_deref(),
            Some("current-token")
        );
    }

    #[tokio::test]
    async fn test_refresh_with_current_token_rotates_it() {
        let users = MemoryUsers::new();
        let id = users.seed("a@b.test", "+15550001111", "pw", None);
        let current = create_refresh_token(id, "refresh-secret").unwrap();
        users.set_refresh_token(id, Some(&current)).await.unwrap();

        let response = rotate_refresh_token(&users, "access-secret", "refresh-secret", &current)
            .await
            .unwrap();
        assert_eq!(
            users.stored_refresh_token(id),
            Some(response.refresh_token)
        );
    }
}
