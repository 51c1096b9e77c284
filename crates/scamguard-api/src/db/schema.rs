//! Database row types

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub age: Option<i32>,
    pub occupation: Option<String>,
    #[serde(rename = "profilePicture")]
    pub profile_picture: String,
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct DetectionRecordRow {
    pub content: String,
    pub result: String,
    pub explanation: String,
    pub source_type: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, FromRow, Serialize)]
pub struct ScamUpdate {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub update_type: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct WatchlistRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub value: String,
    pub entry_type: String,
    pub date_added: DateTime<Utc>,
}
