//! Storage trait seams
//!
//! The pipeline and the HTTP layer reach persistent state only through
//! these traits; the API crate provides the Postgres implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{Classification, SourceType};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("user not found")]
    UserNotFound,

    /// A (value, type) pair already exists anywhere in the watchlist.
    /// Global dedupe, first reporter wins.
    #[error("entry already reported")]
    DuplicateEntry,

    /// Merged on purpose: callers cannot distinguish "doesn't exist" from
    /// "not yours", so non-owners learn nothing about an entry's existence.
    #[error("entry not found or not owned by caller")]
    NotFoundOrUnauthorized,

    #[error("invalid watchlist type: {0}")]
    InvalidType(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Value families that can be community-reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchlistType {
    Phone,
    Email,
    Url,
}

impl WatchlistType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchlistType::Phone => "phone",
            WatchlistType::Email => "email",
            WatchlistType::Url => "url",
        }
    }

    pub fn parse(s: &str) -> Result<Self, StoreError> {
        match s {
            "phone" => Ok(WatchlistType::Phone),
            "email" => Ok(WatchlistType::Email),
            "url" => Ok(WatchlistType::Url),
            other => Err(StoreError::InvalidType(other.to_string())),
        }
    }
}

impl std::fmt::Display for WatchlistType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A community-reported bad actor. The reporting user is a reference, not
/// ownership of the value itself, and outlives account deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Option<Uuid>,
    pub value: String,
    #[serde(rename = "type")]
    pub entry_type: WatchlistType,
    pub date_added: DateTime<Utc>,
}

/// One entry in a user's append-only detection history. Write-once,
/// read-many; never mutated after append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionRecord {
    pub content: String,
    pub result: Classification,
    pub explanation: String,
    pub source_type: SourceType,
    pub date: DateTime<Utc>,
}

/// Community watchlist: report, lookup, list, owner-scoped delete.
#[async_trait]
pub trait WatchlistStore: Send + Sync {
    async fn lookup(
        &self,
        value: &str,
        entry_type: WatchlistType,
    ) -> Result<Option<WatchlistEntry>, StoreError>;

    async fn report(
        &self,
        user_id: Uuid,
        value: &str,
        entry_type: WatchlistType,
    ) -> Result<WatchlistEntry, StoreError>;

    /// Entries reported by one user, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<WatchlistEntry>, StoreError>;

    async fn delete(&self, entry_id: Uuid, user_id: Uuid) -> Result<(), StoreError>;
}

/// Per-user detection history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Atomically append one record. A single storage-level mutation:
    /// concurrent appends by the same user must never drop an entry.
    async fn append(&self, user_id: Uuid, record: DetectionRecord) -> Result<(), StoreError>;

    /// Full history in append (chronological) order.
    async fn records_for_user(&self, user_id: Uuid) -> Result<Vec<DetectionRecord>, StoreError>;
}
