//! Postgres persistence
//!
//! Implements the core crate's store traits over sqlx, plus the user and
//! advisory queries the routes need. The runtime query API is used
//! throughout; constraint violations are translated by SQLSTATE rather
//! than checked-then-inserted in application code.

pub mod schema;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use scamguard_core::{
    Classification, DetectionRecord, HistoryStore, SourceType, StoreError, WatchlistEntry,
    WatchlistStore, WatchlistType,
};

use schema::{DetectionRecordRow, ScamUpdate, User, WatchlistRow};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

fn map_store_error(err: sqlx::Error) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => return StoreError::DuplicateEntry,
            Some(FOREIGN_KEY_VIOLATION) => return StoreError::UserNotFound,
            _ => {}
        }
    }
    StoreError::Backend(err.to_string())
}

// ---------------------------------------------------------------- history

#[derive(Clone)]
pub struct PgHistory {
    pool: PgPool,
}

impl PgHistory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryStore for PgHistory {
    async fn append(&self, user_id: Uuid, record: DetectionRecord) -> Result<(), StoreError> {
        // single INSERT: the append is one storage-level mutation, so
        // concurrent submissions by the same user cannot lose entries
        sqlx::query(
            "INSERT INTO detection_records (id, user_id, content, result, explanation, source_type, date)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&record.content)
        .bind(record.result.as_str())
        .bind(&record.explanation)
        .bind(record.source_type.as_str())
        .bind(record.date)
        .execute(&self.pool)
        .await
        .map_err(map_store_error)?;

        Ok(())
    }

    async fn records_for_user(&self, user_id: Uuid) -> Result<Vec<DetectionRecord>, StoreError> {
        let rows: Vec<DetectionRecordRow> = sqlx::query_as(
            "SELECT content, result, explanation, source_type, date
             FROM detection_records WHERE user_id = $1 ORDER BY date ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_store_error)?;

        rows.into_iter().map(record_from_row).collect()
    }
}

fn record_from_row(row: DetectionRecordRow) -> Result<DetectionRecord, StoreError> {
    let result = Classification::parse(&row.result)
        .ok_or_else(|| StoreError::Backend(format!("unknown classification '{}'", row.result)))?;
    let source_type = SourceType::parse(&row.source_type)
        .ok_or_else(|| StoreError::Backend(format!("unknown source type '{}'", row.source_type)))?;

    Ok(DetectionRecord {
        content: row.content,
        result,
        explanation: row.explanation,
        source_type,
        date: row.date,
    })
}

// -------------------------------------------------------------- watchlist

#[derive(Clone)]
pub struct PgWatchlist {
    pool: PgPool,
}

impl PgWatchlist {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WatchlistStore for PgWatchlist {
    async fn lookup(
        &self,
        value: &str,
        entry_type: WatchlistType,
    ) -> Result<Option<WatchlistEntry>, StoreError> {
        let row: Option<WatchlistRow> = sqlx::query_as(
            "SELECT id, user_id, value, entry_type, date_added
             FROM watchlist_entries WHERE value = $1 AND entry_type = $2",
        )
        .bind(value)
        .bind(entry_type.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_store_error)?;

        row.map(entry_from_row).transpose()
    }

    async fn report(
        &self,
        user_id: Uuid,
        value: &str,
        entry_type: WatchlistType,
    ) -> Result<WatchlistEntry, StoreError> {
        // the UNIQUE (value, entry_type) constraint closes the
        // check-then-act race; a concurrent duplicate surfaces as 23505
        let row: WatchlistRow = sqlx::query_as(
            "INSERT INTO watchlist_entries (id, user_id, value, entry_type, date_added)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, user_id, value, entry_type, date_added",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(value)
        .bind(entry_type.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(map_store_error)?;

        entry_from_row(row)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<WatchlistEntry>, StoreError> {
        let rows: Vec<WatchlistRow> = sqlx::query_as(
            "SELECT id, user_id, value, entry_type, date_added
             FROM watchlist_entries WHERE user_id = $1 ORDER BY date_added DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_store_error)?;

        rows.into_iter().map(entry_from_row).collect()
    }

    async fn delete(&self, entry_id: Uuid, user_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM watchlist_entries WHERE id = $1 AND user_id = $2")
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(map_store_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFoundOrUnauthorized);
        }
        Ok(())
    }
}

fn entry_from_row(row: WatchlistRow) -> Result<WatchlistEntry, StoreError> {
    let entry_type = WatchlistType::parse(&row.entry_type)?;
    Ok(WatchlistEntry {
        id: row.id,
        user_id: row.user_id,
        value: row.value,
        entry_type,
        date_added: row.date_added,
    })
}

// ------------------------------------------------------------------ users

pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub age: Option<i32>,
    pub occupation: &'a str,
    pub phone_number: &'a str,
}

pub struct ProfilePatch {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub occupation: Option<String>,
    pub profile_picture: Option<String>,
    pub phone_number: Option<String>,
}

/// User persistence, behind a trait so the auth handlers can be tested
/// against an in-memory implementation.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>, StoreError>;
    async fn insert(&self, user: NewUser<'_>) -> Result<Uuid, StoreError>;
    async fn set_refresh_token(
        &self,
        user_id: Uuid,
        refresh_token: Option<&str>,
    ) -> Result<(), StoreError>;
    async fn update_profile(
        &self,
        user_id: Uuid,
        patch: ProfilePatch,
    ) -> Result<Option<User>, StoreError>;
    async fn delete(&self, user_id: Uuid) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgUsers {
    pool: PgPool,
}

impl PgUsers {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUsers {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_store_error)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_store_error)
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as("SELECT * FROM users WHERE phone_number = $1")
            .bind(phone_number)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_store_error)
    }

    async fn insert(&self, user: NewUser<'_>) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        // unique constraints on email and phone_number surface as 23505
        // when a concurrent registration slips past the handler's check
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, age, occupation, phone_number)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(id)
        .bind(user.name)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.age)
        .bind(user.occupation)
        .bind(user.phone_number)
        .execute(&self.pool)
        .await
        .map_err(map_store_error)?;
        Ok(id)
    }

    async fn set_refresh_token(
        &self,
        user_id: Uuid,
        refresh_token: Option<&str>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET refresh_token = $2 WHERE id = $1")
            .bind(user_id)
            .bind(refresh_token)
            .execute(&self.pool)
            .await
            .map_err(map_store_error)?;
        Ok(())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        patch: ProfilePatch,
    ) -> Result<Option<User>, StoreError> {
        sqlx::query_as(
            "UPDATE users SET
                 name = COALESCE($2, name),
                 age = COALESCE($3, age),
                 occupation = COALESCE($4, occupation),
                 profile_picture = COALESCE($5, profile_picture),
                 phone_number = COALESCE($6, phone_number)
             WHERE id = $1
             RETURNING *",
        )
        .bind(user_id)
        .bind(patch.name)
        .bind(patch.age)
        .bind(patch.occupation)
        .bind(patch.profile_picture)
        .bind(patch.phone_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_store_error)
    }

    async fn delete(&self, user_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(map_store_error)?;
        Ok(result.rows_affected() > 0)
    }
}

// ------------------------------------------------------------- advisories

pub async fn insert_update(
    pool: &PgPool,
    title: &str,
    description: &str,
    update_type: &str,
) -> Result<ScamUpdate, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO scam_updates (id, title, description, update_type, date)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, title, description, update_type, date",
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(description)
    .bind(update_type)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn list_updates(pool: &PgPool) -> Result<Vec<ScamUpdate>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, title, description, update_type, date
         FROM scam_updates ORDER BY date DESC",
    )
    .fetch_all(pool)
    .await
}

pub async fn delete_update(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM scam_updates WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
