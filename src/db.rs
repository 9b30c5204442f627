use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::llm::ClaudeClient;
use crate::models::{Program, UpdateRecord};

pub type DbPool = SqlitePool;

/// ---------------------------------------------------------------------------
/// Application State
/// ---------------------------------------------------------------------------

/// Shared state for request handlers
pub struct AppState {
  pub db: DbPool,
  /// Plan generator; `None` when no API key is configured
  pub llm: Option<ClaudeClient>,
  program_locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl AppState {
  pub fn new(db: DbPool, llm: Option<ClaudeClient>) -> Self {
    Self {
      db,
      llm,
      program_locks: Mutex::new(HashMap::new()),
    }
  }

  /// Lock serializing read-modify-write cycles on one program.
  ///
  /// Entries nobody else holds are dropped on each call, so the registry
  /// only tracks programs with a request in flight.
  pub async fn program_lock(&self, program_id: i64) -> Arc<Mutex<()>> {
    let mut locks = self.program_locks.lock().await;
    locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    locks.entry(program_id).or_default().clone()
  }
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum DbError {
  #[error("Database error: {0}")]
  Sqlx(String),

  #[error("Migration failed: {0}")]
  Migration(String),

  #[error("Program {0} not found")]
  NotFound(i64),

  #[error("Invalid stored program: {0}")]
  Serialization(String),
}

impl From<sqlx::Error> for DbError {
  fn from(e: sqlx::Error) -> Self {
    DbError::Sqlx(e.to_string())
  }
}

impl From<sqlx::migrate::MigrateError> for DbError {
  fn from(e: sqlx::migrate::MigrateError) -> Self {
    DbError::Migration(e.to_string())
  }
}

impl From<serde_json::Error> for DbError {
  fn from(e: serde_json::Error) -> Self {
    DbError::Serialization(e.to_string())
  }
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db(database_url: &str) -> Result<DbPool, DbError> {
  tracing::info!(url = %database_url, "initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(database_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  tracing::info!("database initialized");
  Ok(pool)
}

/// ---------------------------------------------------------------------------
/// Programs
/// ---------------------------------------------------------------------------

#[derive(sqlx::FromRow)]
struct ProgramRow {
  id: i64,
  program_json: String,
}

#[derive(sqlx::FromRow)]
struct UpdateRow {
  requested_at: DateTime<Utc>,
  request_text: String,
  changes_json: String,
}

/// Program JSON without its history; history lives in `program_updates`
fn snapshot_json(program: &Program) -> Result<String, DbError> {
  let snapshot = Program {
    update_history: Vec::new(),
    ..program.clone()
  };
  Ok(serde_json::to_string(&snapshot)?)
}

/// Store a new program and return it with its assigned id
pub async fn insert_program(
  pool: &DbPool,
  program: &Program,
  now: DateTime<Utc>,
) -> Result<Program, DbError> {
  let mut tx = pool.begin().await?;

  let id = sqlx::query(
    r#"
    INSERT INTO programs (program_type, goal_date, program_json, created_at, updated_at)
    VALUES (?1, ?2, '{}', ?3, ?3)
    "#,
  )
  .bind(program.program_type.as_str())
  .bind(program.goal_date)
  .bind(now)
  .execute(&mut *tx)
  .await?
  .last_insert_rowid();

  let stored = Program {
    id,
    ..program.clone()
  };

  sqlx::query("UPDATE programs SET program_json = ?1 WHERE id = ?2")
    .bind(snapshot_json(&stored)?)
    .bind(id)
    .execute(&mut *tx)
    .await?;

  tx.commit().await?;
  tracing::info!(program_id = id, program_type = program.program_type.as_str(), "program created");
  Ok(stored)
}

/// Load a program with its full update history
pub async fn load_program(pool: &DbPool, program_id: i64) -> Result<Program, DbError> {
  let row = sqlx::query_as::<_, ProgramRow>("SELECT id, program_json FROM programs WHERE id = ?1")
    .bind(program_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound(program_id))?;

  let mut program: Program = serde_json::from_str(&row.program_json)?;
  program.id = row.id;
  program.update_history = load_update_history(pool, program_id).await?;
  Ok(program)
}

/// Overwrite the stored snapshot; the update history is left untouched
pub async fn save_program(pool: &DbPool, program: &Program, now: DateTime<Utc>) -> Result<(), DbError> {
  let result = sqlx::query(
    r#"
    UPDATE programs
    SET program_type = ?1, goal_date = ?2, program_json = ?3, updated_at = ?4
    WHERE id = ?5
    "#,
  )
  .bind(program.program_type.as_str())
  .bind(program.goal_date)
  .bind(snapshot_json(program)?)
  .bind(now)
  .bind(program.id)
  .execute(pool)
  .await?;

  if result.rows_affected() == 0 {
    return Err(DbError::NotFound(program.id));
  }
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Update History
/// ---------------------------------------------------------------------------

/// Append one audit record (insert-only)
pub async fn append_update_record(
  pool: &DbPool,
  program_id: i64,
  record: &UpdateRecord,
) -> Result<(), DbError> {
  sqlx::query(
    r#"
    INSERT INTO program_updates (program_id, requested_at, request_text, changes_json)
    VALUES (?1, ?2, ?3, ?4)
    "#,
  )
  .bind(program_id)
  .bind(record.date)
  .bind(&record.request_text)
  .bind(serde_json::to_string(&record.changes)?)
  .execute(pool)
  .await?;
  Ok(())
}

/// Audit records for a program, oldest first
pub async fn load_update_history(pool: &DbPool, program_id: i64) -> Result<Vec<UpdateRecord>, DbError> {
  let rows = sqlx::query_as::<_, UpdateRow>(
    r#"
    SELECT requested_at, request_text, changes_json
    FROM program_updates
    WHERE program_id = ?1
    ORDER BY requested_at ASC, id ASC
    "#,
  )
  .bind(program_id)
  .fetch_all(pool)
  .await?;

  rows
    .into_iter()
    .map(|row| -> Result<UpdateRecord, DbError> {
      Ok(UpdateRecord {
        date: row.requested_at,
        request_text: row.request_text,
        changes: serde_json::from_str(&row.changes_json)?,
      })
    })
    .collect()
}

/// Save the new snapshot and its audit record atomically
pub async fn commit_update(
  pool: &DbPool,
  program: &Program,
  record: &UpdateRecord,
  now: DateTime<Utc>,
) -> Result<(), DbError> {
  let mut tx = pool.begin().await?;

  let result = sqlx::query(
    "UPDATE programs SET program_json = ?1, updated_at = ?2 WHERE id = ?3",
  )
  .bind(snapshot_json(program)?)
  .bind(now)
  .bind(program.id)
  .execute(&mut *tx)
  .await?;
  if result.rows_affected() == 0 {
    return Err(DbError::NotFound(program.id));
  }

  sqlx::query(
    r#"
    INSERT INTO program_updates (program_id, requested_at, request_text, changes_json)
    VALUES (?1, ?2, ?3, ?4)
    "#,
  )
  .bind(program.id)
  .bind(record.date)
  .bind(&record.request_text)
  .bind(serde_json::to_string(&record.changes)?)
  .execute(&mut *tx)
  .await?;

  tx.commit().await?;
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
