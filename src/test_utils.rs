//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Mock data factories
//! - A mocked plan generator

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::db::AppState;
use crate::llm::ClaudeClient;
use crate::models::{
  Day, Discipline, ExperienceLevel, Intensity, NewProgram, Phase, Program, ProgramType,
  UserProfile, WorkoutSession,
};

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  // Run migrations
  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// App state over a fresh database, with an optional generator
pub async fn setup_test_state(llm: Option<ClaudeClient>) -> AppState {
  AppState::new(setup_test_db().await, llm)
}

/// ---------------------------------------------------------------------------
/// Plan Generator Mocks
/// ---------------------------------------------------------------------------

/// Client pointed at a mockito server
pub fn mock_claude_client(server: &mockito::Server) -> ClaudeClient {
  ClaudeClient::new(
    "test-key",
    format!("{}/v1/messages", server.url()),
    "test-model",
    1024,
  )
}

/// Messages API response body whose text block is `text`
pub fn claude_response_body(text: &str) -> String {
  serde_json::json!({
    "content": [{"type": "text", "text": text}],
    "model": "test-model",
    "stop_reason": "end_turn",
    "usage": {"input_tokens": 100, "output_tokens": 200}
  })
  .to_string()
}

/// Register a successful generator reply on the server
pub async fn mock_generator_reply(server: &mut mockito::Server, text: &str) -> mockito::Mock {
  server
    .mock("POST", "/v1/messages")
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(claude_response_body(text))
    .create_async()
    .await
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// Parse an RFC 3339 timestamp
pub fn ts(value: &str) -> DateTime<Utc> {
  DateTime::parse_from_rfc3339(value)
    .expect("valid RFC 3339 timestamp")
    .with_timezone(&Utc)
}

pub fn date(value: &str) -> NaiveDate {
  NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid date")
}

pub fn mock_user_profile(weight_kg: f64) -> UserProfile {
  UserProfile {
    age: 34,
    gender: "female".to_string(),
    weight_kg,
    height_cm: 170.0,
    body_fat_pct: Some(24.0),
    activity_level: "moderate".to_string(),
    fitness_goal: "Run a marathon".to_string(),
    experience_level: ExperienceLevel::Intermediate,
  }
}

/// Four-week base week, Monday-ordered, no strength work
pub fn mock_base_phase() -> Phase {
  Phase {
    name: "Base Building".to_string(),
    duration_weeks: 4,
    focus: "Aerobic base".to_string(),
    weekly_structure: vec![
      WorkoutSession::new(Day::Monday, "Easy Run", "30 min easy", Intensity::Medium, Discipline::Cardio),
      WorkoutSession::new(
        Day::Wednesday,
        "Tempo Run",
        "20 min tempo",
        Intensity::MediumHigh,
        Discipline::Cardio,
      ),
      WorkoutSession::new(Day::Saturday, "Long Run", "90 min easy", Intensity::Low, Discipline::Cardio),
      WorkoutSession::new(
        Day::Sunday,
        "Rest Day",
        "Walk and stretch",
        Intensity::None,
        Discipline::Recovery,
      ),
    ],
  }
}

pub fn mock_new_program() -> NewProgram {
  NewProgram {
    program_type: ProgramType::Marathon,
    target_metric: "3:30:00".to_string(),
    goal_date: date("2026-06-21"),
    start_date: date("2026-03-02"),
    experience_level: ExperienceLevel::Intermediate,
    training_days_per_week: 5,
    strength_config: None,
  }
}

/// Marathon program starting Monday 2026-03-02 with one base phase
pub fn mock_program() -> Program {
  mock_new_program().into_program(1, vec![mock_base_phase()])
}
