//! Program creation and update handlers
//!
//! These are the only callers that write programs. Updates to one program
//! run under its lock so concurrent requests cannot lose each other's work.

use chrono::{DateTime, Utc};

use super::mileage_planner;
use crate::db::{self, AppState};
use crate::goals::calculate_goal_requirements;
use crate::models::{
  NewProgram, Program, ProgramFeedback, RecoveryEntry, RecoveryStatus, UserProfile, WeightEntry,
};
use crate::pipeline::synthesize_phases;
use crate::plan_parser::parse_plan_or_fallback;
use crate::reconcile::{apply_workout_edit, merge_plan_update, Reconciled, WorkoutEdit};

/// Goal requirements and mileage plan sent to the generator. Both are
/// derived from the same week count so their build and taper agree.
fn plan_context(
  new_program: &NewProgram,
  profile: &UserProfile,
  weight_history: &[WeightEntry],
  now: DateTime<Utc>,
) -> serde_json::Value {
  let requirements = calculate_goal_requirements(
    new_program.program_type,
    &new_program.target_metric,
    new_program.goal_date,
    new_program.experience_level,
    profile,
    weight_history,
    now,
  );

  let mileage_plan = mileage_planner(
    new_program.program_type,
    new_program.experience_level,
    &new_program.target_metric,
    requirements.weeks_until_goal.max(1) as u32,
  )
  .map(|planner| planner.full_plan());

  serde_json::json!({
    "program": new_program,
    "profile": profile,
    "goalRequirements": requirements,
    "mileagePlan": mileage_plan,
  })
}

/// Generate, normalize and store a new program
pub async fn create_program(
  state: &AppState,
  new_program: NewProgram,
  profile: &UserProfile,
  weight_history: &[WeightEntry],
  now: DateTime<Utc>,
) -> Result<Program, String> {
  let llm = state
    .llm
    .as_ref()
    .ok_or_else(|| "Plan generator is not configured".to_string())?;

  let context = plan_context(&new_program, profile, weight_history, now);

  let response = llm.generate_plan(&context.to_string()).await.map_err(|e| {
    tracing::error!(error = %e, "plan generation failed");
    format!("Failed to generate plan: {}", e)
  })?;

  let proposal = parse_plan_or_fallback(&response);
  let phases = synthesize_phases(
    &proposal.phases,
    new_program.strength_config.as_ref(),
    RecoveryStatus::default(),
  );

  let mut program = new_program.into_program(0, phases);
  program.nutrition = proposal.nutrition;

  db::insert_program(&state.db, &program, now)
    .await
    .map_err(|e| format!("Failed to save program: {}", e))
}

/// Ask the generator for changes and merge them into the program
pub async fn request_program_update(
  state: &AppState,
  program_id: i64,
  request_text: &str,
  recovery: &[RecoveryEntry],
) -> ProgramFeedback {
  let request_text = request_text.trim();
  if request_text.is_empty() {
    return ProgramFeedback::failed("Update request is empty");
  }

  let Some(llm) = state.llm.as_ref() else {
    return ProgramFeedback::failed("Plan generator is not configured");
  };

  let lock = state.program_lock(program_id).await;
  let _guard = lock.lock().await;

  let program = match db::load_program(&state.db, program_id).await {
    Ok(program) => program,
    Err(e) => return ProgramFeedback::failed(format!("Failed to load program: {}", e)),
  };

  let context = match serde_json::to_string(&program) {
    Ok(json) => json,
    Err(e) => return ProgramFeedback::failed(format!("Failed to prepare request: {}", e)),
  };

  let response = match llm.propose_update(&context, request_text).await {
    Ok(text) => text,
    Err(e) => {
      tracing::error!(program_id, error = %e, "update proposal failed");
      return ProgramFeedback::failed(format!("Could not update your program: {}", e));
    }
  };

  let proposal = parse_plan_or_fallback(&response);
  let status = RecoveryStatus::from_feed(recovery);
  let reconciled = merge_plan_update(&program, &proposal, request_text, status, Utc::now());

  persist(state, reconciled, "Program updated").await
}

/// Apply a user's edit to a single session
pub async fn edit_workout(state: &AppState, program_id: i64, edit: WorkoutEdit) -> ProgramFeedback {
  let lock = state.program_lock(program_id).await;
  let _guard = lock.lock().await;

  let program = match db::load_program(&state.db, program_id).await {
    Ok(program) => program,
    Err(e) => return ProgramFeedback::failed(format!("Failed to load program: {}", e)),
  };

  let reconciled = apply_workout_edit(&program, &edit, Utc::now());
  persist(state, reconciled, "Workout updated").await
}

/// Store the snapshot and its newest audit record
async fn persist(state: &AppState, reconciled: Reconciled, message: &str) -> ProgramFeedback {
  let Some(record) = reconciled.program.update_history.last() else {
    return ProgramFeedback::failed("Update produced no history record");
  };

  if let Err(e) = db::commit_update(&state.db, &reconciled.program, record, record.date).await {
    tracing::error!(program_id = reconciled.program.id, error = %e, "saving update failed");
    return ProgramFeedback::failed(format!("Failed to save program: {}", e));
  }

  ProgramFeedback::succeeded(message, reconciled.changes, reconciled.recommendations)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::mileage::{MileageWeek, TrainingPhase};
  use crate::models::{Day, Intensity, ProgramType, StrengthConfig, StrengthSplit};
  use crate::test_utils::{
    mock_claude_client, mock_generator_reply, mock_new_program, mock_program, mock_user_profile,
    setup_test_state, ts,
  };
  use serial_test::serial;

  const GENERATED_PLAN: &str = r#"Here is your plan:
```json
{
  "phases": [
    {
      "name": "Base",
      "durationWeeks": 6,
      "focus": "Aerobic base",
      "weeklyStructure": [
        {"day": "Monday", "title": "Easy Run", "description": "40 min easy", "intensity": "Low", "type": "cardio"},
        {"day": "Tuesday", "title": "Run + Squats", "description": "5k run followed by squats 3x5", "intensity": "Medium", "type": "cardio"},
        {"day": "Saturday", "title": "Long Run", "description": "90 min easy", "intensity": "Low", "type": "cardio"}
      ]
    }
  ]
}
```"#;

  #[tokio::test]
  #[serial]
  async fn test_create_program_enforces_strength() {
    let mut server = mockito::Server::new_async().await;
    let mock = mock_generator_reply(&mut server, GENERATED_PLAN).await;
    let state = setup_test_state(Some(mock_claude_client(&server))).await;

    let mut new_program = mock_new_program();
    new_program.strength_config = Some(StrengthConfig {
      enabled: true,
      days_per_week: 2,
      split: StrengthSplit::UpperLower,
      custom_split: None,
    });

    let program = create_program(&state, new_program, &mock_user_profile(70.0), &[], ts("2026-03-01T09:00:00Z"))
      .await
      .unwrap();

    mock.assert_async().await;
    assert!(program.id > 0);
    assert_eq!(program.phases.len(), 1);
    assert_eq!(program.phases[0].strength_count(), 2);
    assert!(program.update_history.is_empty());

    let stored = db::load_program(&state.db, program.id).await.unwrap();
    assert_eq!(stored, program);
  }

  #[tokio::test]
  #[serial]
  async fn test_create_program_falls_back_on_prose() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_generator_reply(&mut server, "I'm not able to build that plan right now.").await;
    let state = setup_test_state(Some(mock_claude_client(&server))).await;

    let program = create_program(&state, mock_new_program(), &mock_user_profile(70.0), &[], ts("2026-03-01T09:00:00Z"))
      .await
      .unwrap();

    assert_eq!(program.phases.len(), 1);
    assert_eq!(program.phases[0].name, "Foundation Phase");
    assert!(program.phases[0].weekly_structure.is_empty());
  }

  #[test]
  fn test_plan_context_weeks_agree() {
    // 51 days out: shorter than the program's start-to-goal span
    let context = plan_context(&mock_new_program(), &mock_user_profile(70.0), &[], ts("2026-05-01T00:00:00Z"));

    let target = &context["goalRequirements"]["target"];
    assert_eq!(target["totalTrainingWeeks"], 8);

    let plan: Vec<MileageWeek> = serde_json::from_value(context["mileagePlan"].clone()).unwrap();
    assert_eq!(plan.len(), 8);
    let taper = plan.iter().filter(|w| w.phase == TrainingPhase::Taper).count();
    assert_eq!(serde_json::json!(taper), target["taperWeeks"]);
  }

  #[test]
  fn test_plan_context_has_no_mileage_for_strength_programs() {
    let mut new_program = mock_new_program();
    new_program.program_type = ProgramType::Powerlifting;
    new_program.target_metric = "500kg total".to_string();
    let context = plan_context(&new_program, &mock_user_profile(70.0), &[], ts("2026-03-01T09:00:00Z"));
    assert!(context["mileagePlan"].is_null());
  }

  #[tokio::test]
  #[serial]
  async fn test_create_program_reports_generator_failure() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", "/v1/messages")
      .with_status(500)
      .with_body("upstream down")
      .create_async()
      .await;
    let state = setup_test_state(Some(mock_claude_client(&server))).await;

    let err = create_program(&state, mock_new_program(), &mock_user_profile(70.0), &[], ts("2026-03-01T09:00:00Z"))
      .await
      .unwrap_err();
    assert!(err.starts_with("Failed to generate plan"));
  }

  #[tokio::test]
  #[serial]
  async fn test_create_program_without_generator() {
    let state = setup_test_state(None).await;
    let result = create_program(&state, mock_new_program(), &mock_user_profile(70.0), &[], ts("2026-03-01T09:00:00Z")).await;
    assert!(result.is_err());
  }

  async fn seeded_state(server: &mockito::Server) -> (AppState, Program) {
    let state = setup_test_state(Some(mock_claude_client(server))).await;
    let program = db::insert_program(&state.db, &mock_program(), ts("2026-03-01T09:00:00Z"))
      .await
      .unwrap();
    (state, program)
  }

  #[tokio::test]
  #[serial]
  async fn test_update_request_merges_and_records_history() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_generator_reply(
      &mut server,
      r#"{"phases": [{"name": "Base Building", "durationWeeks": 4, "weeklyStructure": [
          {"day": "Thursday", "title": "Hill Repeats", "description": "8 x 60s hills", "intensity": "High", "type": "cardio"}
        ]}],
        "changes": ["Added hill repeats on Thursday"],
        "recommendations": ["Keep the easy days easy"]}"#,
    )
    .await;
    let (state, program) = seeded_state(&server).await;

    let feedback = request_program_update(&state, program.id, "Add some hills", &[]).await;
    assert!(feedback.success, "{}", feedback.message);
    assert_eq!(feedback.changes, vec!["Added hill repeats on Thursday"]);
    assert_eq!(feedback.recommendations, vec!["Keep the easy days easy"]);

    let stored = db::load_program(&state.db, program.id).await.unwrap();
    assert!(stored.phases[0]
      .weekly_structure
      .iter()
      .any(|s| s.day == Day::Thursday && s.title == "Hill Repeats"));
    assert_eq!(stored.update_history.len(), 1);
    assert_eq!(stored.update_history[0].request_text, "Add some hills");
  }

  #[tokio::test]
  #[serial]
  async fn test_update_request_generator_failure() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", "/v1/messages")
      .with_status(401)
      .with_body(r#"{"error": {"message": "invalid x-api-key"}}"#)
      .create_async()
      .await;
    let (state, program) = seeded_state(&server).await;

    let feedback = request_program_update(&state, program.id, "More rest", &[]).await;
    assert!(!feedback.success);
    assert!(feedback.message.contains("invalid x-api-key"));

    let stored = db::load_program(&state.db, program.id).await.unwrap();
    assert!(stored.update_history.is_empty());
  }

  #[tokio::test]
  #[serial]
  async fn test_update_request_unknown_program() {
    let server = mockito::Server::new_async().await;
    let state = setup_test_state(Some(mock_claude_client(&server))).await;
    let feedback = request_program_update(&state, 77, "anything", &[]).await;
    assert!(!feedback.success);
  }

  #[tokio::test]
  #[serial]
  async fn test_update_request_rejects_empty_text() {
    let server = mockito::Server::new_async().await;
    let (state, program) = seeded_state(&server).await;
    let feedback = request_program_update(&state, program.id, "   ", &[]).await;
    assert!(!feedback.success);
  }

  #[tokio::test]
  #[serial]
  async fn test_edit_workout_persists() {
    let server = mockito::Server::new_async().await;
    let (state, program) = seeded_state(&server).await;

    let edit = WorkoutEdit {
      day: Day::Monday,
      original_title: "Easy Run".to_string(),
      new_title: "Recovery Jog".to_string(),
      new_description: "25 min very easy".to_string(),
      new_intensity: Intensity::Low,
    };
    let feedback = edit_workout(&state, program.id, edit.clone()).await;
    assert!(feedback.success);

    // second application changes nothing but still records the request
    let again = edit_workout(&state, program.id, edit).await;
    assert!(again.success);

    let stored = db::load_program(&state.db, program.id).await.unwrap();
    assert_eq!(stored.phases[0].weekly_structure[0].title, "Recovery Jog");
    assert_eq!(stored.update_history.len(), 2);
  }

  #[tokio::test]
  #[serial]
  async fn test_concurrent_edits_are_not_lost() {
    let server = mockito::Server::new_async().await;
    let (state, program) = seeded_state(&server).await;

    let first = WorkoutEdit {
      day: Day::Monday,
      original_title: "Easy Run".to_string(),
      new_title: "Easy Run A".to_string(),
      new_description: "30 min".to_string(),
      new_intensity: Intensity::Low,
    };
    let second = WorkoutEdit {
      day: Day::Saturday,
      original_title: "Long Run".to_string(),
      new_title: "Long Run B".to_string(),
      new_description: "100 min".to_string(),
      new_intensity: Intensity::Low,
    };

    let (a, b) = tokio::join!(
      edit_workout(&state, program.id, first),
      edit_workout(&state, program.id, second)
    );
    assert!(a.success && b.success);

    let stored = db::load_program(&state.db, program.id).await.unwrap();
    let titles: Vec<&str> = stored.phases[0]
      .weekly_structure
      .iter()
      .map(|s| s.title.as_str())
      .collect();
    assert!(titles.contains(&"Easy Run A"));
    assert!(titles.contains(&"Long Run B"));
    assert_eq!(stored.update_history.len(), 2);
  }
}
