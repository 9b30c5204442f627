use chrono::{NaiveDate, Utc};

use super::{mileage_planner, weeks_between};
use crate::db::{self, AppState};
use crate::goals::{calculate_goal_requirements, GoalRequirements};
use crate::mileage::{MileagePlanner, MileageWeek};
use crate::models::{Program, RecoveryEntry, RecoveryStatus, TodaysWorkout, UserProfile, WeightEntry};
use crate::pipeline::todays_workouts;

async fn load(state: &AppState, program_id: i64) -> Result<Program, String> {
  db::load_program(&state.db, program_id)
    .await
    .map_err(|e| format!("Failed to load program: {}", e))
}

fn planner_for(program: &Program) -> Option<MileagePlanner> {
  mileage_planner(
    program.program_type,
    program.experience_level,
    &program.target_metric,
    weeks_between(program.start_date, program.goal_date),
  )
}

pub async fn get_goal_requirements(
  state: &AppState,
  program_id: i64,
  profile: &UserProfile,
  weight_history: &[WeightEntry],
) -> Result<GoalRequirements, String> {
  let program = load(state, program_id).await?;
  Ok(calculate_goal_requirements(
    program.program_type,
    &program.target_metric,
    program.goal_date,
    program.experience_level,
    profile,
    weight_history,
    Utc::now(),
  ))
}

/// Targets for one week; `None` for non-endurance programs
pub async fn get_mileage_week(
  state: &AppState,
  program_id: i64,
  week: u32,
) -> Result<Option<MileageWeek>, String> {
  let program = load(state, program_id).await?;
  Ok(planner_for(&program).map(|planner| planner.week(week)))
}

/// Every week of the block; empty for non-endurance programs
pub async fn get_mileage_plan(state: &AppState, program_id: i64) -> Result<Vec<MileageWeek>, String> {
  let program = load(state, program_id).await?;
  Ok(planner_for(&program).map(|planner| planner.full_plan()).unwrap_or_default())
}

pub async fn get_todays_workouts(
  state: &AppState,
  program_id: i64,
  today: NaiveDate,
  recovery: &[RecoveryEntry],
) -> Result<Vec<TodaysWorkout>, String> {
  let program = load(state, program_id).await?;
  Ok(todays_workouts(&program, today, RecoveryStatus::from_feed(recovery)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::goals::DisciplineTarget;
  use crate::mileage::TrainingPhase;
  use crate::models::ProgramType;
  use crate::test_utils::{date, mock_program, mock_user_profile, setup_test_state, ts};
  use serial_test::serial;

  async fn seeded(program: Program) -> (AppState, i64) {
    let state = setup_test_state(None).await;
    let stored = db::insert_program(&state.db, &program, ts("2026-03-01T09:00:00Z"))
      .await
      .unwrap();
    (state, stored.id)
  }

  #[tokio::test]
  #[serial]
  async fn test_goal_requirements_for_marathon() {
    let (state, id) = seeded(mock_program()).await;
    let req = get_goal_requirements(&state, id, &mock_user_profile(70.0), &[]).await.unwrap();
    match req.target {
      Some(DisciplineTarget::Endurance(t)) => assert!((t.target_pace_min_per_km - 4.977).abs() < 0.01),
      other => panic!("expected endurance target, got {:?}", other),
    }
  }

  #[tokio::test]
  #[serial]
  async fn test_mileage_plan_spans_program() {
    // 2026-03-02 to 2026-06-21 is 15 weeks and 6 days
    let (state, id) = seeded(mock_program()).await;
    let plan = get_mileage_plan(&state, id).await.unwrap();
    assert_eq!(plan.len(), 16);
    assert_eq!(plan[0].week, 1);
    assert_eq!(plan.last().unwrap().phase, TrainingPhase::Taper);

    let week = get_mileage_week(&state, id, 3).await.unwrap().unwrap();
    assert_eq!(week, plan[2]);
  }

  #[tokio::test]
  #[serial]
  async fn test_mileage_plan_empty_for_strength_programs() {
    let mut program = mock_program();
    program.program_type = ProgramType::Powerlifting;
    program.target_metric = "500kg total".to_string();
    let (state, id) = seeded(program).await;

    assert!(get_mileage_plan(&state, id).await.unwrap().is_empty());
    assert_eq!(get_mileage_week(&state, id, 1).await.unwrap(), None);
  }

  #[tokio::test]
  #[serial]
  async fn test_todays_workouts_reads_stored_program() {
    let (state, id) = seeded(mock_program()).await;
    let today = get_todays_workouts(&state, id, date("2026-03-07"), &[]).await.unwrap();
    assert_eq!(today.len(), 1);
    assert_eq!(today[0].session.title, "Long Run");
    assert_eq!(today[0].duration, "90 min");
    assert_eq!(today[0].recovery_note, None);
  }

  #[tokio::test]
  #[serial]
  async fn test_missing_program_is_an_error() {
    let state = setup_test_state(None).await;
    let err = get_mileage_plan(&state, 5).await.unwrap_err();
    assert!(err.contains("not found"));
  }
}
