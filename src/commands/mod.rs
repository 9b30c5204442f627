pub mod planning;
pub mod programs;

use chrono::NaiveDate;

use crate::mileage::MileagePlanner;
use crate::models::{ExperienceLevel, ProgramType};

/// Weeks from `from` to `to`, counting a partial week as a whole one like
/// the goal timeline does
fn weeks_between(from: NaiveDate, to: NaiveDate) -> u32 {
  (((to - from).num_days() + 6) / 7).max(1) as u32
}

/// Mileage planner over `total_weeks` (endurance programs only)
fn mileage_planner(
  program_type: ProgramType,
  level: ExperienceLevel,
  target_metric: &str,
  total_weeks: u32,
) -> Option<MileagePlanner> {
  if !program_type.is_endurance() {
    return None;
  }
  MileagePlanner::new(program_type, level, Some(target_metric), Some(total_weeks))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::date;

  #[test]
  fn test_weeks_between_rounds_up() {
    assert_eq!(weeks_between(date("2026-03-02"), date("2026-03-09")), 1);
    assert_eq!(weeks_between(date("2026-03-02"), date("2026-03-10")), 2);
    assert_eq!(weeks_between(date("2026-03-02"), date("2026-06-21")), 16);
    assert_eq!(weeks_between(date("2026-03-02"), date("2026-03-01")), 1);
  }

  #[test]
  fn test_no_planner_for_strength_programs() {
    assert!(mileage_planner(ProgramType::Powerlifting, ExperienceLevel::Advanced, "500kg", 12).is_none());
    assert!(mileage_planner(ProgramType::Marathon, ExperienceLevel::Advanced, "3:00:00", 12).is_some());
  }
}
