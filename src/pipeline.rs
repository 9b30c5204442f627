//! Synthesis pipeline and the "today" read view

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

use crate::enforcer::enforce_phases;
use crate::models::{
  Day, Discipline, Intensity, Phase, Program, RecoveryStatus, StrengthConfig, TodaysWorkout,
};
use crate::recovery::{annotate_sessions, recovery_adjustment};

static EXPLICIT_MINUTES: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\b(\d{1,3})(?:\s*-\s*\d{1,3})?\s*(?:min|mins|minutes)\b")
    .expect("valid duration regex")
});

/// Enforce strength counts, then annotate for recovery, phase by phase
pub fn synthesize_phases(
  phases: &[Phase],
  strength_config: Option<&StrengthConfig>,
  recovery: RecoveryStatus,
) -> Vec<Phase> {
  enforce_phases(phases, strength_config)
    .into_iter()
    .map(|phase| Phase {
      weekly_structure: annotate_sessions(&phase.weekly_structure, recovery),
      ..phase
    })
    .collect()
}

/// Index of the phase `today` falls in; past the end stays on the last phase
pub fn current_phase_index(program: &Program, today: NaiveDate) -> Option<usize> {
  if program.phases.is_empty() {
    return None;
  }

  let weeks_elapsed = ((today - program.start_date).num_days().max(0) / 7) as u32;
  let mut phase_end = 0u32;
  for (index, phase) in program.phases.iter().enumerate() {
    phase_end += phase.duration_weeks;
    if weeks_elapsed < phase_end {
      return Some(index);
    }
  }
  Some(program.phases.len() - 1)
}

/// Display duration: an explicit "N min" in the description wins
pub fn session_duration(description: &str, discipline: Discipline, intensity: Intensity) -> String {
  if let Some(caps) = EXPLICIT_MINUTES.captures(description) {
    return format!("{} min", &caps[1]);
  }

  let minutes = match (discipline, intensity) {
    (Discipline::Recovery, _) | (_, Intensity::None) => 20,
    (Discipline::Cardio, Intensity::VeryLow | Intensity::Low) => 30,
    (Discipline::Cardio, Intensity::MediumLow | Intensity::Medium) => 45,
    (Discipline::Cardio, Intensity::MediumHigh | Intensity::High) => 60,
    (Discipline::Strength, Intensity::VeryLow | Intensity::Low | Intensity::MediumLow) => 45,
    (Discipline::Strength, _) => 60,
    (Discipline::Other, _) => 45,
  };
  format!("{} min", minutes)
}

/// Sessions scheduled for `today` in the current phase
pub fn todays_workouts(
  program: &Program,
  today: NaiveDate,
  recovery: RecoveryStatus,
) -> Vec<TodaysWorkout> {
  let Some(index) = current_phase_index(program, today) else {
    return Vec::new();
  };
  let day = Day::from_weekday(today.weekday());

  program.phases[index]
    .weekly_structure
    .iter()
    .filter(|s| s.day == day)
    .map(|s| {
      let note = recovery_adjustment(s, recovery);
      let mut session = s.clone();
      session.adjusted_for_recovery = note.clone();
      TodaysWorkout {
        duration: session_duration(&s.description, s.session_type, s.intensity),
        session,
        recovery_note: note,
      }
    })
    .collect()
}
