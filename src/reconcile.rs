//! Schedule Reconciler
//!
//! Folds user edits and generator proposals into an existing program.
//! Every function takes a snapshot and returns a new one; the caller is
//! responsible for serializing updates to the same program.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
  Day, Intensity, NutritionPlan, Phase, Program, RecoveryStatus, UpdateRecord, WorkoutSession,
};
use crate::pipeline::synthesize_phases;
use crate::plan_parser::PlanProposal;

const CALORIE_CAP: f64 = 1.2;
const PROTEIN_CAP: f64 = 1.3;
const CARB_CAP: f64 = 1.2;

const DESCRIPTION_SEPARATOR: &str = " | ";
const EDIT_NOT_FOUND_NOTE: &str = "Requested workout change noted; no matching session was found";
const DEFAULT_UPDATE_NOTE: &str = "Plan updated based on your request";

/// ---------------------------------------------------------------------------
/// Types
/// ---------------------------------------------------------------------------

/// A single-session edit made by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutEdit {
  pub day: Day,
  pub original_title: String,
  pub new_title: String,
  pub new_description: String,
  pub new_intensity: Intensity,
}

/// New program snapshot plus what changed
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
  pub program: Program,
  pub changes: Vec<String>,
  pub recommendations: Vec<String>,
}

/// ---------------------------------------------------------------------------
/// Single-Session Edit
/// ---------------------------------------------------------------------------

/// Apply an edit to every session matching `(day, original_title)`.
///
/// A missing target is not an error: the schedule is left alone and a
/// generic note is recorded instead.
pub fn apply_workout_edit(program: &Program, edit: &WorkoutEdit, now: DateTime<Utc>) -> Reconciled {
  let mut updated = program.clone();
  let mut matched = 0usize;

  for phase in &mut updated.phases {
    for session in &mut phase.weekly_structure {
      if session.day == edit.day && session.title == edit.original_title {
        session.title = edit.new_title.clone();
        session.description = edit.new_description.clone();
        session.intensity = edit.new_intensity;
        matched += 1;
      }
    }
  }

  let changes = if matched == 0 {
    tracing::warn!(
      program_id = program.id,
      day = %edit.day,
      title = %edit.original_title,
      "edit target not found"
    );
    vec![EDIT_NOT_FOUND_NOTE.to_string()]
  } else {
    vec![format!(
      "Updated {} workout \"{}\" to \"{}\"",
      edit.day, edit.original_title, edit.new_title
    )]
  };

  let request_text = format!("Edit {} workout \"{}\"", edit.day, edit.original_title);
  updated.update_history.push(UpdateRecord {
    date: now,
    request_text,
    changes: changes.clone(),
  });

  Reconciled {
    program: updated,
    changes,
    recommendations: Vec::new(),
  }
}

/// ---------------------------------------------------------------------------
/// Proposal Merge
/// ---------------------------------------------------------------------------

/// Merge a generator proposal into the program, then re-run enforcement
/// and recovery annotation over every phase.
///
/// Proposed phases beyond the program's existing phase count are ignored.
pub fn merge_plan_update(
  program: &Program,
  proposal: &PlanProposal,
  request_text: &str,
  recovery: RecoveryStatus,
  now: DateTime<Utc>,
) -> Reconciled {
  let mut updated = program.clone();
  let mut changes = proposal.changes.clone();

  let merged_phases: Vec<Phase> = if program.phases.is_empty() {
    proposal.phases.clone()
  } else {
    program
      .phases
      .iter()
      .zip(proposal.phases.iter().map(Some).chain(std::iter::repeat(None)))
      .map(|(existing, proposed)| match proposed {
        Some(proposed) if !proposed.weekly_structure.is_empty() => {
          merge_phase(existing, proposed, &mut changes)
        }
        _ => existing.clone(),
      })
      .collect()
  };

  updated.phases = synthesize_phases(&merged_phases, program.strength_config.as_ref(), recovery);

  if let Some(proposed) = proposal.nutrition {
    let merged = merge_nutrition(program.nutrition.as_ref(), &proposed);
    if merged != proposed {
      changes.push("Nutrition increase limited to a safe range".to_string());
    }
    updated.nutrition = Some(merged);
  }

  if changes.is_empty() {
    changes.push(DEFAULT_UPDATE_NOTE.to_string());
  }

  updated.update_history.push(UpdateRecord {
    date: now,
    request_text: request_text.to_string(),
    changes: changes.clone(),
  });

  tracing::info!(
    program_id = program.id,
    changes = changes.len(),
    "merged plan update"
  );

  Reconciled {
    program: updated,
    changes,
    recommendations: proposal.recommendations.clone(),
  }
}

fn merge_phase(existing: &Phase, proposed: &Phase, changes: &mut Vec<String>) -> Phase {
  let mut sessions = existing.weekly_structure.clone();

  for candidate in &proposed.weekly_structure {
    let on_day: Vec<usize> = sessions
      .iter()
      .enumerate()
      .filter(|(_, s)| s.day == candidate.day)
      .map(|(i, _)| i)
      .collect();

    if on_day.is_empty() {
      sessions.push(candidate.clone());
      continue;
    }

    if on_day.iter().any(|&i| sessions[i].title == candidate.title) {
      continue;
    }

    match on_day
      .iter()
      .copied()
      .find(|&i| sessions[i].session_type == candidate.session_type)
    {
      Some(i) => {
        if merge_description(&mut sessions[i], candidate) {
          changes.push(format!(
            "Merged \"{}\" into {} \"{}\"",
            candidate.title, candidate.day, sessions[i].title
          ));
        }
      }
      None => sessions.push(candidate.clone()),
    }
  }

  sessions.sort_by_key(|s| s.day);
  Phase {
    weekly_structure: sessions,
    ..existing.clone()
  }
}

/// Concatenate the candidate's description once; false when already present
fn merge_description(target: &mut WorkoutSession, candidate: &WorkoutSession) -> bool {
  let addition = candidate.description.trim();
  if addition.is_empty()
    || target
      .description
      .split(DESCRIPTION_SEPARATOR)
      .any(|segment| segment.trim() == addition)
  {
    return false;
  }
  target.description = format!("{}{}{}", target.description, DESCRIPTION_SEPARATOR, addition);
  true
}

/// ---------------------------------------------------------------------------
/// Nutrition
/// ---------------------------------------------------------------------------

/// Clamp increases against the previous plan; fat is left as proposed
pub fn merge_nutrition(previous: Option<&NutritionPlan>, proposed: &NutritionPlan) -> NutritionPlan {
  let Some(previous) = previous else {
    return *proposed;
  };
  NutritionPlan {
    calories: proposed.calories.min(previous.calories * CALORIE_CAP),
    protein_g: proposed.protein_g.min(previous.protein_g * PROTEIN_CAP),
    carbs_g: proposed.carbs_g.min(previous.carbs_g * CARB_CAP),
    fat_g: proposed.fat_g,
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
