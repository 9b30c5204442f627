//! Boundary validation for generated plans
//!
//! The plan generator answers with text that should contain JSON in the
//! Phase/WorkoutSession shape. A response that fails validation anywhere is
//! replaced by a minimal single-phase plan; partial plans are never applied.

use serde::Deserialize;
use thiserror::Error;

use crate::classifier::classify_discipline;
use crate::models::{Day, Intensity, NutritionPlan, Phase, WorkoutSession};

const FALLBACK_PHASE_NAME: &str = "Foundation Phase";
const FALLBACK_PHASE_WEEKS: u32 = 4;

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanParseError {
  #[error("No JSON found in response")]
  NoJson,

  #[error("Invalid JSON: {0}")]
  Json(String),

  #[error("Plan has no phases")]
  NoPhases,

  #[error("Phase {phase}: {reason}")]
  InvalidPhase { phase: usize, reason: String },

  #[error("Phase {phase}, session {session}: {reason}")]
  InvalidSession {
    phase: usize,
    session: usize,
    reason: String,
  },
}

/// ---------------------------------------------------------------------------
/// Raw Payload Shapes (untrusted)
/// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPayload {
  Plan(RawPlan),
  Phases(Vec<RawPhase>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlan {
  phases: Vec<RawPhase>,
  #[serde(default)]
  nutrition: Option<RawNutrition>,
  #[serde(default)]
  changes: Vec<String>,
  #[serde(default)]
  recommendations: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPhase {
  #[serde(default)]
  name: Option<String>,
  #[serde(default, alias = "duration_weeks")]
  duration_weeks: Option<f64>,
  #[serde(default)]
  focus: Option<String>,
  #[serde(default, alias = "weekly_structure")]
  weekly_structure: Vec<RawSession>,
}

#[derive(Debug, Deserialize)]
struct RawSession {
  #[serde(default)]
  day: String,
  #[serde(default)]
  title: String,
  #[serde(default)]
  description: String,
  #[serde(default)]
  intensity: Option<String>,
  #[serde(default, rename = "type")]
  session_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNutrition {
  calories: f64,
  #[serde(alias = "protein", alias = "protein_g")]
  protein_g: f64,
  #[serde(alias = "carbs", alias = "carbs_g")]
  carbs_g: f64,
  #[serde(alias = "fat", alias = "fat_g")]
  fat_g: f64,
}

/// ---------------------------------------------------------------------------
/// Validated Output
/// ---------------------------------------------------------------------------

/// A validated plan or update proposal from the generator
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlanProposal {
  pub phases: Vec<Phase>,
  pub nutrition: Option<NutritionPlan>,
  pub changes: Vec<String>,
  pub recommendations: Vec<String>,
}

/// Single empty phase used whenever a generated plan cannot be trusted
pub fn fallback_plan() -> Vec<Phase> {
  vec![Phase {
    name: FALLBACK_PHASE_NAME.to_string(),
    duration_weeks: FALLBACK_PHASE_WEEKS,
    focus: "Build consistency and an aerobic base".to_string(),
    weekly_structure: Vec::new(),
  }]
}

/// Extract JSON from a generator response (handles markdown code blocks)
pub fn extract_json(text: &str) -> Result<String, PlanParseError> {
  let trimmed = text.trim();

  // Try direct parse first
  if trimmed.starts_with('{') || trimmed.starts_with('[') {
    return Ok(trimmed.to_string());
  }

  // Look for JSON in code blocks
  if let Some(start) = text.find("```json") {
    let start = start + 7;
    if let Some(end) = text[start..].find("```") {
      return Ok(text[start..start + end].trim().to_string());
    }
  }

  // Look for plain code blocks
  if let Some(start) = text.find("```") {
    let start = start + 3;
    // Skip language identifier if present
    let content_start = text[start..]
      .find('\n')
      .map(|i| start + i + 1)
      .unwrap_or(start);
    if let Some(end) = text[content_start..].find("```") {
      return Ok(text[content_start..content_start + end].trim().to_string());
    }
  }

  // Last resort: first { to last }
  if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
    if start < end {
      return Ok(text[start..=end].to_string());
    }
  }

  Err(PlanParseError::NoJson)
}

/// Parse and validate a generator response
pub fn parse_plan(text: &str) -> Result<PlanProposal, PlanParseError> {
  let json = extract_json(text)?;
  let payload: RawPayload =
    serde_json::from_str(&json).map_err(|e| PlanParseError::Json(e.to_string()))?;

  let (raw_phases, nutrition, changes, recommendations) = match payload {
    RawPayload::Plan(plan) => (plan.phases, plan.nutrition, plan.changes, plan.recommendations),
    RawPayload::Phases(phases) => (phases, None, Vec::new(), Vec::new()),
  };

  if raw_phases.is_empty() {
    return Err(PlanParseError::NoPhases);
  }

  let phases = raw_phases
    .into_iter()
    .enumerate()
    .map(|(index, raw)| validate_phase(index, raw))
    .collect::<Result<Vec<_>, _>>()?;

  let nutrition = match nutrition {
    Some(raw) => Some(validate_nutrition(raw)?),
    None => None,
  };

  Ok(PlanProposal {
    phases,
    nutrition,
    changes,
    recommendations,
  })
}

/// Parse a response, substituting the fallback plan for anything invalid
pub fn parse_plan_or_fallback(text: &str) -> PlanProposal {
  match parse_plan(text) {
    Ok(proposal) => proposal,
    Err(e) => {
      tracing::warn!(error = %e, "generated plan rejected, using fallback plan");
      PlanProposal {
        phases: fallback_plan(),
        ..PlanProposal::default()
      }
    }
  }
}

fn validate_phase(index: usize, raw: RawPhase) -> Result<Phase, PlanParseError> {
  let name = raw
    .name
    .map(|n| n.trim().to_string())
    .filter(|n| !n.is_empty())
    .ok_or_else(|| PlanParseError::InvalidPhase {
      phase: index,
      reason: "missing name".to_string(),
    })?;

  let duration_weeks = match raw.duration_weeks {
    Some(weeks) if weeks >= 1.0 && weeks.is_finite() => weeks.round() as u32,
    Some(weeks) => {
      return Err(PlanParseError::InvalidPhase {
        phase: index,
        reason: format!("invalid duration {}", weeks),
      })
    }
    None => {
      return Err(PlanParseError::InvalidPhase {
        phase: index,
        reason: "missing durationWeeks".to_string(),
      })
    }
  };

  let weekly_structure = raw
    .weekly_structure
    .into_iter()
    .enumerate()
    .map(|(session_index, session)| {
      validate_session(session).map_err(|reason| PlanParseError::InvalidSession {
        phase: index,
        session: session_index,
        reason,
      })
    })
    .collect::<Result<Vec<_>, _>>()?;

  Ok(Phase {
    name,
    duration_weeks,
    focus: raw.focus.unwrap_or_default().trim().to_string(),
    weekly_structure,
  })
}

fn validate_session(raw: RawSession) -> Result<WorkoutSession, String> {
  let day: Day = raw.day.parse()?;

  let title = raw.title.trim().to_string();
  if title.is_empty() {
    return Err("missing title".to_string());
  }

  let intensity = match raw.intensity.as_deref() {
    Some(value) => value.parse::<Intensity>()?,
    None => Intensity::Medium,
  };

  let description = raw.description.trim().to_string();
  let session_type = classify_discipline(raw.session_type.as_deref(), &title, &description);

  Ok(WorkoutSession::new(day, title, description, intensity, session_type))
}

fn validate_nutrition(raw: RawNutrition) -> Result<NutritionPlan, PlanParseError> {
  let values = [raw.calories, raw.protein_g, raw.carbs_g, raw.fat_g];
  if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
    return Err(PlanParseError::Json("nutrition values must be non-negative".to_string()));
  }
  Ok(NutritionPlan {
    calories: raw.calories,
    protein_g: raw.protein_g,
    carbs_g: raw.carbs_g,
    fat_g: raw.fat_g,
  })
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
