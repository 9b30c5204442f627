use serde::{Deserialize, Serialize};

use super::program::WorkoutSession;

/// Result of an update request, shown to the user as-is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramFeedback {
  pub success: bool,
  pub message: String,
  pub changes: Vec<String>,
  pub recommendations: Vec<String>,
}

impl ProgramFeedback {
  pub fn succeeded(message: impl Into<String>, changes: Vec<String>, recommendations: Vec<String>) -> Self {
    Self {
      success: true,
      message: message.into(),
      changes,
      recommendations,
    }
  }

  pub fn failed(message: impl Into<String>) -> Self {
    Self {
      success: false,
      message: message.into(),
      changes: Vec::new(),
      recommendations: Vec::new(),
    }
  }
}

/// Read view for the "today" screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodaysWorkout {
  pub session: WorkoutSession,
  pub duration: String,
  pub recovery_note: Option<String>,
}
