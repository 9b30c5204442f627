use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Recovery feed entry (already fetched by the ingestion collaborator)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryEntry {
  pub date: NaiveDate,
  /// 0-100 readiness score
  pub score: u8,
  #[serde(default)]
  pub hrv_ms: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryStatus {
  Low,
  #[default]
  Medium,
  High,
}

impl RecoveryStatus {
  /// One level lower, saturating at Low
  pub fn downgrade(self) -> Self {
    match self {
      RecoveryStatus::High => RecoveryStatus::Medium,
      _ => RecoveryStatus::Low,
    }
  }
}
