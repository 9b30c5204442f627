//! Recovery-based session guidance
//!
//! Maps a readiness signal onto per-session guidance text. The table is
//! deliberately small: most combinations get no annotation at all.

use crate::models::{Discipline, Intensity, RecoveryEntry, RecoveryStatus, WorkoutSession};

const HIGH_READINESS_SCORE: u8 = 70;
const MEDIUM_READINESS_SCORE: u8 = 40;
const HRV_WINDOW: usize = 7;
/// HRV this far under its recent average counts as suppressed
const HRV_SUPPRESSED_PCT: f64 = -10.0;

/// ---------------------------------------------------------------------------
/// Status From Feed
/// ---------------------------------------------------------------------------

impl RecoveryStatus {
  /// Status from a newest-first recovery feed.
  ///
  /// The latest score picks the band; a suppressed HRV (vs the average of
  /// the last seven entries) knocks it down one level. No data is "medium",
  /// which produces no annotations.
  pub fn from_feed(entries: &[RecoveryEntry]) -> Self {
    let Some(latest) = entries.first() else {
      return RecoveryStatus::Medium;
    };

    let status = if latest.score >= HIGH_READINESS_SCORE {
      RecoveryStatus::High
    } else if latest.score >= MEDIUM_READINESS_SCORE {
      RecoveryStatus::Medium
    } else {
      RecoveryStatus::Low
    };

    match hrv_change_pct(entries) {
      Some(pct) if pct < HRV_SUPPRESSED_PCT => status.downgrade(),
      _ => status,
    }
  }
}

/// Latest HRV vs the window average, in percent
fn hrv_change_pct(entries: &[RecoveryEntry]) -> Option<f64> {
  let latest = entries.first()?.hrv_ms?;
  let window: Vec<f64> = entries
    .iter()
    .take(HRV_WINDOW)
    .filter_map(|e| e.hrv_ms)
    .collect();
  if window.len() < 2 {
    return None;
  }
  let avg = window.iter().sum::<f64>() / window.len() as f64;
  if avg <= 0.0 {
    return None;
  }
  Some((latest - avg) / avg * 100.0)
}

/// ---------------------------------------------------------------------------
/// Adjustment Rule
/// ---------------------------------------------------------------------------

/// Guidance for one session, or `None` when no adjustment applies
pub fn recovery_adjustment(session: &WorkoutSession, status: RecoveryStatus) -> Option<String> {
  match (status, session.intensity, session.session_type) {
    (RecoveryStatus::Low, Intensity::High, _) => Some(
      "Recovery is low today. Drop this session to moderate intensity or swap it for an easy day."
        .to_string(),
    ),
    (RecoveryStatus::Low, Intensity::Medium, Discipline::Cardio) => Some(
      "Recovery is low today. Cut the duration by about 25% and keep the effort conversational."
        .to_string(),
    ),
    (RecoveryStatus::High, Intensity::Medium, _) => Some(
      "Recovery is high today. Feel free to push a little harder than planned.".to_string(),
    ),
    _ => None,
  }
}

/// Write `adjusted_for_recovery` on every session; nothing else changes
pub fn annotate_sessions(sessions: &[WorkoutSession], status: RecoveryStatus) -> Vec<WorkoutSession> {
  sessions
    .iter()
    .map(|s| WorkoutSession {
      adjusted_for_recovery: recovery_adjustment(s, status),
      ..s.clone()
    })
    .collect()
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
