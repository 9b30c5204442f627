//! Workout type classification and splitting
//!
//! Keyword heuristics that keep every scheduled session to a single
//! discipline. The keyword tables are approximate on purpose: phrasing that
//! avoids them is passed through untouched rather than guessed at.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::{Discipline, WorkoutSession};

/// ---------------------------------------------------------------------------
/// Keyword Tables
/// ---------------------------------------------------------------------------

pub const CARDIO_KEYWORDS: &[&str] = &["run", "cardio", "bike", "swim", "jog"];

pub const STRENGTH_KEYWORDS: &[&str] = &[
  "strength", "weight", "lift", "squat", "deadlift", "bench", "press",
];

pub const RECOVERY_KEYWORDS: &[&str] = &[
  "recovery", "rest", "yoga", "mobility", "stretch", "foam roll",
];

/// Words that suggest two activities were written into one entry
pub const CONNECTORS: &[&str] = &["and", "followed by", "then", "after", "before"];

/// Prefix match at a word start, so "run" covers "running" but not "brunch"
fn prefix_regex(words: &[&str]) -> Regex {
  let alternatives: Vec<String> = words.iter().map(|w| w.replace(' ', r"\s+")).collect();
  Regex::new(&format!(r"(?i)\b(?:{})", alternatives.join("|"))).expect("valid keyword regex")
}

static CARDIO: LazyLock<Regex> = LazyLock::new(|| prefix_regex(CARDIO_KEYWORDS));
static STRENGTH: LazyLock<Regex> = LazyLock::new(|| prefix_regex(STRENGTH_KEYWORDS));
static RECOVERY: LazyLock<Regex> = LazyLock::new(|| prefix_regex(RECOVERY_KEYWORDS));

static CONNECTOR: LazyLock<Regex> = LazyLock::new(|| {
  let alternatives: Vec<String> = CONNECTORS.iter().map(|w| w.replace(' ', r"\s+")).collect();
  Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|"))).expect("valid connector regex")
});

// "and then" must win over "then" so the leftover "and" is not kept
static SEGMENT_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\+|\bfollowed\s+by\b|\band\s+then\b|\bthen\b|,").expect("valid separator regex")
});

static BARE_AND: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)\band\b").expect("valid and regex"));

pub fn has_cardio(text: &str) -> bool {
  CARDIO.is_match(text)
}

pub fn has_strength(text: &str) -> bool {
  STRENGTH.is_match(text)
}

pub fn has_recovery(text: &str) -> bool {
  RECOVERY.is_match(text)
}

/// ---------------------------------------------------------------------------
/// Classification
/// ---------------------------------------------------------------------------

/// Whether an entry looks like more than one activity
pub fn is_combined(title: &str, description: &str) -> bool {
  let text = format!("{} {}", title, description);
  text.contains('+')
    || CONNECTOR.is_match(&text)
    || (has_cardio(description) && has_strength(description))
}

/// Resolve a declared type string to exactly one discipline.
///
/// Unknown or union declarations ("cardio/strength") fall back to keywords,
/// checked cardio first, then strength, then recovery.
pub fn classify_discipline(declared: Option<&str>, title: &str, description: &str) -> Discipline {
  if let Some(discipline) = declared.and_then(|d| d.parse::<Discipline>().ok()) {
    return discipline;
  }

  let text = format!("{} {}", title, description);
  if has_cardio(&text) {
    Discipline::Cardio
  } else if has_strength(&text) {
    Discipline::Strength
  } else if has_recovery(&text) {
    Discipline::Recovery
  } else {
    Discipline::Other
  }
}

/// ---------------------------------------------------------------------------
/// Splitting
/// ---------------------------------------------------------------------------

/// Pick the part of a combined description that belongs to one discipline.
///
/// The result never mentions the other discipline, so a split session is
/// not combined any more and splitting again leaves it alone.
pub fn extract_description(text: &str, discipline: Discipline) -> String {
  let (keywords, other, fallback): (&Regex, &Regex, &str) = match discipline {
    Discipline::Strength => (&*STRENGTH, &*CARDIO, "Strength training session"),
    _ => (&*CARDIO, &*STRENGTH, "Cardio training session"),
  };

  SEGMENT_SEPARATOR
    .split(text)
    .flat_map(|segment| {
      // a bare "and" only separates activities inside a still-mixed segment
      if other.is_match(segment) {
        BARE_AND.split(segment).collect::<Vec<_>>()
      } else {
        vec![segment]
      }
    })
    .map(str::trim)
    .find(|segment| !segment.is_empty() && keywords.is_match(segment) && !other.is_match(segment))
    .map(capitalize)
    .unwrap_or_else(|| fallback.to_string())
}

fn capitalize(text: &str) -> String {
  let mut chars = text.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

/// Split a combined entry into single-discipline sessions on the same day.
///
/// Entries that are not combined, that mention neither cardio nor strength,
/// or whose only detected discipline is already their own, come back as-is.
pub fn split_session(session: &WorkoutSession) -> Vec<WorkoutSession> {
  if !is_combined(&session.title, &session.description) {
    return vec![session.clone()];
  }

  let text = format!("{} {}", session.title, session.description);
  let cardio = has_cardio(&text);
  let strength = has_strength(&text);

  let single_matching = match (cardio, strength) {
    (false, false) => true,
    (true, false) => session.session_type == Discipline::Cardio,
    (false, true) => session.session_type == Discipline::Strength,
    (true, true) => false,
  };
  if single_matching {
    return vec![session.clone()];
  }

  let source = if session.description.trim().is_empty() {
    &session.title
  } else {
    &session.description
  };

  let mut sessions = Vec::with_capacity(2);
  if cardio {
    sessions.push(WorkoutSession::new(
      session.day,
      format!("{} Cardio Session", session.day),
      extract_description(source, Discipline::Cardio),
      session.intensity,
      Discipline::Cardio,
    ));
  }
  if strength {
    sessions.push(WorkoutSession::new(
      session.day,
      format!("{} Strength Training", session.day),
      extract_description(source, Discipline::Strength),
      session.intensity,
      Discipline::Strength,
    ));
  }

  tracing::debug!(
    day = %session.day,
    title = %session.title,
    parts = sessions.len(),
    "split combined session"
  );
  sessions
}

/// Run the splitter over a whole list, preserving order
pub fn normalize_sessions(sessions: &[WorkoutSession]) -> Vec<WorkoutSession> {
  sessions.iter().flat_map(split_session).collect()
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
