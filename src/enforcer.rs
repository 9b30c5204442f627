//! Session Count Enforcer
//!
//! Guarantees a phase's week carries exactly the number of strength sessions
//! the user asked for, whatever the generator produced. Three pure passes:
//! 1. strip anything that already looks like strength work
//! 2. normalize the rest (split combined entries)
//! 3. drop leftover strength sessions and generate exactly N new ones
//!
//! With strength disabled only pass 2 runs. Enabled with N = 0 still runs
//! all three, leaving no strength work in the week.

use regex::Regex;
use std::sync::LazyLock;

use crate::classifier::normalize_sessions;
use crate::models::{
    Day, Discipline, Intensity, Phase, Program, StrengthConfig, StrengthSplit, WorkoutSession,
};

/// Broad net for pass 1; "core" is matched as a whole word so "score" survives
static STRIP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:bench|squat|deadlift|resistance|weight|lift|gym)|\bcore\b")
        .expect("valid strip regex")
});

const SECONDARY_SUFFIX: &str = " (Evening)";

const BODY_PARTS: &[&str] = &[
    "chest", "back", "shoulders", "arms", "biceps", "triceps", "legs", "glutes", "core",
];

// ---------------------------------------------------------------------------
/// Templates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Upper,
    Lower,
    Push,
    Pull,
    Legs,
}

impl Focus {
    fn upper_lower(day: Day) -> Self {
        match day {
            Day::Monday | Day::Wednesday | Day::Friday => Focus::Upper,
            _ => Focus::Lower,
        }
    }

    fn push_pull_legs(day: Day) -> Self {
        match day {
            Day::Monday | Day::Thursday => Focus::Push,
            Day::Tuesday | Day::Friday => Focus::Pull,
            _ => Focus::Legs,
        }
    }

    fn template(self) -> (String, String) {
        let (title, description) = match self {
            Focus::Upper => (
                "Upper Body Strength",
                "Bench press, rows, overhead press and pull-ups. 3-4 sets of 6-10 reps",
            ),
            Focus::Lower => (
                "Lower Body Strength",
                "Squats, Romanian deadlifts, lunges and calf raises. 3-4 sets of 6-10 reps",
            ),
            Focus::Push => (
                "Push Day",
                "Bench press, overhead press, incline dumbbell press and triceps work",
            ),
            Focus::Pull => (
                "Pull Day",
                "Rows, pull-ups, face pulls and biceps work",
            ),
            Focus::Legs => (
                "Leg Day",
                "Squats, leg press, Romanian deadlifts, lunges and calf raises",
            ),
        };
        (title.to_string(), description.to_string())
    }
}

/// Title and description for the `index`-th generated session on `day`
fn strength_template(
    split: StrengthSplit,
    custom_split: Option<&str>,
    day: Day,
    index: usize,
) -> (String, String) {
    match split {
        StrengthSplit::UpperLower => Focus::upper_lower(day).template(),
        StrengthSplit::PushPullLegs => Focus::push_pull_legs(day).template(),
        StrengthSplit::FullBody => (
            "Full Body Strength".to_string(),
            "Compound lifts: squat, bench press, row and overhead press. 3 sets of 8-10 reps"
                .to_string(),
        ),
        StrengthSplit::BodyPart => (
            "Body Part Split".to_string(),
            "High-volume session for one muscle group: 4-5 exercises, 3-4 sets of 10-12 reps"
                .to_string(),
        ),
        StrengthSplit::Custom => custom_template(custom_split.unwrap_or_default(), day, index),
    }
}

fn custom_template(custom_split: &str, day: Day, index: usize) -> (String, String) {
    let text = custom_split.to_lowercase();

    if text.contains("push") && (text.contains("pull") || text.contains("leg")) {
        return Focus::push_pull_legs(day).template();
    }
    if text.contains("upper") && text.contains("lower") {
        return Focus::upper_lower(day).template();
    }

    let parts: Vec<&str> = BODY_PARTS
        .iter()
        .copied()
        .filter(|part| text.contains(part))
        .collect();
    if !parts.is_empty() {
        let part = parts[index % parts.len()];
        let mut title = part.to_string();
        if let Some(first) = title.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        return (
            format!("{} Focus", title),
            format!("Custom split: {} emphasis, 3-4 exercises of 3-4 sets", part),
        );
    }

    let description = if custom_split.trim().is_empty() {
        "Strength session following your custom split".to_string()
    } else {
        format!("Strength session following your custom split: {}", custom_split.trim())
    };
    ("Custom Training".to_string(), description)
}

// ---------------------------------------------------------------------------
/// Passes
// ---------------------------------------------------------------------------

/// Pass 1: drop strength-typed sessions and anything mentioning strength work
pub fn strip_strength_sessions(sessions: &[WorkoutSession]) -> Vec<WorkoutSession> {
    sessions
        .iter()
        .filter(|s| {
            !s.is_strength()
                && !STRIP_PATTERN.is_match(&s.title)
                && !STRIP_PATTERN.is_match(&s.description)
        })
        .cloned()
        .collect()
}

/// Days for `count` new sessions: unused days Monday first, then reused days
/// from the start of the week. The flag marks a reused (secondary) slot.
pub fn assign_days(occupied: &[Day], count: usize) -> Vec<(Day, bool)> {
    let unused: Vec<Day> = Day::ALL
        .iter()
        .copied()
        .filter(|d| !occupied.contains(d))
        .collect();

    (0..count)
        .map(|i| match unused.get(i) {
            Some(day) => (*day, false),
            None => (Day::ALL[(i - unused.len()) % Day::ALL.len()], true),
        })
        .collect()
}

/// Pass 3: hard reset, then generate exactly `required` strength sessions
pub fn resynthesize_strength_sessions(
    sessions: &[WorkoutSession],
    required: usize,
    split: StrengthSplit,
    custom_split: Option<&str>,
) -> Vec<WorkoutSession> {
    let mut result: Vec<WorkoutSession> =
        sessions.iter().filter(|s| !s.is_strength()).cloned().collect();

    let occupied: Vec<Day> = result.iter().map(|s| s.day).collect();

    for (index, (day, secondary)) in assign_days(&occupied, required).into_iter().enumerate() {
        let (mut title, description) = strength_template(split, custom_split, day, index);
        if secondary {
            title.push_str(SECONDARY_SUFFIX);
        }
        result.push(WorkoutSession::new(
            day,
            title,
            description,
            Intensity::MediumHigh,
            Discipline::Strength,
        ));
    }

    result.sort_by_key(|s| s.day);
    result
}

// ---------------------------------------------------------------------------
/// Entry Points
// ---------------------------------------------------------------------------

/// Rewrite one week so it holds exactly `required` strength sessions;
/// `None` (strength disabled) only normalizes
pub fn enforce_strength_sessions(
    sessions: &[WorkoutSession],
    required: Option<usize>,
    split: StrengthSplit,
    custom_split: Option<&str>,
) -> Vec<WorkoutSession> {
    let Some(required) = required else {
        return normalize_sessions(sessions);
    };

    let stripped = strip_strength_sessions(sessions);
    let normalized = normalize_sessions(&stripped);
    let result = resynthesize_strength_sessions(&normalized, required, split, custom_split);

    debug_assert_eq!(
        result.iter().filter(|s| s.is_strength()).count(),
        required,
        "strength session count must match the configured days"
    );

    tracing::debug!(
        before = sessions.len(),
        after = result.len(),
        required,
        "enforced strength sessions"
    );
    result
}

/// Apply the program's strength configuration to every phase
pub fn enforce_phases(phases: &[Phase], config: Option<&StrengthConfig>) -> Vec<Phase> {
    let required = config.and_then(StrengthConfig::required_sessions);
    let split = config.map(|c| c.split).unwrap_or_default();
    let custom_split = config.and_then(|c| c.custom_split.as_deref());

    phases
        .iter()
        .map(|phase| Phase {
            weekly_structure: enforce_strength_sessions(
                &phase.weekly_structure,
                required,
                split,
                custom_split,
            ),
            ..phase.clone()
        })
        .collect()
}

pub fn enforce_program(program: &Program) -> Program {
    Program {
        phases: enforce_phases(&program.phases, program.strength_config.as_ref()),
        ..program.clone()
    }
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
