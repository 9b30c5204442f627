//! Mileage Progression Planner
//!
//! Weekly running volume targets for marathon and half-marathon programs:
//! - linear build from base to peak mileage (experience-dependent)
//! - step-back week every fourth week once past week 4
//! - taper that sheds up to 40% of peak volume before race day
//!
//! Everything here is pure and recomputed on demand; nothing is persisted.

use serde::{Deserialize, Serialize};

use crate::goals::parse_goal_time;
use crate::models::{ExperienceLevel, ProgramType};

// Secondary distance shares of the non-long-run volume
const EASY_SHARE: f64 = 0.6;
const TEMPO_SHARE: f64 = 0.25;
const INTERVAL_SHARE: f64 = 0.15;

const STEP_BACK_MILEAGE: f64 = 0.8;
const STEP_BACK_LONG_RUN: f64 = 0.85;
const MAX_TAPER_REDUCTION: f64 = 0.4;

// Pace offsets in min/mile relative to goal pace
const EASY_PACE_OFFSET: f64 = 1.0;
const TEMPO_PACE_OFFSET: f64 = -0.3;
const INTERVAL_PACE_OFFSET: f64 = -1.0;
const LONG_PACE_OFFSET: f64 = 0.75;

// ---------------------------------------------------------------------------
/// Lookup Tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MileageBounds {
    pub base: f64,
    pub peak: f64,
}

/// Base and peak weekly mileage by discipline and experience
pub fn mileage_bounds(program_type: ProgramType, level: ExperienceLevel) -> Option<MileageBounds> {
    let (base, peak) = match (program_type, level) {
        (ProgramType::Marathon, ExperienceLevel::Beginner) => (20.0, 45.0),
        (ProgramType::Marathon, ExperienceLevel::Intermediate) => (35.0, 65.0),
        (ProgramType::Marathon, ExperienceLevel::Advanced) => (50.0, 85.0),
        (ProgramType::HalfMarathon, ExperienceLevel::Beginner) => (15.0, 30.0),
        (ProgramType::HalfMarathon, ExperienceLevel::Intermediate) => (25.0, 45.0),
        (ProgramType::HalfMarathon, ExperienceLevel::Advanced) => (35.0, 60.0),
        _ => return None,
    };
    Some(MileageBounds { base, peak })
}

pub fn race_distance_km(program_type: ProgramType) -> Option<f64> {
    match program_type {
        ProgramType::Marathon => Some(42.195),
        ProgramType::HalfMarathon => Some(21.0975),
        _ => None,
    }
}

pub fn race_distance_miles(program_type: ProgramType) -> Option<f64> {
    match program_type {
        ProgramType::Marathon => Some(26.2),
        ProgramType::HalfMarathon => Some(13.1),
        _ => None,
    }
}

/// Longest training block the planner will lay out
pub fn training_weeks_cap(program_type: ProgramType) -> Option<u32> {
    match program_type {
        ProgramType::Marathon => Some(16),
        ProgramType::HalfMarathon => Some(12),
        _ => None,
    }
}

/// Split a training block into (build, taper) weeks, 75/25
pub fn split_build_taper(total_weeks: u32) -> (u32, u32) {
    let build = (total_weeks as f64 * 0.75).floor() as u32;
    (build, total_weeks - build)
}

/// Fast goal paces need more volume, slow ones less
pub fn scale_peak_for_pace(peak: f64, pace_min_per_km: f64) -> f64 {
    if pace_min_per_km < 4.0 {
        peak * 1.2
    } else if pace_min_per_km > 6.0 {
        peak * 0.8
    } else {
        peak
    }
}

fn long_run_bounds(program_type: ProgramType) -> (f64, f64) {
    match program_type {
        ProgramType::HalfMarathon => (6.0, 13.0),
        _ => (8.0, 20.0),
    }
}

fn taper_long_run(program_type: ProgramType, taper_week: u32) -> f64 {
    let half = program_type == ProgramType::HalfMarathon;
    match (taper_week, half) {
        (1, false) => 12.0,
        (1, true) => 8.0,
        (2, false) => 8.0,
        (2, true) => 5.0,
        _ => 3.0,
    }
}

/// Format min/mile as `m:ss/mile`
pub fn format_pace(pace_min_per_mile: f64) -> String {
    let mut minutes = pace_min_per_mile.floor();
    let mut seconds = ((pace_min_per_mile - minutes) * 60.0).round();
    if seconds >= 60.0 {
        minutes += 1.0;
        seconds = 0.0;
    }
    format!("{}:{:02}/mile", minutes as i64, seconds as i64)
}

// ---------------------------------------------------------------------------
/// Output Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingPhase {
    Build,
    Taper,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaceGuidance {
    pub easy: String,
    pub tempo: String,
    pub interval: String,
    pub long: String,
}

impl PaceGuidance {
    fn qualitative() -> Self {
        Self {
            easy: "Conversational pace".to_string(),
            tempo: "Comfortably hard, sustainable for about an hour".to_string(),
            interval: "Hard effort, around 5K race pace".to_string(),
            long: "Easy, conversational pace".to_string(),
        }
    }

    fn from_goal_pace(goal_pace_min_per_mile: f64) -> Self {
        Self {
            easy: format_pace(goal_pace_min_per_mile + EASY_PACE_OFFSET),
            tempo: format_pace(goal_pace_min_per_mile + TEMPO_PACE_OFFSET),
            interval: format_pace(goal_pace_min_per_mile + INTERVAL_PACE_OFFSET),
            long: format_pace(goal_pace_min_per_mile + LONG_PACE_OFFSET),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MileageWeek {
    pub week: u32,
    pub phase: TrainingPhase,
    pub weekly_mileage: f64,
    pub long_run_miles: f64,
    pub easy_run_miles: f64,
    pub tempo_miles: f64,
    pub interval_miles: f64,
    pub pace_guidance: PaceGuidance,
}

impl MileageWeek {
    /// Sum of the individual run distances
    pub fn component_total(&self) -> f64 {
        self.easy_run_miles + self.tempo_miles + self.interval_miles + self.long_run_miles
    }
}

// ---------------------------------------------------------------------------
/// Planner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MileagePlanner {
    program_type: ProgramType,
    base: f64,
    peak: f64,
    total_weeks: u32,
    build_weeks: u32,
    taper_weeks: u32,
    goal_pace_min_per_mile: Option<f64>,
}

impl MileagePlanner {
    /// Build a planner for an endurance program; `None` for other disciplines.
    ///
    /// `total_weeks` is clamped to the discipline cap and defaults to it.
    pub fn new(
        program_type: ProgramType,
        level: ExperienceLevel,
        goal_time: Option<&str>,
        total_weeks: Option<u32>,
    ) -> Option<Self> {
        let bounds = mileage_bounds(program_type, level)?;
        let cap = training_weeks_cap(program_type)?;
        let distance_km = race_distance_km(program_type)?;
        let distance_miles = race_distance_miles(program_type)?;

        let goal_minutes = goal_time.and_then(parse_goal_time);
        let peak = match goal_minutes {
            Some(minutes) => scale_peak_for_pace(bounds.peak, minutes / distance_km),
            None => bounds.peak,
        };

        let total = total_weeks.unwrap_or(cap).clamp(1, cap);
        let (build_weeks, taper_weeks) = split_build_taper(total);

        Some(Self {
            program_type,
            base: bounds.base,
            peak,
            total_weeks: total,
            build_weeks,
            taper_weeks,
            goal_pace_min_per_mile: goal_minutes.map(|m| m / distance_miles),
        })
    }

    pub fn total_weeks(&self) -> u32 {
        self.total_weeks
    }

    pub fn build_weeks(&self) -> u32 {
        self.build_weeks
    }

    pub fn taper_weeks(&self) -> u32 {
        self.taper_weeks
    }

    pub fn peak_mileage(&self) -> f64 {
        self.peak
    }

    pub fn goal_pace_min_per_mile(&self) -> Option<f64> {
        self.goal_pace_min_per_mile
    }

    /// Targets for a 1-based week (clamped into the block)
    pub fn week(&self, week: u32) -> MileageWeek {
        let week = week.clamp(1, self.total_weeks);

        let (phase, weekly, long) = if week <= self.build_weeks {
            let (weekly, long) = self.build_week(week);
            (TrainingPhase::Build, weekly, long)
        } else {
            let (weekly, long) = self.taper_week(week - self.build_weeks);
            (TrainingPhase::Taper, weekly, long)
        };

        // A long run never exceeds the week's total
        let long = long.min(weekly);
        let remainder = (weekly - long).max(0.0);

        MileageWeek {
            week,
            phase,
            weekly_mileage: weekly,
            long_run_miles: long,
            easy_run_miles: (remainder * EASY_SHARE).round(),
            tempo_miles: (remainder * TEMPO_SHARE).round(),
            interval_miles: (remainder * INTERVAL_SHARE).round(),
            pace_guidance: match self.goal_pace_min_per_mile {
                Some(pace) => PaceGuidance::from_goal_pace(pace),
                None => PaceGuidance::qualitative(),
            },
        }
    }

    /// Every week of the block, in order
    pub fn full_plan(&self) -> Vec<MileageWeek> {
        (1..=self.total_weeks).map(|w| self.week(w)).collect()
    }

    fn build_week(&self, week: u32) -> (f64, f64) {
        let ratio = if self.build_weeks > 1 {
            (week - 1) as f64 / (self.build_weeks - 1) as f64
        } else {
            1.0
        };
        let (long_min, long_max) = long_run_bounds(self.program_type);

        let mut weekly = (self.base + (self.peak - self.base) * ratio).round();
        let mut long = (long_min + (long_max - long_min) * ratio).round();

        if is_step_back_week(week) {
            weekly = (weekly * STEP_BACK_MILEAGE).round();
            long = (long * STEP_BACK_LONG_RUN).round();
        }

        (weekly, long)
    }

    fn taper_week(&self, taper_week: u32) -> (f64, f64) {
        let taper_weeks = self.taper_weeks.max(1) as f64;
        let ratio = 1.0 - (taper_week as f64 / taper_weeks) * MAX_TAPER_REDUCTION;
        (
            (self.peak * ratio).round(),
            taper_long_run(self.program_type, taper_week),
        )
    }
}

/// Every fourth week after week 4 is a recovery week
pub fn is_step_back_week(week: u32) -> bool {
    week % 4 == 0 && week > 4
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
