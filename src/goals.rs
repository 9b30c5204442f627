//! Goal requirement calculator
//!
//! Turns a coarse goal (discipline, free-text target metric, goal date) into
//! quantitative requirements. A target metric that does not match the
//! discipline's pattern yields the generic timeline fields only; callers
//! treat a missing `target` as "no numeric goal", never as an error.

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::mileage;
use crate::models::{ExperienceLevel, ProgramType, UserProfile, WeightEntry};

/// ---------------------------------------------------------------------------
/// Constants
/// ---------------------------------------------------------------------------

pub const KM_PER_MILE: f64 = 1.60934;
pub const KG_PER_LB: f64 = 0.453592;
const KCAL_PER_KG: f64 = 7700.0;
const MAX_WEEKLY_LOSS_KG: f64 = 0.75;
const MAX_FEASIBLE_WEEKLY_LOSS_KG: f64 = 1.0;

// Pace offsets in min/km relative to goal pace
const EASY_OFFSET: f64 = 1.0;
const TEMPO_OFFSET: f64 = -0.3;
const INTERVAL_OFFSET: f64 = -1.0;

static GOAL_TIME: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\b(\d{1,2}):([0-5]\d):([0-5]\d)\b").expect("valid goal time regex"));

static WEIGHT_TARGET: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(lbs?|kg)\b").expect("valid weight regex"));

static STRENGTH_TOTAL: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(lbs?|kg)?\s*total\b").expect("valid total regex")
});

static MUSCLE_GAIN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(lbs?|kg)?\s*(?:of\s+)?(?:lean\s+)?muscle\b")
    .expect("valid muscle regex")
});

/// ---------------------------------------------------------------------------
/// Output Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
  Low,
  Medium,
  High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalRequirements {
  pub days_until_goal: i64,
  pub weeks_until_goal: i64,
  pub urgency: Urgency,
  pub feasible: bool,
  /// Present only when the target metric parsed for this discipline
  #[serde(skip_serializing_if = "Option::is_none")]
  pub target: Option<DisciplineTarget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DisciplineTarget {
  Endurance(EnduranceTarget),
  WeightLoss(WeightLossTarget),
  Powerlifting(StrengthTotalTarget),
  Hypertrophy(MuscleGainTarget),
}

/// Pace targets in min/mile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaceTargets {
  pub easy: f64,
  pub tempo: f64,
  pub interval: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnduranceTarget {
  pub target_time_minutes: f64,
  pub distance_km: f64,
  pub target_pace_min_per_km: f64,
  pub base_weekly_mileage: f64,
  pub peak_weekly_mileage: f64,
  pub total_training_weeks: u32,
  pub build_weeks: u32,
  pub taper_weeks: u32,
  pub pace_targets: PaceTargets,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightLossTarget {
  pub target_weight_loss_kg: f64,
  pub current_weight_kg: f64,
  pub target_weight_kg: f64,
  pub weekly_weight_loss_target: f64,
  pub daily_calorie_deficit: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrengthTotalTarget {
  pub target_total_kg: f64,
  pub estimated_current_total_kg: f64,
  pub weekly_increase_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MuscleGainTarget {
  pub target_gain_kg: f64,
  pub weekly_gain_target_kg: f64,
  pub months_until_goal: f64,
  pub max_monthly_gain_kg: f64,
  pub recommended_calorie_surplus: i64,
}

/// ---------------------------------------------------------------------------
/// Parsing Helpers
/// ---------------------------------------------------------------------------

/// Parse an `H:MM:SS` goal time anywhere in the text into total minutes
pub fn parse_goal_time(text: &str) -> Option<f64> {
  let caps = GOAL_TIME.captures(text)?;
  let hours: f64 = caps[1].parse().ok()?;
  let minutes: f64 = caps[2].parse().ok()?;
  let seconds: f64 = caps[3].parse().ok()?;
  let total = hours * 60.0 + minutes + seconds / 60.0;
  (total > 0.0).then_some(total)
}

/// Convert an amount to kg; a missing unit is read as pounds
fn to_kg(amount: f64, unit: Option<&str>) -> f64 {
  match unit.map(|u| u.to_lowercase()) {
    Some(u) if u == "kg" => amount,
    _ => amount * KG_PER_LB,
  }
}

fn capture_amount(re: &Regex, text: &str) -> Option<f64> {
  let caps = re.captures(text)?;
  let amount: f64 = caps[1].parse().ok()?;
  let kg = to_kg(amount, caps.get(2).map(|m| m.as_str()));
  (kg > 0.0).then_some(kg)
}

/// ---------------------------------------------------------------------------
/// Timeline
/// ---------------------------------------------------------------------------

/// Days and weeks left until the goal date (goal taken at 00:00 UTC)
pub fn timeline(goal_date: NaiveDate, now: DateTime<Utc>) -> (i64, i64) {
  let goal = goal_date.and_time(chrono::NaiveTime::MIN).and_utc();
  let seconds = (goal - now).num_seconds() as f64;
  let days = ((seconds / 86_400.0).ceil() as i64).max(1);
  let weeks = (days + 6) / 7;
  (days, weeks)
}

fn urgency_for(days_until_goal: i64) -> Urgency {
  if days_until_goal < 30 {
    Urgency::High
  } else if days_until_goal < 90 {
    Urgency::Medium
  } else {
    Urgency::Low
  }
}

/// ---------------------------------------------------------------------------
/// Calculator
/// ---------------------------------------------------------------------------

pub fn calculate_goal_requirements(
  program_type: ProgramType,
  target_metric: &str,
  goal_date: NaiveDate,
  experience: ExperienceLevel,
  profile: &UserProfile,
  weight_history: &[WeightEntry],
  now: DateTime<Utc>,
) -> GoalRequirements {
  let (days_until_goal, weeks_until_goal) = timeline(goal_date, now);
  let weeks = weeks_until_goal.max(1) as f64;

  // Newest weigh-in wins over the profile value
  let current_weight = weight_history
    .first()
    .map(|w| w.weight_kg)
    .unwrap_or(profile.weight_kg);

  let (feasible, target) = match program_type {
    ProgramType::Marathon | ProgramType::HalfMarathon => {
      match endurance_target(program_type, target_metric, experience, weeks_until_goal) {
        Some(t) => (true, Some(DisciplineTarget::Endurance(t))),
        None => (true, None),
      }
    }
    ProgramType::WeightLoss => match capture_amount(&WEIGHT_TARGET, target_metric) {
      Some(loss_kg) => {
        let weekly_needed = loss_kg / weeks;
        let weekly_target = weekly_needed.min(MAX_WEEKLY_LOSS_KG);
        let target = WeightLossTarget {
          target_weight_loss_kg: loss_kg,
          current_weight_kg: current_weight,
          target_weight_kg: current_weight - loss_kg,
          weekly_weight_loss_target: weekly_target,
          daily_calorie_deficit: (weekly_target * KCAL_PER_KG / 7.0).round() as i64,
        };
        (
          weekly_needed <= MAX_FEASIBLE_WEEKLY_LOSS_KG,
          Some(DisciplineTarget::WeightLoss(target)),
        )
      }
      None => (true, None),
    },
    ProgramType::Powerlifting => match capture_amount(&STRENGTH_TOTAL, target_metric) {
      Some(target_total) => {
        let multiplier = match experience {
          ExperienceLevel::Beginner => 2.5,
          ExperienceLevel::Intermediate => 3.5,
          ExperienceLevel::Advanced => 4.5,
        };
        let current_total = current_weight * multiplier;
        let weekly_increase = (target_total - current_total) / weeks;
        let max_weekly = if experience == ExperienceLevel::Beginner {
          5.0
        } else {
          2.5
        };
        let target = StrengthTotalTarget {
          target_total_kg: target_total,
          estimated_current_total_kg: current_total,
          weekly_increase_kg: weekly_increase,
        };
        (
          weekly_increase <= max_weekly,
          Some(DisciplineTarget::Powerlifting(target)),
        )
      }
      None => (true, None),
    },
    ProgramType::Hypertrophy => match capture_amount(&MUSCLE_GAIN, target_metric) {
      Some(gain_kg) => {
        let max_monthly_gain = match experience {
          ExperienceLevel::Beginner => 1.0,
          ExperienceLevel::Intermediate => 0.5,
          ExperienceLevel::Advanced => 0.25,
        };
        let months = (weeks_until_goal.max(4) as f64) / 4.0;
        let weekly_gain = gain_kg / weeks;
        let target = MuscleGainTarget {
          target_gain_kg: gain_kg,
          weekly_gain_target_kg: weekly_gain,
          months_until_goal: months,
          max_monthly_gain_kg: max_monthly_gain,
          recommended_calorie_surplus: (weekly_gain * KCAL_PER_KG / 7.0).round() as i64,
        };
        (
          gain_kg / months <= max_monthly_gain,
          Some(DisciplineTarget::Hypertrophy(target)),
        )
      }
      None => (true, None),
    },
    ProgramType::GeneralFitness => (true, None),
  };

  if target.is_none() && program_type != ProgramType::GeneralFitness {
    tracing::debug!(
      program_type = program_type.as_str(),
      target_metric,
      "target metric did not parse, returning timeline only"
    );
  }

  GoalRequirements {
    days_until_goal,
    weeks_until_goal,
    urgency: urgency_for(days_until_goal),
    feasible,
    target,
  }
}

fn endurance_target(
  program_type: ProgramType,
  target_metric: &str,
  experience: ExperienceLevel,
  weeks_until_goal: i64,
) -> Option<EnduranceTarget> {
  let total_minutes = parse_goal_time(target_metric)?;
  let distance_km = mileage::race_distance_km(program_type)?;
  let bounds = mileage::mileage_bounds(program_type, experience)?;
  let pace = total_minutes / distance_km;

  let cap = mileage::training_weeks_cap(program_type)?;
  let total_training_weeks = (weeks_until_goal.max(1) as u32).min(cap);
  let (build_weeks, taper_weeks) = mileage::split_build_taper(total_training_weeks);

  Some(EnduranceTarget {
    target_time_minutes: total_minutes,
    distance_km,
    target_pace_min_per_km: pace,
    base_weekly_mileage: bounds.base,
    peak_weekly_mileage: mileage::scale_peak_for_pace(bounds.peak, pace),
    total_training_weeks,
    build_weeks,
    taper_weeks,
    pace_targets: PaceTargets {
      easy: (pace + EASY_OFFSET) * KM_PER_MILE,
      tempo: (pace + TEMPO_OFFSET) * KM_PER_MILE,
      interval: (pace + INTERVAL_OFFSET) * KM_PER_MILE,
    },
  })
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
