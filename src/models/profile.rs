use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::program::ExperienceLevel;

/// Profile snapshot supplied by the profile-editing collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
  pub age: u32,
  pub gender: String,
  pub weight_kg: f64,
  pub height_cm: f64,
  #[serde(default)]
  pub body_fat_pct: Option<f64>,
  pub activity_level: String,
  pub fitness_goal: String,
  pub experience_level: ExperienceLevel,
}

/// One weigh-in; history lists are ordered newest-first
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightEntry {
  pub date: NaiveDate,
  pub weight_kg: f64,
}
