use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Enumerations
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProgramType {
  Marathon,
  HalfMarathon,
  WeightLoss,
  Powerlifting,
  Hypertrophy,
  GeneralFitness,
}

impl ProgramType {
  pub fn is_endurance(&self) -> bool {
    matches!(self, ProgramType::Marathon | ProgramType::HalfMarathon)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      ProgramType::Marathon => "marathon",
      ProgramType::HalfMarathon => "halfMarathon",
      ProgramType::WeightLoss => "weightLoss",
      ProgramType::Powerlifting => "powerlifting",
      ProgramType::Hypertrophy => "hypertrophy",
      ProgramType::GeneralFitness => "generalFitness",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
  #[default]
  Beginner,
  Intermediate,
  Advanced,
}

/// Day of the week a session is scheduled on (Monday-first ordering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Day {
  Monday,
  Tuesday,
  Wednesday,
  Thursday,
  Friday,
  Saturday,
  Sunday,
}

impl Day {
  pub const ALL: [Day; 7] = [
    Day::Monday,
    Day::Tuesday,
    Day::Wednesday,
    Day::Thursday,
    Day::Friday,
    Day::Saturday,
    Day::Sunday,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Day::Monday => "Monday",
      Day::Tuesday => "Tuesday",
      Day::Wednesday => "Wednesday",
      Day::Thursday => "Thursday",
      Day::Friday => "Friday",
      Day::Saturday => "Saturday",
      Day::Sunday => "Sunday",
    }
  }

  pub fn from_weekday(weekday: chrono::Weekday) -> Self {
    Day::ALL[weekday.num_days_from_monday() as usize]
  }
}

impl std::fmt::Display for Day {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for Day {
  type Err = String;

  /// Accepts full names and three-letter abbreviations, any case
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let lowered = s.trim().to_lowercase();
    Day::ALL
      .iter()
      .find(|d| {
        let name = d.as_str().to_lowercase();
        lowered == name || (lowered.len() >= 3 && name.starts_with(&lowered))
      })
      .copied()
      .ok_or_else(|| format!("Unknown day: {}", s))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Intensity {
  None,
  #[serde(rename = "Very Low")]
  VeryLow,
  Low,
  #[serde(rename = "Medium-Low")]
  MediumLow,
  #[default]
  Medium,
  #[serde(rename = "Medium-High")]
  MediumHigh,
  High,
}

impl std::str::FromStr for Intensity {
  type Err = String;

  /// Tolerates case, underscores and spaces: "medium_high", "Medium High"
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let key: String = s
      .trim()
      .to_lowercase()
      .chars()
      .filter(|c| c.is_ascii_alphabetic())
      .collect();
    match key.as_str() {
      "none" | "rest" => Ok(Intensity::None),
      "verylow" => Ok(Intensity::VeryLow),
      "low" => Ok(Intensity::Low),
      "mediumlow" | "moderatelow" => Ok(Intensity::MediumLow),
      "medium" | "moderate" => Ok(Intensity::Medium),
      "mediumhigh" | "moderatehigh" => Ok(Intensity::MediumHigh),
      "high" => Ok(Intensity::High),
      _ => Err(format!("Unknown intensity: {}", s)),
    }
  }
}

/// The single discipline of a scheduled session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Discipline {
  Cardio,
  Strength,
  Recovery,
  Other,
}

impl std::str::FromStr for Discipline {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "cardio" => Ok(Discipline::Cardio),
      "strength" => Ok(Discipline::Strength),
      "recovery" => Ok(Discipline::Recovery),
      "other" => Ok(Discipline::Other),
      _ => Err(format!("Unknown discipline: {}", s)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum StrengthSplit {
  #[default]
  FullBody,
  UpperLower,
  PushPullLegs,
  BodyPart,
  Custom,
}

/// ---------------------------------------------------------------------------
/// Schedule
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
  pub day: Day,
  pub title: String,
  pub description: String,
  pub intensity: Intensity,
  #[serde(rename = "type")]
  pub session_type: Discipline,
  #[serde(default)]
  pub adjusted_for_recovery: Option<String>,
}

impl WorkoutSession {
  pub fn new(
    day: Day,
    title: impl Into<String>,
    description: impl Into<String>,
    intensity: Intensity,
    session_type: Discipline,
  ) -> Self {
    Self {
      day,
      title: title.into(),
      description: description.into(),
      intensity,
      session_type,
      adjusted_for_recovery: None,
    }
  }

  pub fn is_strength(&self) -> bool {
    self.session_type == Discipline::Strength
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
  pub name: String,
  pub duration_weeks: u32,
  pub focus: String,
  #[serde(default)]
  pub weekly_structure: Vec<WorkoutSession>,
}

impl Phase {
  pub fn strength_count(&self) -> usize {
    self.weekly_structure.iter().filter(|s| s.is_strength()).count()
  }
}

/// ---------------------------------------------------------------------------
/// Program Aggregate
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrengthConfig {
  pub enabled: bool,
  pub days_per_week: u8,
  pub split: StrengthSplit,
  #[serde(default)]
  pub custom_split: Option<String>,
}

impl StrengthConfig {
  /// Sessions the enforcer must produce per phase; `None` when disabled.
  /// Enabled with zero days is `Some(0)` and removes all strength work.
  pub fn required_sessions(&self) -> Option<usize> {
    self.enabled.then_some(self.days_per_week as usize)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionPlan {
  pub calories: f64,
  pub protein_g: f64,
  pub carbs_g: f64,
  pub fat_g: f64,
}

/// Audit entry for an accepted update request; never rewritten once stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecord {
  pub date: DateTime<Utc>,
  pub request_text: String,
  pub changes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
  pub id: i64,
  #[serde(rename = "type")]
  pub program_type: ProgramType,
  pub target_metric: String,
  pub goal_date: NaiveDate,
  pub start_date: NaiveDate,
  pub experience_level: ExperienceLevel,
  pub training_days_per_week: u8,
  #[serde(default)]
  pub strength_config: Option<StrengthConfig>,
  #[serde(default)]
  pub nutrition: Option<NutritionPlan>,
  #[serde(default)]
  pub phases: Vec<Phase>,
  #[serde(default)]
  pub update_history: Vec<UpdateRecord>,
}

/// For creating new programs (without id, phases, history)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProgram {
  #[serde(rename = "type")]
  pub program_type: ProgramType,
  pub target_metric: String,
  pub goal_date: NaiveDate,
  pub start_date: NaiveDate,
  pub experience_level: ExperienceLevel,
  pub training_days_per_week: u8,
  #[serde(default)]
  pub strength_config: Option<StrengthConfig>,
}

impl NewProgram {
  pub fn into_program(self, id: i64, phases: Vec<Phase>) -> Program {
    Program {
      id,
      program_type: self.program_type,
      target_metric: self.target_metric,
      goal_date: self.goal_date,
      start_date: self.start_date,
      experience_level: self.experience_level,
      training_days_per_week: self.training_days_per_week,
      strength_config: self.strength_config,
      nutrition: None,
      phases,
      update_history: Vec::new(),
    }
  }
}
