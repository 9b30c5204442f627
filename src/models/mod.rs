pub mod feedback;
pub mod profile;
pub mod program;
pub mod recovery;

pub use feedback::{ProgramFeedback, TodaysWorkout};
pub use profile::{UserProfile, WeightEntry};
pub use program::{
  Day, Discipline, ExperienceLevel, Intensity, NewProgram, NutritionPlan, Phase, Program,
  ProgramType, StrengthConfig, StrengthSplit, UpdateRecord, WorkoutSession,
};
pub use recovery::{RecoveryEntry, RecoveryStatus};
