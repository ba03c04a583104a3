use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Coarse muscle grouping used for display and split classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Arms,
    Legs,
    Core,
}

impl MuscleGroup {
    /// Classify a muscle name into its group by substring heuristic.
    ///
    /// The matching is deliberately loose ("Lats" and "Lower Back" both land
    /// in `Back`); tightening it would silently change recommendations.
    pub fn classify(muscle_name: &str) -> Option<MuscleGroup> {
        let name = muscle_name.to_lowercase();

        if name.contains("chest") {
            return Some(MuscleGroup::Chest);
        }
        if name.contains("back") || name.contains("lat") {
            return Some(MuscleGroup::Back);
        }
        if name.contains("delt") || name.contains("shoulder") {
            return Some(MuscleGroup::Shoulders);
        }
        if name.contains("bicep") || name.contains("tricep") || name.contains("forearm") {
            return Some(MuscleGroup::Arms);
        }
        if name.contains("quad")
            || name.contains("hamstring")
            || name.contains("glute")
            || name.contains("calve")
        {
            return Some(MuscleGroup::Legs);
        }
        if name.contains("abs") || name.contains("core") {
            return Some(MuscleGroup::Core);
        }

        None
    }
}

/// Immutable muscle reference data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Muscle {
    /// Unique identifier
    pub id: String,

    /// Display name, e.g. "Chest", "Lower Back", "Rear Delts"
    pub name: String,

    /// Coarse group for display purposes
    pub group: MuscleGroup,
}

/// Exercise categories used for split assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseCategory {
    Push,
    Pull,
    Legs,
    Cardio,
    Pt,
}

impl fmt::Display for ExerciseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseCategory::Push => write!(f, "push"),
            ExerciseCategory::Pull => write!(f, "pull"),
            ExerciseCategory::Legs => write!(f, "legs"),
            ExerciseCategory::Cardio => write!(f, "cardio"),
            ExerciseCategory::Pt => write!(f, "pt"),
        }
    }
}

/// One muscle targeted by an exercise
///
/// `weight` is the fraction of the exercise's training stimulus attributed to
/// this muscle (0.0-1.0). Weights are not required to sum to 1 across the
/// targets of an exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuscleTarget {
    pub muscle: Muscle,
    pub weight: f64,
}

/// Catalog entry for an exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    /// Unique identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Category determining which workout types this exercise fits
    pub category: ExerciseCategory,

    /// Required equipment; `None` means bodyweight
    pub equipment: Option<String>,

    /// Optional how-to text
    pub instructions: Option<String>,

    /// Muscles targeted, in catalog order
    pub muscle_targets: Vec<MuscleTarget>,
}

/// Workout types produced by the type selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
    Push,
    Pull,
    Legs,
    Pt,
    Rest,
}

impl WorkoutType {
    /// Whether an exercise category belongs to this workout type
    pub fn matches_category(&self, category: ExerciseCategory) -> bool {
        matches!(
            (self, category),
            (WorkoutType::Push, ExerciseCategory::Push)
                | (WorkoutType::Pull, ExerciseCategory::Pull)
                | (WorkoutType::Legs, ExerciseCategory::Legs)
                | (WorkoutType::Pt, ExerciseCategory::Pt)
        )
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkoutType::Push => write!(f, "push"),
            WorkoutType::Pull => write!(f, "pull"),
            WorkoutType::Legs => write!(f, "legs"),
            WorkoutType::Pt => write!(f, "pt"),
            WorkoutType::Rest => write!(f, "rest"),
        }
    }
}

/// Coarse self-reported exertion label per set
///
/// Used only by surrounding analytics, never by the scoring engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Easy,
    Normal,
    Hard,
}

/// A single logged set within a workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSet {
    /// Catalog id of the exercise performed
    pub exercise_id: String,

    /// 1-based position within the workout
    pub set_number: u32,

    /// Load lifted in kilograms (0 for bodyweight work)
    pub weight: f64,

    /// Repetitions completed
    pub reps: u32,

    /// Self-reported exertion
    pub effort: Option<Effort>,

    /// Rest taken after this set
    pub rest_seconds: Option<u32>,
}

/// A completed or in-progress training session
///
/// Created when a session starts and mutated on finish by the surrounding
/// system; the recommendation engine only ever reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub user_id: String,

    /// Session start time
    pub date: DateTime<Utc>,

    pub workout_type: WorkoutType,

    /// Sets in logged order
    pub sets: Vec<WorkoutSet>,

    pub duration_minutes: u32,
    pub notes: Option<String>,
}

/// Self-reported energy for the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    Low,
    Normal,
    High,
}

impl fmt::Display for EnergyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnergyLevel::Low => write!(f, "low"),
            EnergyLevel::Normal => write!(f, "normal"),
            EnergyLevel::High => write!(f, "high"),
        }
    }
}

/// Time the user has for today's session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeAvailable {
    Short,
    Normal,
    Long,
}

/// Muscle name -> soreness level (0-5)
///
/// Values are validated to the 0-5 range at the collaborator boundary; the
/// engine assumes validated input. Lookups are exact on the muscle name as
/// reported in the check-in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SorenessMap(pub BTreeMap<String, u8>);

impl SorenessMap {
    pub fn new() -> Self {
        SorenessMap(BTreeMap::new())
    }

    pub fn set(&mut self, muscle_name: impl Into<String>, level: u8) {
        self.0.insert(muscle_name.into(), level);
    }

    /// Soreness level for a muscle, if reported
    pub fn level(&self, muscle_name: &str) -> Option<u8> {
        self.0.get(muscle_name).copied()
    }

    /// Highest reported soreness, if any
    pub fn max_level(&self) -> Option<u8> {
        self.0.values().copied().max()
    }

    /// Mean soreness across reported muscles
    pub fn average(&self) -> Option<f64> {
        if self.0.is_empty() {
            return None;
        }
        let sum: u32 = self.0.values().map(|&v| v as u32).sum();
        Some(sum as f64 / self.0.len() as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Daily self-report, one per user per calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCheckin {
    pub user_id: String,

    /// Calendar day of the check-in
    pub date: DateTime<Utc>,

    pub hours_slept: Option<f64>,

    /// Sleep quality on a 1-5 scale
    pub sleep_quality: Option<u8>,

    pub energy_level: Option<EnergyLevel>,

    pub soreness: Option<SorenessMap>,

    /// Acute pain flag; details in `pain_note`
    pub acute_pain: bool,
    pub pain_note: Option<String>,

    pub time_available: Option<TimeAvailable>,
}

/// Kinds of tracked problems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemKind {
    Injury,
    Condition,
    Imbalance,
    Weakness,
}

/// A tracked injury, condition, imbalance, or weakness
///
/// `affected_muscles` holds free-text muscle-name fragments ("lower back",
/// "forearms") matched against catalog muscle names by substring containment
/// in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub id: Option<String>,
    pub kind: ProblemKind,

    /// Short label, e.g. "Lower Back Pain"
    pub name: String,

    pub description: Option<String>,

    pub affected_muscles: Vec<String>,

    /// Explicit remedial exercises; when non-empty, matching is by id only
    #[serde(default)]
    pub recommended_exercise_ids: Vec<String>,

    /// Urgency on a 1-5 scale, higher = more urgent
    pub priority: u8,

    pub is_active: bool,
}

/// Stated training goals
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessGoal {
    Strength,
    Hypertrophy,
    Endurance,
    Pt,
    InjuryPrevention,
    AthleticPerformance,
    GeneralFitness,
}

/// Training split preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitType {
    PushPullLegs,
    UpperLower,
    FullBody,
    PtFocused,
    Custom,
}

/// Weekly training schedule configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSchedule {
    pub days_per_week: u8,

    /// Preferred day-of-week indices, Sunday = 0
    #[serde(default)]
    pub preferred_days: Vec<u8>,

    pub minutes_per_session: u32,
}

/// User goals, problems, and constraints
///
/// Supplied wholesale per computation; the engine treats it as read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserFitnessProfile {
    #[serde(default)]
    pub goals: Vec<FitnessGoal>,

    #[serde(default)]
    pub problems: Vec<Problem>,

    #[serde(default)]
    pub preferred_splits: Vec<SplitType>,

    #[serde(default)]
    pub favorite_exercise_ids: Vec<String>,

    #[serde(default)]
    pub avoid_exercise_ids: Vec<String>,

    #[serde(default)]
    pub available_equipment: Vec<String>,

    pub schedule: Option<TrainingSchedule>,
}

impl UserFitnessProfile {
    /// Problems currently flagged active
    pub fn active_problems(&self) -> Vec<&Problem> {
        self.problems.iter().filter(|p| p.is_active).collect()
    }
}

/// User feedback on a persisted recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Positive,
    Negative,
}
