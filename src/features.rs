//! Feature extraction for future learned models
//!
//! The rule-based engine emits a [`FeatureVector`] alongside every
//! recommendation. The vector is a pure projection of the same snapshot the
//! scorer consumed and an injected `now`, so re-running extraction on the
//! same inputs yields an identical result. Nothing here feeds back into
//! scoring; it is a stable interface for models that do not exist yet.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::coverage::MuscleCoverage;
use crate::models::{
    DailyCheckin, EnergyLevel, FitnessGoal, ProblemKind, SplitType, TimeAvailable,
    UserFitnessProfile, Workout, WorkoutType,
};
use crate::recovery::MuscleRecoveryStatus;

/// Per-muscle recovery snapshot, stripped to what a model would consume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryFeature {
    pub muscle_id: String,
    /// `None` when the muscle has never been stimulated
    pub hours_since_stimulus: Option<f64>,
    pub is_recovered: bool,
    pub soreness_level: Option<u8>,
    pub can_train: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckinFeatures {
    pub hours_slept: Option<f64>,
    pub sleep_quality: Option<u8>,
    pub energy_level: Option<EnergyLevel>,
    pub avg_soreness: Option<f64>,
    pub time_available: Option<TimeAvailable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemFeature {
    pub kind: ProblemKind,
    pub priority: u8,
    pub affected_muscle_count: usize,
}

/// Everything a future model sees about one recommendation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub muscle_recoveries: Vec<RecoveryFeature>,
    pub checkin: CheckinFeatures,

    pub muscle_coverage: Vec<MuscleCoverage>,
    pub undertrained_muscle_count: usize,
    pub avg_stimulus_7d: f64,
    pub avg_stimulus_30d: f64,

    pub goals: Vec<FitnessGoal>,
    /// Placeholder until weights are learned; serialized with stable key order
    pub goal_weights: BTreeMap<FitnessGoal, f64>,

    pub problems: Vec<ProblemFeature>,
    pub active_problem_count: usize,
    pub high_priority_problem_count: usize,

    pub workout_count_7d: usize,
    pub workout_count_30d: usize,
    pub last_workout_type: Option<WorkoutType>,
    /// `None` when there is no workout history
    pub hours_since_last_workout: Option<f64>,

    /// Sunday = 0
    pub day_of_week: u8,
    pub hour_of_day: u8,

    pub preferred_splits: Vec<SplitType>,
    pub available_equipment: Vec<String>,
    pub favorite_exercise_count: usize,
    pub avoid_exercise_count: usize,
}

/// Project the scoring snapshot into a [`FeatureVector`].
///
/// `workouts` must be sorted by date descending, the same ordering the
/// engine uses everywhere else.
pub fn extract_features(
    checkin: Option<&DailyCheckin>,
    workouts: &[&Workout],
    recoveries: &[MuscleRecoveryStatus],
    coverage: &[MuscleCoverage],
    profile: Option<&UserFitnessProfile>,
    day_of_week: u8,
    now: DateTime<Utc>,
) -> FeatureVector {
    let window_7d = now - Duration::days(7);
    let window_30d = now - Duration::days(30);

    let workout_count_7d = workouts.iter().filter(|w| w.date >= window_7d).count();
    let workout_count_30d = workouts.iter().filter(|w| w.date >= window_30d).count();

    let last_workout = workouts.first();
    let hours_since_last_workout = last_workout
        .map(|w| (now - w.date).num_seconds() as f64 / 3600.0);

    let avg_soreness = checkin
        .and_then(|c| c.soreness.as_ref())
        .and_then(|s| s.average());

    let undertrained_muscle_count = coverage.iter().filter(|c| c.is_undertrained).count();
    let (avg_stimulus_7d, avg_stimulus_30d) = if coverage.is_empty() {
        (0.0, 0.0)
    } else {
        let n = coverage.len() as f64;
        (
            coverage.iter().map(|c| c.stimulus_7d).sum::<f64>() / n,
            coverage.iter().map(|c| c.stimulus_30d).sum::<f64>() / n,
        )
    };

    let active_problems: Vec<&crate::models::Problem> = profile
        .map(|p| p.active_problems())
        .unwrap_or_default();
    let high_priority_problem_count =
        active_problems.iter().filter(|p| p.priority >= 4).count();

    FeatureVector {
        muscle_recoveries: recoveries
            .iter()
            .map(|r| RecoveryFeature {
                muscle_id: r.muscle_id.clone(),
                hours_since_stimulus: r.hours_since_stimulus,
                is_recovered: r.is_recovered,
                soreness_level: r.soreness_level,
                can_train: r.can_train,
            })
            .collect(),
        checkin: CheckinFeatures {
            hours_slept: checkin.and_then(|c| c.hours_slept),
            sleep_quality: checkin.and_then(|c| c.sleep_quality),
            energy_level: checkin.and_then(|c| c.energy_level),
            avg_soreness,
            time_available: checkin.and_then(|c| c.time_available),
        },
        muscle_coverage: coverage.to_vec(),
        undertrained_muscle_count,
        avg_stimulus_7d,
        avg_stimulus_30d,
        goals: profile.map(|p| p.goals.clone()).unwrap_or_default(),
        goal_weights: BTreeMap::new(),
        problems: active_problems
            .iter()
            .map(|p| ProblemFeature {
                kind: p.kind,
                priority: p.priority,
                affected_muscle_count: p.affected_muscles.len(),
            })
            .collect(),
        active_problem_count: active_problems.len(),
        high_priority_problem_count,
        workout_count_7d,
        workout_count_30d,
        last_workout_type: last_workout.map(|w| w.workout_type),
        hours_since_last_workout,
        day_of_week,
        hour_of_day: now.hour() as u8,
        preferred_splits: profile.map(|p| p.preferred_splits.clone()).unwrap_or_default(),
        available_equipment: profile
            .map(|p| p.available_equipment.clone())
            .unwrap_or_default(),
        favorite_exercise_count: profile
            .map(|p| p.favorite_exercise_ids.len())
            .unwrap_or(0),
        avoid_exercise_count: profile.map(|p| p.avoid_exercise_ids.len()).unwrap_or(0),
    }
}

/// Model output contract. All scores live in [0, 1] unless noted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Predictions {
    /// Per-muscle personalized recovery windows, in hours
    pub personal_recovery_hours: BTreeMap<String, f64>,
    /// Per-exercise effectiveness scores
    pub exercise_effectiveness: BTreeMap<String, f64>,
    pub recommended_workout_type: Option<WorkoutType>,
    pub optimal_sets: Option<u8>,
    pub optimal_reps: Option<u8>,
}

/// Interface every future learned model implements
pub trait Model {
    fn name(&self) -> &str;
    fn version(&self) -> &str;
    fn predict(&self, features: &FeatureVector) -> Predictions;
}

/// Holds registered models, owned and injected by the caller.
#[derive(Default)]
pub struct ModelRegistry {
    models: HashMap<String, Box<dyn Model>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model under its own name, replacing any previous entry
    pub fn register(&mut self, model: Box<dyn Model>) {
        self.models.insert(model.name().to_string(), model);
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn Model> {
        self.models.get(name).map(|m| m.as_ref())
    }

    pub fn all(&self) -> impl Iterator<Item = &dyn Model> {
        self.models.values().map(|m| m.as_ref())
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
