//! Muscle recovery modeling
//!
//! Converts "time since last stimulus" plus self-reported soreness into a
//! per-muscle recovery status that drives exercise scoring and workout type
//! selection.
//!
//! # Sports Science Background
//!
//! Skeletal muscle needs time to repair after training stimulus, and the
//! window scales with muscle size:
//!
//! - **Small muscles** (forearms, biceps, triceps, calves): ~24-36 hours
//! - **Medium muscles** (shoulders, traps, abs): ~24-60 hours
//! - **Large muscles** (chest, back, quads, hamstrings, glutes): ~72-96 hours
//!
//! Self-reported soreness overrides the elapsed-time model: a muscle that is
//! still severely sore is not trainable no matter how much time has passed.
//! The reverse is not true - absence of soreness does not shorten the window.
//!
//! All computations here are pure functions over a snapshot of workout
//! history already reduced to "last stimulus instant per muscle"
//! (see [`last_stimulus_per_muscle`]).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::models::{Exercise, Muscle, SorenessMap, Workout};

/// Recommended training intensity for a muscle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Normal,
    High,
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intensity::Low => write!(f, "low"),
            Intensity::Normal => write!(f, "normal"),
            Intensity::High => write!(f, "high"),
        }
    }
}

/// Expected recovery window in hours for a muscle, keyed by name.
///
/// Unknown muscles (compound names like "Lower Back" included) fall back to
/// 48 hours.
pub fn recovery_hours(muscle_name: &str) -> f64 {
    match muscle_name.to_lowercase().as_str() {
        // Small muscle groups
        "forearms" => 24.0,
        "biceps" | "triceps" | "calves" => 36.0,

        // Medium muscle groups
        "shoulders" => 60.0,
        "traps" => 48.0,
        "abs" => 24.0,

        // Large muscle groups
        "chest" | "back" | "lats" => 72.0,
        "quads" | "hamstrings" | "glutes" => 84.0,

        _ => 48.0,
    }
}

/// Computed, ephemeral recovery state for one muscle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuscleRecoveryStatus {
    pub muscle_id: String,
    pub muscle_name: String,

    /// Most recent instant this muscle received nonzero stimulus
    pub last_stimulus: Option<DateTime<Utc>>,

    /// Hours elapsed since last stimulus; `None` if never trained
    pub hours_since_stimulus: Option<f64>,

    /// When the recovery window closes; `None` if never trained
    pub recovered_at: Option<DateTime<Utc>>,

    /// True once the full recovery window has elapsed (or never trained)
    pub is_recovered: bool,

    /// Soreness from today's check-in, if reported for this muscle
    pub soreness_level: Option<u8>,

    /// Whether the muscle can be trained today at all
    pub can_train: bool,

    pub recommended_intensity: Intensity,
}

/// Compute the recovery status for a muscle at instant `now`.
///
/// # Algorithm
///
/// 1. Soreness overrides: level >= 4 vetoes training outright; level 3 caps
///    intensity at low; level 2 trains at normal intensity.
/// 2. Elapsed-time progress (`hours_since / recovery_hours`) inside the
///    recovery window: < 0.5 vetoes training, 0.5-0.75 caps intensity at low.
/// 3. `is_recovered` when never trained or the full window has elapsed.
///
/// A soreness veto is never undone by elapsed time, and a muscle with no
/// history is always recovered.
pub fn recovery_status(
    muscle: &Muscle,
    last_stimulus: Option<DateTime<Utc>>,
    soreness: Option<&SorenessMap>,
    now: DateTime<Utc>,
) -> MuscleRecoveryStatus {
    let window_hours = recovery_hours(&muscle.name);
    let hours_since =
        last_stimulus.map(|last| (now - last).num_seconds() as f64 / 3600.0);

    let soreness_level = soreness.and_then(|map| map.level(&muscle.name));

    let recovered_at =
        last_stimulus.map(|last| last + Duration::seconds((window_hours * 3600.0) as i64));

    let mut can_train = true;
    let mut recommended_intensity = Intensity::Normal;

    match soreness_level {
        Some(level) if level >= 4 => {
            // Severe soreness vetoes training regardless of elapsed time
            can_train = false;
        }
        Some(3) => {
            recommended_intensity = Intensity::Low;
        }
        _ => {}
    }

    if let Some(hours) = hours_since {
        if hours < window_hours {
            let progress = hours / window_hours;
            if progress < 0.5 {
                can_train = false;
            } else if progress < 0.75 {
                recommended_intensity = Intensity::Low;
            }
        }
    }

    let is_recovered = match hours_since {
        None => true,
        Some(hours) => hours >= window_hours,
    };

    MuscleRecoveryStatus {
        muscle_id: muscle.id.clone(),
        muscle_name: muscle.name.clone(),
        last_stimulus,
        hours_since_stimulus: hours_since,
        recovered_at,
        is_recovered,
        soreness_level,
        can_train,
        recommended_intensity,
    }
}

/// Build an id -> exercise lookup over the catalog
pub fn index_catalog(catalog: &[Exercise]) -> HashMap<&str, &Exercise> {
    catalog.iter().map(|ex| (ex.id.as_str(), ex)).collect()
}

/// Every muscle referenced by the catalog, deduplicated in first-seen order
pub fn catalog_muscles(catalog: &[Exercise]) -> Vec<Muscle> {
    let mut muscles = Vec::new();
    let mut seen = HashSet::new();
    for exercise in catalog {
        for target in &exercise.muscle_targets {
            if seen.insert(target.muscle.id.as_str()) {
                muscles.push(target.muscle.clone());
            }
        }
    }
    muscles
}

/// Per-muscle stimulus contributed by a single workout.
///
/// Stimulus of one set for one muscle = load x reps x muscle-target weight.
/// Sets whose exercise id is missing from the catalog contribute nothing.
pub fn workout_muscle_stimulus(
    workout: &Workout,
    catalog: &HashMap<&str, &Exercise>,
) -> HashMap<String, f64> {
    let mut stimulus: HashMap<String, f64> = HashMap::new();

    for set in &workout.sets {
        let Some(exercise) = catalog.get(set.exercise_id.as_str()) else {
            continue;
        };

        for target in &exercise.muscle_targets {
            let volume = set.weight * set.reps as f64 * target.weight;
            *stimulus.entry(target.muscle.id.clone()).or_insert(0.0) += volume;
        }
    }

    stimulus
}

/// Reduce full workout history to the most recent nonzero-stimulus instant
/// per muscle.
///
/// Scans every historical workout with no recency cutoff; truncating to the
/// last N workouts would silently skew recovery estimates for rarely-trained
/// muscles.
pub fn last_stimulus_per_muscle(
    workouts: &[Workout],
    catalog: &HashMap<&str, &Exercise>,
) -> HashMap<String, DateTime<Utc>> {
    let mut last_stimulus: HashMap<String, DateTime<Utc>> = HashMap::new();

    for workout in workouts {
        let stimulus = workout_muscle_stimulus(workout, catalog);

        for (muscle_id, volume) in stimulus {
            if volume <= 0.0 {
                continue;
            }
            last_stimulus
                .entry(muscle_id)
                .and_modify(|date| {
                    if workout.date > *date {
                        *date = workout.date;
                    }
                })
                .or_insert(workout.date);
        }
    }

    last_stimulus
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExerciseCategory, MuscleGroup, MuscleTarget, WorkoutSet, WorkoutType};

    fn muscle(id: &str, name: &str) -> Muscle {
        Muscle {
            id: id.to_string(),
            name: name.to_string(),
            group: MuscleGroup::classify(name).unwrap_or(MuscleGroup::Core),
        }
    }

    fn exercise(id: &str, targets: Vec<(&str, &str, f64)>) -> Exercise {
        Exercise {
            id: id.to_string(),
            name: id.to_string(),
            category: ExerciseCategory::Push,
            equipment: None,
            instructions: None,
            muscle_targets: targets
                .into_iter()
                .map(|(mid, mname, weight)| MuscleTarget {
                    muscle: muscle(mid, mname),
                    weight,
                })
                .collect(),
        }
    }

    fn workout_at(date: DateTime<Utc>, sets: Vec<WorkoutSet>) -> Workout {
        Workout {
            id: format!("w_{}", date.timestamp()),
            user_id: "u1".to_string(),
            date,
            workout_type: WorkoutType::Push,
            sets,
            duration_minutes: 45,
            notes: None,
        }
    }

    fn set(exercise_id: &str, weight: f64, reps: u32) -> WorkoutSet {
        WorkoutSet {
            exercise_id: exercise_id.to_string(),
            set_number: 1,
            weight,
            reps,
            effort: None,
            rest_seconds: None,
        }
    }

    #[test]
    fn test_recovery_hours_table() {
        assert_eq!(recovery_hours("Biceps"), 36.0);
        assert_eq!(recovery_hours("forearms"), 24.0);
        assert_eq!(recovery_hours("Shoulders"), 60.0);
        assert_eq!(recovery_hours("Chest"), 72.0);
        assert_eq!(recovery_hours("Quads"), 84.0);
        // Compound names fall back to the default
        assert_eq!(recovery_hours("Lower Back"), 48.0);
        assert_eq!(recovery_hours("unknown"), 48.0);
    }

    #[test]
    fn test_never_trained_is_recovered() {
        let now = Utc::now();
        let status = recovery_status(&muscle("m1", "Chest"), None, None, now);

        assert!(status.is_recovered);
        assert!(status.can_train);
        assert_eq!(status.hours_since_stimulus, None);
        assert_eq!(status.recovered_at, None);
        assert_eq!(status.recommended_intensity, Intensity::Normal);
    }

    #[test]
    fn test_severe_soreness_vetoes_training() {
        let now = Utc::now();
        let mut soreness = SorenessMap::new();
        soreness.set("Chest", 4);

        // Fully recovered by elapsed time, yet the veto holds
        let last = now - Duration::hours(200);
        let status = recovery_status(&muscle("m1", "Chest"), Some(last), Some(&soreness), now);

        assert!(status.is_recovered);
        assert!(!status.can_train);
        assert_eq!(status.soreness_level, Some(4));
    }

    #[test]
    fn test_moderate_soreness_caps_intensity() {
        let now = Utc::now();
        let mut soreness = SorenessMap::new();
        soreness.set("Chest", 3);

        let last = now - Duration::hours(200);
        let status = recovery_status(&muscle("m1", "Chest"), Some(last), Some(&soreness), now);

        assert!(status.can_train);
        assert_eq!(status.recommended_intensity, Intensity::Low);
    }

    #[test]
    fn test_mild_soreness_trains_normal() {
        let now = Utc::now();
        let mut soreness = SorenessMap::new();
        soreness.set("Chest", 2);

        let last = now - Duration::hours(200);
        let status = recovery_status(&muscle("m1", "Chest"), Some(last), Some(&soreness), now);

        assert!(status.can_train);
        assert_eq!(status.recommended_intensity, Intensity::Normal);
    }

    #[test]
    fn test_recovery_progress_bands() {
        let now = Utc::now();
        let chest = muscle("m1", "Chest"); // 72h window

        // < 50% recovered: cannot train
        let status = recovery_status(&chest, Some(now - Duration::hours(24)), None, now);
        assert!(!status.can_train);
        assert!(!status.is_recovered);

        // 50-75% recovered: low intensity
        let status = recovery_status(&chest, Some(now - Duration::hours(48)), None, now);
        assert!(status.can_train);
        assert!(!status.is_recovered);
        assert_eq!(status.recommended_intensity, Intensity::Low);

        // >= 75% but inside the window: trainable at normal
        let status = recovery_status(&chest, Some(now - Duration::hours(60)), None, now);
        assert!(status.can_train);
        assert!(!status.is_recovered);
        assert_eq!(status.recommended_intensity, Intensity::Normal);

        // Window elapsed: fully recovered
        let status = recovery_status(&chest, Some(now - Duration::hours(72)), None, now);
        assert!(status.can_train);
        assert!(status.is_recovered);
    }

    #[test]
    fn test_is_recovered_monotonic_in_elapsed_time() {
        let now = Utc::now();
        let chest = muscle("m1", "Chest");
        let last = now - Duration::hours(10);

        let mut was_recovered = false;
        for hours_later in 0..200 {
            let at = now + Duration::hours(hours_later);
            let status = recovery_status(&chest, Some(last), None, at);
            // Never flips true -> false as time passes
            assert!(
                !was_recovered || status.is_recovered,
                "is_recovered regressed at +{}h",
                hours_later
            );
            was_recovered = status.is_recovered;
        }
        assert!(was_recovered);
    }

    #[test]
    fn test_catalog_muscles_dedup_first_seen_order() {
        let catalog = vec![
            exercise(
                "bench",
                vec![("m_chest", "Chest", 0.7), ("m_tri", "Triceps", 0.3)],
            ),
            exercise(
                "dip",
                vec![("m_tri", "Triceps", 0.6), ("m_chest", "Chest", 0.4)],
            ),
            exercise("curl", vec![("m_bi", "Biceps", 1.0)]),
        ];

        let muscles = catalog_muscles(&catalog);
        let ids: Vec<&str> = muscles.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m_chest", "m_tri", "m_bi"]);
    }

    #[test]
    fn test_workout_muscle_stimulus() {
        let catalog = vec![exercise(
            "bench",
            vec![("m_chest", "Chest", 0.7), ("m_tri", "Triceps", 0.3)],
        )];
        let index = index_catalog(&catalog);

        let workout = workout_at(Utc::now(), vec![set("bench", 100.0, 10), set("bench", 80.0, 8)]);
        let stimulus = workout_muscle_stimulus(&workout, &index);

        // 100*10*0.7 + 80*8*0.3 per muscle weight
        assert!((stimulus["m_chest"] - (700.0 + 448.0)).abs() < 1e-9);
        assert!((stimulus["m_tri"] - (300.0 + 192.0)).abs() < 1e-9);
    }

    #[test]
    fn test_stimulus_skips_unknown_exercises() {
        let catalog = vec![exercise("bench", vec![("m_chest", "Chest", 1.0)])];
        let index = index_catalog(&catalog);

        let workout = workout_at(Utc::now(), vec![set("ghost", 100.0, 10)]);
        let stimulus = workout_muscle_stimulus(&workout, &index);
        assert!(stimulus.is_empty());
    }

    #[test]
    fn test_last_stimulus_keeps_most_recent_date() {
        let catalog = vec![exercise("bench", vec![("m_chest", "Chest", 1.0)])];
        let index = index_catalog(&catalog);

        let now = Utc::now();
        let old = workout_at(now - Duration::days(30), vec![set("bench", 100.0, 10)]);
        let recent = workout_at(now - Duration::days(2), vec![set("bench", 60.0, 10)]);

        // Order should not matter
        let last = last_stimulus_per_muscle(&[recent.clone(), old.clone()], &index);
        assert_eq!(last["m_chest"], recent.date);

        let last = last_stimulus_per_muscle(&[old.clone(), recent.clone()], &index);
        assert_eq!(last["m_chest"], recent.date);
    }

    #[test]
    fn test_last_stimulus_ignores_zero_volume() {
        let catalog = vec![exercise("bench", vec![("m_chest", "Chest", 1.0)])];
        let index = index_catalog(&catalog);

        // Zero load and zero reps produce no stimulus
        let workout = workout_at(Utc::now(), vec![set("bench", 0.0, 10)]);
        let last = last_stimulus_per_muscle(&[workout], &index);
        assert!(last.is_empty());
    }
}
