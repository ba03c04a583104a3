//! Multi-window training coverage analysis
//!
//! Aggregates training stimulus per muscle over rolling 7-day and 30-day
//! windows, flags undertrained muscles, and computes a fill-gap priority
//! used by the exercise scorer.
//!
//! A muscle counts as undertrained when its trailing 30-day stimulus falls
//! below half the cross-muscle average, or when it has received no stimulus
//! at all in the last 7 days.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{Exercise, Muscle, Problem, Workout};
use crate::recovery::workout_muscle_stimulus;

/// Hours in the short coverage window
const WINDOW_7D_HOURS: f64 = 7.0 * 24.0;
/// Hours in the long coverage window
const WINDOW_30D_HOURS: f64 = 30.0 * 24.0;
/// Silence beyond this many hours boosts priority further
const LONG_SILENCE_HOURS: f64 = 14.0 * 24.0;

/// Computed, ephemeral coverage state for one muscle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuscleCoverage {
    pub muscle_id: String,
    pub muscle_name: String,

    /// Most recent nonzero-stimulus instant; `None` if never trained
    pub last_stimulus: Option<DateTime<Utc>>,

    /// Hours since last stimulus; `None` if never trained
    pub hours_since_stimulus: Option<f64>,

    /// Total stimulus over the trailing 7 days
    pub stimulus_7d: f64,

    /// Total stimulus over the trailing 30 days
    pub stimulus_30d: f64,

    pub is_undertrained: bool,

    /// Target volume (150% of the undertrained threshold)
    pub recommended_stimulus: f64,

    /// Deficit vs. the recommended stimulus, floored at zero
    pub gap: f64,

    /// 0-1, higher = more important to train soon
    pub priority: f64,
}

/// Sum stimulus per muscle over a trailing window ending at `now`.
///
/// A workout dated before `now - hours_window` is excluded entirely.
pub fn stimulus_in_window(
    workouts: &[Workout],
    catalog: &HashMap<&str, &Exercise>,
    hours_window: f64,
    now: DateTime<Utc>,
) -> HashMap<String, f64> {
    let cutoff = now - Duration::seconds((hours_window * 3600.0) as i64);
    let mut totals: HashMap<String, f64> = HashMap::new();

    for workout in workouts {
        if workout.date < cutoff {
            continue;
        }
        for (muscle_id, volume) in workout_muscle_stimulus(workout, catalog) {
            *totals.entry(muscle_id).or_insert(0.0) += volume;
        }
    }

    totals
}

/// Analyze coverage for every muscle, sorted by descending priority.
///
/// # Algorithm
///
/// - threshold = 0.5 x mean 30-day stimulus across muscles with any
///   in-window stimulus (zero when no muscle has been stimulated, in which
///   case only the 7-day-silence rule can flag a muscle)
/// - priority starts at 0.5: +0.3 undertrained, +0.2 silent for >= 14 days,
///   -0.3 stimulated within the last 48 hours, clamped to [0, 1]
pub fn analyze_coverage(
    workouts: &[Workout],
    all_muscles: &[Muscle],
    catalog: &HashMap<&str, &Exercise>,
    last_stimulus: &HashMap<String, DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Vec<MuscleCoverage> {
    let stimulus_7d = stimulus_in_window(workouts, catalog, WINDOW_7D_HOURS, now);
    let stimulus_30d = stimulus_in_window(workouts, catalog, WINDOW_30D_HOURS, now);

    let avg_30d = stimulus_30d.values().sum::<f64>() / stimulus_30d.len().max(1) as f64;
    let threshold = avg_30d * 0.5;
    let recommended = threshold * 1.5;

    let mut coverage: Vec<MuscleCoverage> = all_muscles
        .iter()
        .map(|muscle| {
            let last = last_stimulus.get(&muscle.id).copied();
            let hours_since = last.map(|l| (now - l).num_seconds() as f64 / 3600.0);

            let stim_7 = stimulus_7d.get(&muscle.id).copied().unwrap_or(0.0);
            let stim_30 = stimulus_30d.get(&muscle.id).copied().unwrap_or(0.0);

            // Never trained counts as silent for both rules below
            let silent_7d = hours_since.map_or(true, |h| h > WINDOW_7D_HOURS);
            let silent_14d = hours_since.map_or(true, |h| h >= LONG_SILENCE_HOURS);
            let recent_48h = hours_since.map_or(false, |h| h < 48.0);

            let is_undertrained = stim_30 < threshold || silent_7d;

            let mut priority: f64 = 0.5;
            if is_undertrained {
                priority += 0.3;
            }
            if silent_14d {
                priority += 0.2;
            }
            if recent_48h {
                priority -= 0.3;
            }
            priority = priority.clamp(0.0, 1.0);

            MuscleCoverage {
                muscle_id: muscle.id.clone(),
                muscle_name: muscle.name.clone(),
                last_stimulus: last,
                hours_since_stimulus: hours_since,
                stimulus_7d: stim_7,
                stimulus_30d: stim_30,
                is_undertrained,
                recommended_stimulus: recommended,
                gap: (recommended - stim_30).max(0.0),
                priority,
            }
        })
        .collect();

    // Stable sort keeps catalog order among equal priorities
    coverage.sort_by(|a, b| {
        b.priority
            .partial_cmp(&a.priority)
            .unwrap_or(Ordering::Equal)
    });
    coverage
}

/// Muscles worth surfacing: undertrained, problem-affected, or high priority
pub fn muscles_needing_attention<'a>(
    coverage: &'a [MuscleCoverage],
    problems: &[&Problem],
) -> Vec<&'a MuscleCoverage> {
    let problem_muscles: Vec<String> = problems
        .iter()
        .flat_map(|p| p.affected_muscles.iter())
        .map(|name| name.to_lowercase())
        .collect();

    coverage
        .iter()
        .filter(|muscle| {
            muscle.is_undertrained
                || problem_muscles.contains(&muscle.muscle_name.to_lowercase())
                || muscle.priority > 0.7
        })
        .collect()
}
