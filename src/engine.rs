//! Recommendation assembly
//!
//! Orchestrates the full pipeline: reduce workout history to last-stimulus
//! instants, compute recovery and coverage, pick a workout type, score the
//! candidate pool, and assemble the final plan with reasoning strings, a
//! confidence score, and a feature vector for future model training.
//!
//! Everything downstream of the input snapshot is pure: the engine never
//! mutates workouts, check-ins, or the catalog, and an injected `now` makes
//! repeated runs reproducible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

use crate::coverage::{self, MuscleCoverage};
use crate::features::{self, FeatureVector};
use crate::models::{
    DailyCheckin, EnergyLevel, Exercise, ExerciseCategory, Feedback, Problem, TimeAvailable,
    UserFitnessProfile, Workout, WorkoutType,
};
use crate::problems;
use crate::recovery::{self, MuscleRecoveryStatus};
use crate::scoring::{self, ScoreParams, DEFAULT_PREFERENCE_WEIGHT, DEFAULT_PROBLEM_WEIGHT};
use crate::selector;

/// Default session length in minutes when the profile has no schedule
pub const DEFAULT_SESSION_MINUTES: u32 = 45;

/// How many coverage rows the output carries for display
const COVERAGE_DISPLAY_LIMIT: usize = 10;

/// Session length from today's constraints, for callers that plan ad hoc
/// sessions rather than using the configured schedule.
pub fn workout_duration(
    time_available: Option<TimeAvailable>,
    energy_level: Option<EnergyLevel>,
) -> u32 {
    let base: f32 = match time_available {
        Some(TimeAvailable::Short) => 30.0,
        Some(TimeAvailable::Long) => 60.0,
        Some(TimeAvailable::Normal) | None => 45.0,
    };

    let adjusted = match energy_level {
        Some(EnergyLevel::Low) => (base * 0.7).max(20.0),
        Some(EnergyLevel::High) => (base * 1.2).min(90.0),
        _ => base,
    };

    adjusted.round() as u32
}

/// Number of exercises for a session, assuming ~10 minutes each
pub fn exercise_count(duration_minutes: u32) -> usize {
    ((duration_minutes as f64 / 10.0).round() as usize).clamp(3, 8)
}

/// Suggested sets and reps from today's energy and time.
///
/// Base is 3x10. Energy adjusts first (low 2x8, high 4x12), then time
/// (short -1 set floor 2 and -2 reps floor 8, long +1 set and +2 reps).
pub fn suggested_volume(
    energy_level: Option<EnergyLevel>,
    time_available: Option<TimeAvailable>,
) -> (u8, u8) {
    let (mut sets, mut reps) = match energy_level {
        Some(EnergyLevel::Low) => (2u8, 8u8),
        Some(EnergyLevel::High) => (4, 12),
        _ => (3, 10),
    };

    match time_available {
        Some(TimeAvailable::Short) => {
            sets = sets.saturating_sub(1).max(2);
            reps = reps.saturating_sub(2).max(8);
        }
        Some(TimeAvailable::Long) => {
            sets += 1;
            reps += 2;
        }
        _ => {}
    }

    (sets, reps)
}

/// Immutable snapshot the engine computes from
#[derive(Debug, Clone, Copy)]
pub struct EngineInput<'a> {
    pub checkin: Option<&'a DailyCheckin>,
    /// Full workout history, any order
    pub workouts: &'a [Workout],
    pub catalog: &'a [Exercise],
    pub profile: Option<&'a UserFitnessProfile>,
    /// Sunday = 0
    pub day_of_week: u8,
    pub now: DateTime<Utc>,
}

/// One exercise in the assembled plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedExercise {
    pub exercise_id: String,
    pub exercise_name: String,
    pub category: ExerciseCategory,
    pub equipment: Option<String>,
    /// Assembled notes joined with "; "
    pub reasoning: String,
    /// The exercise's score, carried through for display and ranking
    pub priority: f64,
    pub suggested_sets: u8,
    pub suggested_reps: u8,
}

/// The full assembled plan for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationOutput {
    pub workout_type: WorkoutType,
    pub exercises: Vec<RecommendedExercise>,
    pub reasoning: Vec<String>,
    pub estimated_duration: u32,
    pub confidence: f64,
    /// Highest-priority coverage rows, truncated for display
    pub muscle_coverage: Vec<MuscleCoverage>,
    pub features: FeatureVector,
}

/// A persisted recommendation, one per user per date.
///
/// Created lazily on first plan view for a date; immutable afterwards
/// except for the user's feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: Uuid,
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub workout_type: WorkoutType,
    pub exercises: Vec<RecommendedExercise>,
    pub reasoning: Vec<String>,
    pub feedback: Option<Feedback>,
}

impl Recommendation {
    pub fn from_output(user_id: &str, date: DateTime<Utc>, output: &RecommendationOutput) -> Self {
        Recommendation {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            date,
            workout_type: output.workout_type,
            exercises: output.exercises.clone(),
            reasoning: output.reasoning.clone(),
            feedback: None,
        }
    }

    pub fn set_feedback(&mut self, feedback: Feedback) {
        self.feedback = Some(feedback);
    }
}

/// The rule-based recommendation engine
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    problem_weight: f64,
    preference_weight: f64,
    default_session_minutes: u32,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RecommendationEngine {
    pub fn new() -> Self {
        RecommendationEngine {
            problem_weight: DEFAULT_PROBLEM_WEIGHT,
            preference_weight: DEFAULT_PREFERENCE_WEIGHT,
            default_session_minutes: DEFAULT_SESSION_MINUTES,
        }
    }

    /// Engine with tuned scoring weights and no-schedule session length,
    /// typically sourced from the application config
    pub fn with_settings(
        problem_weight: f64,
        preference_weight: f64,
        default_session_minutes: u32,
    ) -> Self {
        RecommendationEngine {
            problem_weight,
            preference_weight,
            default_session_minutes,
        }
    }

    /// Run the full pipeline over one snapshot
    pub fn recommend(&self, input: &EngineInput<'_>) -> RecommendationOutput {
        let catalog_index = recovery::index_catalog(input.catalog);

        let all_muscles = recovery::catalog_muscles(input.catalog);

        // History reduction scans everything; the most recent N workouts
        // are not enough for rarely trained muscles
        let last_stimulus = recovery::last_stimulus_per_muscle(input.workouts, &catalog_index);

        let soreness = input.checkin.and_then(|c| c.soreness.as_ref());
        let recoveries: Vec<MuscleRecoveryStatus> = all_muscles
            .iter()
            .map(|muscle| {
                recovery::recovery_status(
                    muscle,
                    last_stimulus.get(&muscle.id).copied(),
                    soreness,
                    input.now,
                )
            })
            .collect();

        let muscle_coverage = coverage::analyze_coverage(
            input.workouts,
            &all_muscles,
            &catalog_index,
            &last_stimulus,
            input.now,
        );

        let active_problems: Vec<&Problem> = input
            .profile
            .map(|p| p.active_problems())
            .unwrap_or_default();
        let attention = coverage::muscles_needing_attention(&muscle_coverage, &active_problems);
        let attention_count = attention.len();

        // Most recent workout drives the split rotation
        let mut history: Vec<&Workout> = input.workouts.iter().collect();
        history.sort_by(|a, b| b.date.cmp(&a.date));
        let previous_type = history.first().map(|w| w.workout_type);

        let workout_type = selector::select_workout_type(
            input.day_of_week,
            input.checkin,
            &recoveries,
            input.profile,
            previous_type,
        );
        debug!(%workout_type, "selected workout type");

        let features = features::extract_features(
            input.checkin,
            &history,
            &recoveries,
            &muscle_coverage,
            input.profile,
            input.day_of_week,
            input.now,
        );

        let mut display_coverage = muscle_coverage.clone();
        display_coverage.truncate(COVERAGE_DISPLAY_LIMIT);

        if workout_type == WorkoutType::Rest {
            info!("rest day recommended");
            let detail = if input
                .checkin
                .and_then(|c| c.hours_slept)
                .map_or(false, |h| h < 5.0)
            {
                "Poor sleep quality (< 5 hours)"
            } else {
                "High soreness or low energy levels"
            };
            return RecommendationOutput {
                workout_type,
                exercises: vec![],
                reasoning: vec![
                    "Rest day recommended based on recovery status".to_string(),
                    detail.to_string(),
                ],
                estimated_duration: 0,
                confidence: 0.9,
                muscle_coverage: display_coverage,
                features,
            };
        }

        // Candidate pool: PT days lead with problem exercises, other days
        // filter the catalog by category
        let problem_exercises = if workout_type == WorkoutType::Pt && !active_problems.is_empty() {
            problems::all_problem_exercises(&active_problems, input.catalog)
        } else {
            vec![]
        };

        let candidates: Vec<&Exercise> = if !problem_exercises.is_empty() {
            let problem_ids: HashSet<&str> =
                problem_exercises.iter().map(|e| e.id.as_str()).collect();
            problem_exercises
                .iter()
                .copied()
                .chain(
                    input
                        .catalog
                        .iter()
                        .filter(|e| !problem_ids.contains(e.id.as_str())),
                )
                .collect()
        } else {
            input
                .catalog
                .iter()
                .filter(|e| workout_type.matches_category(e.category))
                .collect()
        };

        let recent_exercise_ids: Vec<String> = history
            .iter()
            .take(3)
            .flat_map(|w| w.sets.iter().map(|s| s.exercise_id.clone()))
            .collect();

        let empty_goal_weights = std::collections::HashMap::new();
        let empty_strings: Vec<String> = vec![];
        let params = ScoreParams {
            exclude_sore_muscles: true,
            recoveries: &recoveries,
            soreness,
            goals: input.profile.map(|p| p.goals.as_slice()).unwrap_or(&[]),
            goal_weights: &empty_goal_weights,
            problems: &active_problems,
            problem_weight: self.problem_weight,
            coverage: &muscle_coverage,
            target_undertrained_muscles: true,
            favorite_exercise_ids: input
                .profile
                .map(|p| p.favorite_exercise_ids.as_slice())
                .unwrap_or(&empty_strings),
            avoid_exercise_ids: input
                .profile
                .map(|p| p.avoid_exercise_ids.as_slice())
                .unwrap_or(&empty_strings),
            preference_weight: self.preference_weight,
            available_equipment: input
                .profile
                .map(|p| p.available_equipment.as_slice())
                .unwrap_or(&empty_strings),
            energy_level: input.checkin.and_then(|c| c.energy_level),
            time_available: input.checkin.and_then(|c| c.time_available),
            avoid_recent_exercises: true,
            recent_exercise_ids: &recent_exercise_ids,
            workout_type: Some(workout_type),
        };

        let scored = scoring::filter_and_score(&candidates, &params);

        let duration = input
            .profile
            .and_then(|p| p.schedule.as_ref())
            .map(|s| s.minutes_per_session)
            .unwrap_or(self.default_session_minutes);
        let target_count = exercise_count(duration);

        let (sets, reps) = suggested_volume(params.energy_level, params.time_available);

        let exercises: Vec<RecommendedExercise> = scored
            .iter()
            .take(target_count)
            .map(|entry| {
                let notes = self.exercise_notes(
                    entry.exercise,
                    &recoveries,
                    &active_problems,
                    &muscle_coverage,
                    input.profile,
                );
                RecommendedExercise {
                    exercise_id: entry.exercise.id.clone(),
                    exercise_name: entry.exercise.name.clone(),
                    category: entry.exercise.category,
                    equipment: entry.exercise.equipment.clone(),
                    reasoning: notes.join("; "),
                    priority: entry.score,
                    suggested_sets: sets,
                    suggested_reps: reps,
                }
            })
            .collect();

        let reasoning = self.overall_reasoning(
            workout_type,
            input.checkin,
            &recoveries,
            attention_count,
            active_problems.len(),
        );

        let mut confidence: f64 = 0.7;
        if exercises.len() >= target_count {
            confidence += 0.1;
        }
        if input.checkin.is_some() {
            confidence += 0.1;
        }
        if !input.workouts.is_empty() {
            confidence += 0.1;
        }
        if input.profile.is_some() {
            confidence += 0.1;
        }

        info!(
            %workout_type,
            exercises = exercises.len(),
            confidence,
            "recommendation assembled"
        );

        RecommendationOutput {
            workout_type,
            exercises,
            reasoning,
            estimated_duration: duration,
            confidence: confidence.min(1.0),
            muscle_coverage: display_coverage,
            features,
        }
    }

    /// Per-exercise notes; falls back to a generic line when nothing applies
    fn exercise_notes(
        &self,
        exercise: &Exercise,
        recoveries: &[MuscleRecoveryStatus],
        active_problems: &[&Problem],
        muscle_coverage: &[MuscleCoverage],
        profile: Option<&UserFitnessProfile>,
    ) -> Vec<String> {
        let mut notes = Vec::new();

        for target in &exercise.muscle_targets {
            let recovery = recoveries.iter().find(|r| r.muscle_id == target.muscle.id);
            let Some(recovery) = recovery else { continue };
            if !recovery.is_recovered {
                continue;
            }
            match recovery.hours_since_stimulus {
                None => notes.push(format!(
                    "{} hasn't been trained recently",
                    target.muscle.name
                )),
                Some(hours) if hours > 48.0 => notes.push(format!(
                    "{} recovered ({} days since last training)",
                    target.muscle.name,
                    (hours / 24.0).round() as i64
                )),
                Some(_) => {}
            }
        }

        for problem in active_problems {
            let addressed = problem.affected_muscles.iter().any(|m| {
                let m = m.to_lowercase();
                exercise
                    .muscle_targets
                    .iter()
                    .any(|t| t.muscle.name.to_lowercase().contains(&m))
            });
            if addressed {
                notes.push(format!("Addresses {}", problem.name));
            }
        }

        let gap = muscle_coverage.iter().find(|c| {
            exercise
                .muscle_targets
                .iter()
                .any(|t| t.muscle.id == c.muscle_id)
        });
        if let Some(coverage) = gap {
            if coverage.is_undertrained {
                notes.push(format!("Fills gap in {} training", coverage.muscle_name));
            }
        }

        if profile.map_or(false, |p| p.favorite_exercise_ids.contains(&exercise.id)) {
            notes.push("Your favorite exercise".to_string());
        }

        if notes.is_empty() {
            notes.push("Good exercise for today".to_string());
        }
        notes
    }

    /// Top-level reasoning: type sentence first, conditional sentences in a
    /// fixed order after it
    fn overall_reasoning(
        &self,
        workout_type: WorkoutType,
        checkin: Option<&DailyCheckin>,
        recoveries: &[MuscleRecoveryStatus],
        attention_count: usize,
        active_problem_count: usize,
    ) -> Vec<String> {
        let mut reasoning = vec![format!(
            "Recommended {} workout based on recovery status and goals",
            workout_type
        )];

        if let Some(energy) = checkin.and_then(|c| c.energy_level) {
            reasoning.push(format!("Energy level: {}", energy));
        }
        if let Some(hours) = checkin.and_then(|c| c.hours_slept) {
            // 0 reported hours is noise, not a data point worth echoing
            if hours > 0.0 {
                reasoning.push(format!("Slept {} hours", hours));
            }
        }

        let recovered = recoveries.iter().filter(|r| r.is_recovered).count();
        if recovered > 0 {
            reasoning.push(format!("{} muscle groups are recovered and ready", recovered));
        }
        if attention_count > 0 {
            reasoning.push(format!(
                "{} muscles need attention (gaps or problems)",
                attention_count
            ));
        }
        if active_problem_count > 0 {
            reasoning.push(format!(
                "Addressing {} active problem(s)",
                active_problem_count
            ));
        }

        reasoning
    }
}
