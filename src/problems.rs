//! Problem-to-exercise matching
//!
//! Maps active injury/condition records to the catalog exercises that
//! address them. A problem with explicit recommended exercise ids matches by
//! id membership only; otherwise matching is by case-insensitive substring
//! containment, in either direction, between the problem's affected-muscle
//! tokens and each exercise's target-muscle names.
//!
//! The substring match is deliberately broad ("back" matches both "Lower
//! Back" and "Upper Back"); narrowing it would silently change which
//! exercises get recommended.

use std::collections::HashSet;

use crate::models::{Exercise, Problem};

/// Whether two muscle names refer to each other by substring containment
fn names_overlap(affected: &str, muscle_name: &str) -> bool {
    muscle_name.contains(affected) || affected.contains(muscle_name)
}

/// Catalog exercises that address a single problem
pub fn exercises_for_problem<'a>(
    problem: &Problem,
    catalog: &'a [Exercise],
) -> Vec<&'a Exercise> {
    if !problem.recommended_exercise_ids.is_empty() {
        return catalog
            .iter()
            .filter(|ex| problem.recommended_exercise_ids.contains(&ex.id))
            .collect();
    }

    let affected: Vec<String> = problem
        .affected_muscles
        .iter()
        .map(|name| name.to_lowercase())
        .collect();

    catalog
        .iter()
        .filter(|exercise| {
            exercise.muscle_targets.iter().any(|target| {
                let muscle_name = target.muscle.name.to_lowercase();
                affected.iter().any(|a| names_overlap(a, &muscle_name))
            })
        })
        .collect()
}

/// Union of matches across all active problems, deduplicated in catalog order
pub fn all_problem_exercises<'a>(
    problems: &[&Problem],
    catalog: &'a [Exercise],
) -> Vec<&'a Exercise> {
    let mut matched_ids: HashSet<&str> = HashSet::new();

    for problem in problems.iter().filter(|p| p.is_active) {
        for exercise in exercises_for_problem(problem, catalog) {
            matched_ids.insert(exercise.id.as_str());
        }
    }

    catalog
        .iter()
        .filter(|ex| matched_ids.contains(ex.id.as_str()))
        .collect()
}
