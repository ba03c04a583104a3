//! Daily workout-type selection
//!
//! A small state machine evaluated fresh each day. The decision ladder, first
//! match wins:
//!
//! 1. Any active problem with priority >= 4 forces a `pt` day.
//! 2. Check-in rest triggers: max soreness >= 4, under 5 hours of sleep, or
//!    low energy combined with sleep quality <= 2.
//! 3. A `pt` goal or any active problem alternates PT days on even days of
//!    the week.
//! 4. A push/pull/legs split rotates through the PPL sub-machine; any other
//!    split preference defaults to `push`.

use tracing::debug;

use crate::models::{DailyCheckin, Problem, SplitType, UserFitnessProfile, WorkoutType};
use crate::recovery::MuscleRecoveryStatus;

const PUSH_MUSCLES: &[&str] = &["chest", "shoulders", "triceps"];
const PULL_MUSCLES: &[&str] = &["back", "lats", "biceps", "rear delts"];
const LEG_MUSCLES: &[&str] = &["quads", "hamstrings", "glutes", "calves"];

fn group_ready(recoveries: &[MuscleRecoveryStatus], group: &[&str]) -> bool {
    recoveries.iter().any(|r| {
        let name = r.muscle_name.to_lowercase();
        group.iter().any(|g| name.contains(g)) && r.can_train && r.is_recovered
    })
}

/// Push/pull/legs rotation keyed on the previous workout type.
///
/// From `push` prefer `pull` then `legs`; from `pull` prefer `legs` then
/// `push`; from `legs` prefer `push` then `pull`. A group counts as ready
/// when any of its muscles is both trainable and recovered. If nothing is
/// ready the rotation yields `rest`.
fn ppl_rotation(
    previous_type: Option<WorkoutType>,
    recoveries: &[MuscleRecoveryStatus],
) -> WorkoutType {
    let Some(previous) = previous_type else {
        return WorkoutType::Push;
    };

    let push_ready = || group_ready(recoveries, PUSH_MUSCLES);
    let pull_ready = || group_ready(recoveries, PULL_MUSCLES);
    let legs_ready = || group_ready(recoveries, LEG_MUSCLES);

    match previous {
        WorkoutType::Push => {
            if pull_ready() {
                WorkoutType::Pull
            } else if legs_ready() {
                WorkoutType::Legs
            } else {
                WorkoutType::Rest
            }
        }
        WorkoutType::Pull => {
            if legs_ready() {
                WorkoutType::Legs
            } else if push_ready() {
                WorkoutType::Push
            } else {
                WorkoutType::Rest
            }
        }
        WorkoutType::Legs => {
            if push_ready() {
                WorkoutType::Push
            } else if pull_ready() {
                WorkoutType::Pull
            } else {
                WorkoutType::Rest
            }
        }
        // Coming off a pt or rest day, start the cycle over
        WorkoutType::Pt | WorkoutType::Rest => WorkoutType::Push,
    }
}

/// Choose today's workout type.
///
/// `day_of_week` is a 0-based index with Sunday = 0. `previous_type` is the
/// type of the most recent workout, if any.
pub fn select_workout_type(
    day_of_week: u8,
    checkin: Option<&DailyCheckin>,
    recoveries: &[MuscleRecoveryStatus],
    profile: Option<&UserFitnessProfile>,
    previous_type: Option<WorkoutType>,
) -> WorkoutType {
    let active_problems: Vec<&Problem> = profile
        .map(|p| p.active_problems())
        .unwrap_or_default();

    // 1. High-priority problems take over the day
    if active_problems.iter().any(|p| p.priority >= 4) {
        debug!("high-priority problem active, selecting pt day");
        return WorkoutType::Pt;
    }

    // 2. Rest triggers from today's check-in
    if let Some(checkin) = checkin {
        if let Some(soreness) = &checkin.soreness {
            if soreness.max_level().map_or(false, |max| max >= 4) {
                debug!("max soreness >= 4, selecting rest day");
                return WorkoutType::Rest;
            }
        }

        if checkin.hours_slept.map_or(false, |h| h < 5.0) {
            debug!("under 5 hours of sleep, selecting rest day");
            return WorkoutType::Rest;
        }

        let low_energy = checkin.energy_level == Some(crate::models::EnergyLevel::Low);
        let poor_sleep_quality = checkin.sleep_quality.map_or(false, |q| q <= 2);
        if low_energy && poor_sleep_quality {
            debug!("low energy with poor sleep quality, selecting rest day");
            return WorkoutType::Rest;
        }
    }

    // 3. PT goals or any active problem alternate PT days
    let has_pt_goal = profile.map_or(false, |p| p.goals.contains(&crate::models::FitnessGoal::Pt));
    if (has_pt_goal || !active_problems.is_empty()) && day_of_week % 2 == 0 {
        return WorkoutType::Pt;
    }

    // 4. Split-based rotation; an absent profile rotates PPL by default
    let use_ppl = profile.map_or(true, |p| p.preferred_splits.contains(&SplitType::PushPullLegs));
    if use_ppl {
        return ppl_rotation(previous_type, recoveries);
    }

    WorkoutType::Push
}
