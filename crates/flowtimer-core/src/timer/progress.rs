//! Derived figures for rendering. Pure functions of the run position; none
//! of these touch engine state.

use super::definition::{Repetitions, TimerStep};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub step_index: usize,
    pub repetition: u32,
    pub remaining_secs: u32,
}

pub fn cycle_duration_secs(steps: &[TimerStep]) -> u64 {
    steps.iter().map(|s| u64::from(s.duration)).sum()
}

/// Seconds elapsed since the current cycle began.
pub fn elapsed_in_cycle(steps: &[TimerStep], pos: Position) -> u64 {
    let completed: u64 = steps
        .iter()
        .take(pos.step_index)
        .map(|s| u64::from(s.duration))
        .sum();
    let current = steps
        .get(pos.step_index)
        .map(|s| u64::from(s.duration.saturating_sub(pos.remaining_secs)))
        .unwrap_or(0);
    completed + current
}

/// Seconds elapsed since the run began, across repetitions.
pub fn total_elapsed(steps: &[TimerStep], pos: Position) -> u64 {
    let completed_cycles = u64::from(pos.repetition.saturating_sub(1));
    completed_cycles * cycle_duration_secs(steps) + elapsed_in_cycle(steps, pos)
}

/// Normalized progress in `[0, 1]`.
///
/// Finite runs progress monotonically over the whole run. Infinite runs
/// restart at zero every cycle.
pub fn progress_ratio(steps: &[TimerStep], repetitions: Repetitions, pos: Position) -> f64 {
    let cycle = cycle_duration_secs(steps);
    if cycle == 0 {
        return 0.0;
    }
    let elapsed = total_elapsed(steps, pos);
    match repetitions {
        Repetitions::Infinite => (elapsed % cycle) as f64 / cycle as f64,
        Repetitions::Count(0) => 0.0,
        Repetitions::Count(n) => {
            let total = cycle * u64::from(n);
            (elapsed as f64 / total as f64).min(1.0)
        }
    }
}

/// Seconds left in the whole run, `None` for infinite repetition.
pub fn remaining_in_run(steps: &[TimerStep], repetitions: Repetitions, pos: Position) -> Option<u64> {
    match repetitions {
        Repetitions::Infinite => None,
        Repetitions::Count(n) => {
            let total = cycle_duration_secs(steps) * u64::from(n);
            Some(total.saturating_sub(total_elapsed(steps, pos)))
        }
    }
}
