//! Per-airplane landing reports collected at the end of a run.

use serde::Serialize;

/// Outcome of one airplane's simulation.
///
/// `chosen_runway` and `execution_time_secs` are scheduling-dependent: they
/// vary with processing order and controller access timing between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LandingReport {
    pub airplane_name: String,
    pub landed: bool,
    pub chosen_runway: Option<usize>,
    /// Wall time from the first landing request to touchdown, in whole
    /// seconds; absent when the airplane never landed.
    pub execution_time_secs: Option<u64>,
    pub start_offset_secs: u64,
}

impl LandingReport {
    /// Report for an airplane that never landed (terminated early or its
    /// task failed).
    pub fn not_landed(airplane_name: &str, start_offset_secs: u64) -> Self {
        Self {
            airplane_name: airplane_name.to_string(),
            landed: false,
            chosen_runway: None,
            execution_time_secs: None,
            start_offset_secs,
        }
    }
}
