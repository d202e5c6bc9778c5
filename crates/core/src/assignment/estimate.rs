//! Advisory queue timing.
//!
//! Every job ahead on the printer is assumed to take exactly the estimated
//! duration of the new job. This is a heuristic for display, not a schedule.

use chrono::{DateTime, Duration, Utc};

use super::AssignmentError;
use crate::config::AssignmentConfig;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Turn a caller supplied estimate into a duration.
///
/// Missing or non-positive estimates fall back to the configured default.
/// Non-finite values or values above the configured maximum are rejected.
pub fn estimated_duration(
    hours: Option<f64>,
    config: &AssignmentConfig,
) -> Result<Duration, AssignmentError> {
    let hours = match hours {
        Some(h) if h.is_nan() || h.is_infinite() => {
            return Err(AssignmentError::InvalidEstimatedTime(format!(
                "{} is not a number of hours",
                h
            )));
        }
        Some(h) if h > 0.0 => h,
        _ => config.default_estimate_hours,
    };

    if hours > config.max_estimate_hours {
        return Err(AssignmentError::InvalidEstimatedTime(format!(
            "{} hours exceeds the maximum of {}",
            hours, config.max_estimate_hours
        )));
    }

    Ok(Duration::milliseconds((hours * MILLIS_PER_HOUR).round() as i64))
}

/// Estimated start and completion for a job entering a printer queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEstimate {
    pub start: DateTime<Utc>,
    pub completion: DateTime<Utc>,
}

impl QueueEstimate {
    pub fn compute(assigned_at: DateTime<Utc>, queue_position: u32, duration: Duration) -> Self {
        let wait = duration
            .checked_mul(i32::try_from(queue_position).unwrap_or(i32::MAX))
            .unwrap_or(Duration::MAX);
        let start = assigned_at
            .checked_add_signed(wait)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let completion = start
            .checked_add_signed(duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { start, completion }
    }
}
