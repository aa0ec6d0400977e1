use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::AttendanceStatus;
use crate::service::lifecycle::round2;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusBreakdown {
    pub status: AttendanceStatus,
    pub count: i64,
    /// Share of all records, in percent with 2 decimals.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub total_records: i64,
    pub by_status: Vec<StatusBreakdown>,
    pub average_hours: f64,
    pub pending_verification: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_streak: Option<u32>,
}

/// Raw aggregates as read from the database.
#[derive(Debug, Clone, Default)]
pub struct RawStats {
    pub status_counts: Vec<(AttendanceStatus, i64)>,
    pub average_hours: Option<f64>,
    pub pending_verification: i64,
}

pub fn summarize(raw: RawStats) -> AttendanceStats {
    let total: i64 = raw.status_counts.iter().map(|(_, n)| n).sum();

    let by_status = AttendanceStatus::ALL
        .iter()
        .map(|status| {
            let count: i64 = raw
                .status_counts
                .iter()
                .filter(|(s, _)| s == status)
                .map(|(_, n)| n)
                .sum();
            let percentage = if total > 0 {
                round2(count as f64 * 100.0 / total as f64)
            } else {
                0.0
            };
            StatusBreakdown {
                status: *status,
                count,
                percentage,
            }
        })
        .collect();

    AttendanceStats {
        total_records: total,
        by_status,
        average_hours: round2(raw.average_hours.unwrap_or(0.0)),
        pending_verification: raw.pending_verification,
        current_streak: None,
    }
}

/// Longest run of consecutive calendar days in `dates`.
///
/// Dates are sorted first; duplicates do not extend or break a run.
pub fn streak(dates: &[NaiveDate]) -> u32 {
    let mut sorted = dates.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut best = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for date in sorted {
        run = match previous {
            Some(prev) if (date - prev).num_days() == 1 => run + 1,
            _ => 1,
        };
        best = best.max(run);
        previous = Some(date);
    }

    best
}
