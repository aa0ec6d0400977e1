use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Department {
    pub id: u64,
    pub name: String,
    pub work_start_hour: Option<u8>,
    pub work_start_minute: Option<u8>,
    pub work_end_hour: Option<u8>,
    pub work_end_minute: Option<u8>,
}

/// Late and early-departure cutoffs for a department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkSchedule {
    #[schema(example = "09:00:00", value_type = String)]
    pub start: NaiveTime,
    #[schema(example = "17:00:00", value_type = String)]
    pub end: NaiveTime,
}

impl WorkSchedule {
    /// Fallback start/end hour pair used when a department has none.
    pub fn office_hours() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl Department {
    /// Department-configured cutoffs, falling back per field to `default`.
    ///
    /// A configured hour without a minute means `HH:00`.
    pub fn schedule(&self, default: WorkSchedule) -> WorkSchedule {
        let start = self
            .work_start_hour
            .and_then(|h| {
                NaiveTime::from_hms_opt(h as u32, self.work_start_minute.unwrap_or(0) as u32, 0)
            })
            .unwrap_or(default.start);
        let end = self
            .work_end_hour
            .and_then(|h| {
                NaiveTime::from_hms_opt(h as u32, self.work_end_minute.unwrap_or(0) as u32, 0)
            })
            .unwrap_or(default.end);

        WorkSchedule { start, end }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn department(start: Option<(u8, u8)>, end: Option<(u8, u8)>) -> Department {
        Department {
            id: 1,
            name: "Computer Science".to_string(),
            work_start_hour: start.map(|s| s.0),
            work_start_minute: start.map(|s| s.1),
            work_end_hour: end.map(|e| e.0),
            work_end_minute: end.map(|e| e.1),
        }
    }

    #[test]
    fn unset_hours_fall_back_to_default() {
        let schedule = department(None, None).schedule(WorkSchedule::office_hours());
        assert_eq!(schedule, WorkSchedule::office_hours());
    }

    #[test]
    fn configured_hours_override_default() {
        let schedule =
            department(Some((8, 30)), Some((16, 45))).schedule(WorkSchedule::office_hours());

        assert_eq!(schedule.start, NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert_eq!(schedule.end, NaiveTime::from_hms_opt(16, 45, 0).unwrap());
    }

    #[test]
    fn out_of_range_hour_is_ignored() {
        let schedule = department(Some((25, 0)), None).schedule(WorkSchedule::office_hours());
        assert_eq!(schedule.start, WorkSchedule::office_hours().start);
    }
}
