//! Individual schedule entries and the weekly default rules.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::doctor::DoctorSummary;
use crate::utils::weekday;

/// A single schedule entry from `/schedules/{id}/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    #[serde(default)]
    pub department: Option<i64>,
    pub date: NaiveDate,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub doctors: Vec<DoctorSummary>,
}

/// Partial update sent with `PUT /schedules/{id}/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctors: Option<Vec<i64>>,
}

/// Weekly rule: which weekdays a department is staffed.
/// `dates` is a comma-separated list in the backend's Monday-first numbering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultScheduleRule {
    #[serde(default)]
    pub id: Option<i64>,
    pub department: i64,
    #[serde(default)]
    pub dates: String,
}

impl DefaultScheduleRule {
    pub fn new(department: i64, days: &[u8]) -> Self {
        Self {
            id: None,
            department,
            dates: weekday::join_days(days),
        }
    }

    /// Backend weekday numbers (0 = Monday).
    pub fn days(&self) -> Vec<u8> {
        weekday::parse_days(&self.dates)
    }

    /// Sunday-first work-day mask for display.
    pub fn work_day_mask(&self) -> [u8; 7] {
        weekday::to_work_day_mask(&self.days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_days() {
        let rule: DefaultScheduleRule =
            serde_json::from_str(r#"{"id":7,"department":2,"dates":"0,4,6"}"#).unwrap();
        assert_eq!(rule.days(), vec![0, 4, 6]);
        // Monday, Friday, Sunday in a Sunday-first mask
        assert_eq!(rule.work_day_mask(), [1, 1, 0, 0, 0, 1, 0]);
    }

    #[test]
    fn test_new_rule_serializes_dates() {
        let rule = DefaultScheduleRule::new(3, &[6, 0, 1]);
        assert_eq!(rule.dates, "6,0,1");
    }

    #[test]
    fn test_schedule_update_skips_unset_fields() {
        let update = ScheduleUpdate {
            doctors: Some(vec![1, 2]),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"doctors": [1, 2]})
        );
    }
}
