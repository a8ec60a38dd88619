//! Clinic departments and their duty rosters.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::doctor::DoctorSummary;

/// A clinic department as listed by `/departments/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub introduction: String,
    #[serde(default)]
    pub doctors: Vec<DoctorSummary>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Department {
    pub fn doctor_count(&self) -> usize {
        self.doctors.len()
    }
}

/// Fields accepted when creating or updating a department.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepartmentInput {
    pub name: String,
    pub introduction: String,
}

/// One day of a department's two-week duty roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DutySchedule {
    pub id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub doctors: Vec<DoctorSummary>,
}

impl DutySchedule {
    /// "08:00-17:00" style display of the shift.
    pub fn hours_display(&self) -> String {
        format!(
            "{}-{}",
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }
}
