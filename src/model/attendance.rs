use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[derive(EnumString, AsRefStr, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Absent,
    HalfDay,
    Leave,
}

pub const AUTO_GENERATED_REMARK: &str = "Auto-generated";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Attendance {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2026-01-01")]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    /// Leave request that put this day on LEAVE. Not an owning link.
    #[schema(example = 12, nullable = true)]
    pub leave_request_id: Option<u64>,
    #[schema(example = "Auto-generated", nullable = true)]
    pub remarks: Option<String>,
    pub finalized: bool,
}

/// Attendance row not yet persisted.
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub leave_request_id: Option<u64>,
    pub remarks: Option<String>,
}

impl NewAttendance {
    pub fn auto_generated(employee_id: u64, date: NaiveDate) -> Self {
        Self {
            employee_id,
            date,
            status: AttendanceStatus::Absent,
            leave_request_id: None,
            remarks: Some(AUTO_GENERATED_REMARK.to_string()),
        }
    }

    pub fn with_id(self, id: u64) -> Attendance {
        Attendance {
            id,
            employee_id: self.employee_id,
            date: self.date,
            status: self.status,
            leave_request_id: self.leave_request_id,
            remarks: self.remarks,
            finalized: false,
        }
    }
}
