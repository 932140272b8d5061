use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::utils::calendar;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[derive(EnumString, AsRefStr, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveType {
    CasualLeave,
    SickLeave,
    EarnedLeave,
    UnpaidLeave,
}

impl LeaveType {
    /// Whether a day of this leave counts toward payable days.
    pub fn is_paid(&self) -> bool {
        !matches!(self, LeaveType::UnpaidLeave)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[derive(EnumString, AsRefStr, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

/// The two terminal outcomes an HR action may apply to a pending request.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveDecision {
    Approved,
    Rejected,
}

impl From<LeaveDecision> for LeaveStatus {
    fn from(decision: LeaveDecision) -> Self {
        match decision {
            LeaveDecision::Approved => LeaveStatus::Approved,
            LeaveDecision::Rejected => LeaveStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2026-01-01")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03")]
    pub end_date: NaiveDate,
    #[schema(example = "Family event", nullable = true)]
    pub reason: Option<String>,
    pub leave_type: LeaveType,
    pub status: LeaveStatus,
    #[schema(example = "2025-12-20T09:30:00")]
    pub applied_at: NaiveDateTime,
}

impl LeaveRequest {
    /// Inclusive number of calendar days covered by the request.
    pub fn day_count(&self) -> i64 {
        calendar::inclusive_days(self.start_date, self.end_date)
    }

    pub fn is_pending(&self) -> bool {
        self.status == LeaveStatus::Pending
    }
}

/// A request as filed, before the store assigns it an id.
#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub leave_type: LeaveType,
    pub status: LeaveStatus,
    pub applied_at: NaiveDateTime,
}

impl NewLeaveRequest {
    pub fn with_id(self, id: u64) -> LeaveRequest {
        LeaveRequest {
            id,
            employee_id: self.employee_id,
            start_date: self.start_date,
            end_date: self.end_date,
            reason: self.reason,
            leave_type: self.leave_type,
            status: self.status,
            applied_at: self.applied_at,
        }
    }
}
