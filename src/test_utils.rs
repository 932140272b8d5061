//! Shared fixtures for the service tests.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::model::{
    attendance::{Attendance, AttendanceStatus},
    employee::Employee,
    leave_request::{LeaveRequest, LeaveStatus, LeaveType},
    role::Role,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Active regular staff member with no salary.
pub fn employee(id: u64, leave_balance: i32) -> Employee {
    Employee {
        id,
        name: format!("Employee {id}"),
        email: format!("employee{id}@example.com"),
        department: Some("Engineering".to_string()),
        role: Role::Employee,
        salary: None,
        leave_balance,
        is_active: true,
    }
}

pub fn employee_with_salary(id: u64, salary: Option<Decimal>) -> Employee {
    Employee {
        salary,
        ..employee(id, 20)
    }
}

/// Non-finalized row without a leave reference.
pub fn attendance_row(
    id: u64,
    employee_id: u64,
    date: NaiveDate,
    status: AttendanceStatus,
) -> Attendance {
    Attendance {
        id,
        employee_id,
        date,
        status,
        leave_request_id: None,
        remarks: None,
        finalized: false,
    }
}

/// Pending request filed at midnight on its start date.
pub fn leave(
    id: u64,
    employee_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    leave_type: LeaveType,
) -> LeaveRequest {
    LeaveRequest {
        id,
        employee_id,
        start_date,
        end_date,
        reason: None,
        leave_type,
        status: LeaveStatus::Pending,
        applied_at: start_date.and_time(chrono::NaiveTime::MIN),
    }
}
