//! Attendance reconciliation and the month finalization gate.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::errors::{HrmError, Result};
use crate::model::attendance::{Attendance, AttendanceStatus, NewAttendance};
use crate::model::leave_request::LeaveRequest;
use crate::store::{RecordStore, UnitOfWork};
use crate::utils::calendar;

pub struct AttendanceService<S> {
    store: Arc<S>,
}

impl<S: RecordStore> AttendanceService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Creates an ABSENT row for every active regular staff member and every day
    /// of the month, skipping (employee, date) pairs that already have a row.
    /// Returns the number of rows created.
    #[instrument(skip(self))]
    pub async fn initialize_month(&self, year: i32, month: u32) -> Result<u64> {
        let (first, last) = calendar::month_bounds(year, month)?;
        let mut tx = self.store.begin().await?;

        let staff: Vec<_> = tx
            .list_employees()
            .await?
            .into_iter()
            .filter(|e| e.is_active && e.role.is_regular_staff())
            .collect();

        let mut created = 0;
        for date in calendar::dates_inclusive(first, last) {
            for employee in &staff {
                if tx
                    .insert_attendance_if_absent(NewAttendance::auto_generated(employee.id, date))
                    .await?
                {
                    created += 1;
                }
            }
        }

        tx.commit().await?;
        info!(year, month, staff = staff.len(), created, "Attendance initialized");
        Ok(created)
    }

    /// Manual edit of one row. Refused once the row is finalized.
    #[instrument(skip(self, remarks))]
    pub async fn update_one(
        &self,
        attendance_id: u64,
        status: AttendanceStatus,
        remarks: Option<String>,
    ) -> Result<Attendance> {
        let mut tx = self.store.begin().await?;
        let mut attendance = tx
            .lock_attendance(attendance_id)
            .await?
            .ok_or_else(|| HrmError::not_found("Attendance record", attendance_id))?;

        if attendance.finalized {
            return Err(HrmError::AlreadyFinalized { attendance_id });
        }

        attendance.status = status;
        attendance.remarks = remarks;
        tx.save_attendance(&attendance).await?;
        tx.commit().await?;

        info!(attendance_id, status = %status, "Attendance updated");
        Ok(attendance)
    }

    /// Locks every attendance row of the month. A month with no rows is a no-op.
    #[instrument(skip(self))]
    pub async fn finalize_month(&self, year: i32, month: u32) -> Result<u64> {
        let (first, last) = calendar::month_bounds(year, month)?;
        let mut tx = self.store.begin().await?;
        let finalized = tx.finalize_attendance_between(first, last).await?;
        tx.commit().await?;

        info!(year, month, finalized, "Attendance finalized");
        Ok(finalized)
    }

    /// True when at least one row of the month is finalized.
    pub async fn is_month_finalized(&self, year: i32, month: u32) -> Result<bool> {
        let mut tx = self.store.begin().await?;
        is_month_finalized(&mut tx, year, month).await
    }

    pub async fn list_month(&self, year: i32, month: u32) -> Result<Vec<Attendance>> {
        let (first, last) = calendar::month_bounds(year, month)?;
        let mut tx = self.store.begin().await?;
        tx.list_attendance_between(first, last).await
    }
}

pub(crate) async fn is_month_finalized<U: UnitOfWork>(
    tx: &mut U,
    year: i32,
    month: u32,
) -> Result<bool> {
    let (first, last) = calendar::month_bounds(year, month)?;
    tx.any_finalized_between(first, last).await
}

/// Marks every day of an approved leave as LEAVE inside the caller's unit of
/// work. Finalized days are left untouched. Returns the number of days written.
pub(crate) async fn propagate_leave<U: UnitOfWork>(
    tx: &mut U,
    leave: &LeaveRequest,
) -> Result<u32> {
    let remarks = format!("Leave Approved: {}", leave.leave_type);
    let mut written = 0;

    for date in calendar::dates_inclusive(leave.start_date, leave.end_date) {
        match tx.find_attendance(leave.employee_id, date).await? {
            Some(existing) if existing.finalized => {
                debug!(leave_id = leave.id, %date, "Skipping finalized attendance");
            }
            Some(mut existing) => {
                existing.status = AttendanceStatus::Leave;
                existing.leave_request_id = Some(leave.id);
                existing.remarks = Some(remarks.clone());
                tx.save_attendance(&existing).await?;
                written += 1;
            }
            None => {
                tx.insert_attendance(NewAttendance {
                    employee_id: leave.employee_id,
                    date,
                    status: AttendanceStatus::Leave,
                    leave_request_id: Some(leave.id),
                    remarks: Some(remarks.clone()),
                })
                .await?;
                written += 1;
            }
        }
    }

    Ok(written)
}
