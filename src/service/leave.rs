//! Leave request lifecycle: filing, approval and rejection.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use crate::clock::{Clock, ClockExt};
use crate::errors::{HrmError, Result};
use crate::model::leave_request::{
    LeaveDecision, LeaveRequest, LeaveStatus, LeaveType, NewLeaveRequest,
};
use crate::service::attendance::propagate_leave;
use crate::store::{RecordStore, UnitOfWork};
use crate::utils::calendar;

#[derive(Debug, Clone)]
pub struct LeaveApplication {
    pub employee_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub leave_type: LeaveType,
}

pub struct LeaveService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: RecordStore> LeaveService<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Files a new PENDING request. The balance is checked but not charged.
    #[instrument(skip(self, application), fields(employee_id = application.employee_id))]
    pub async fn apply_leave(&self, application: LeaveApplication) -> Result<LeaveRequest> {
        let mut tx = self.store.begin().await?;

        let employee = tx
            .get_employee(application.employee_id)
            .await?
            .filter(|e| e.is_active)
            .ok_or_else(|| HrmError::not_found("Employee", application.employee_id))?;

        let (start, end) = (application.start_date, application.end_date);
        if start > end {
            return Err(HrmError::InvalidRange {
                start,
                end,
                reason: "Start date cannot be after end date",
            });
        }
        if start < self.clock.today() {
            return Err(HrmError::InvalidRange {
                start,
                end,
                reason: "Cannot apply for leave in the past",
            });
        }

        let requested = calendar::inclusive_days(start, end);
        if let Err(e) = employee.ensure_leave_available(requested) {
            warn!(error = %e, "Leave application refused");
            return Err(e);
        }

        let leave = tx
            .insert_leave(NewLeaveRequest {
                employee_id: employee.id,
                start_date: start,
                end_date: end,
                reason: application.reason,
                leave_type: application.leave_type,
                status: LeaveStatus::Pending,
                applied_at: self.clock.now(),
            })
            .await?;
        tx.commit().await?;

        info!(leave_id = leave.id, days = requested, "Leave request submitted");
        Ok(leave)
    }

    /// Moves a PENDING request to APPROVED or REJECTED.
    ///
    /// Approval charges the balance and writes the attendance days in the same
    /// unit of work, so a failure anywhere leaves no trace of either.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        leave_id: u64,
        decision: LeaveDecision,
    ) -> Result<LeaveRequest> {
        let mut tx = self.store.begin().await?;

        let mut leave = tx
            .lock_leave(leave_id)
            .await?
            .ok_or_else(|| HrmError::not_found("Leave request", leave_id))?;

        if !leave.is_pending() {
            return Err(HrmError::InvalidState {
                leave_id,
                status: leave.status,
            });
        }

        if decision == LeaveDecision::Approved {
            let mut employee = tx
                .lock_employee(leave.employee_id)
                .await?
                .ok_or_else(|| HrmError::not_found("Employee", leave.employee_id))?;

            // balance may have moved since the request was filed
            employee.debit_leave(leave.day_count())?;
            tx.save_employee(&employee).await?;

            let written = propagate_leave(&mut tx, &leave)
                .await
                .map_err(|source| HrmError::AttendanceSync {
                    leave_id,
                    source: Box::new(source),
                })?;
            info!(
                leave_id,
                days_written = written,
                balance = employee.leave_balance,
                "Leave charged"
            );
        }

        leave.status = decision.into();
        tx.save_leave(&leave).await?;
        tx.commit().await?;

        info!(leave_id, status = %leave.status, "Leave request processed");
        Ok(leave)
    }

    pub async fn get_leave(&self, leave_id: u64) -> Result<LeaveRequest> {
        let mut tx = self.store.begin().await?;
        tx.get_leave(leave_id)
            .await?
            .ok_or_else(|| HrmError::not_found("Leave request", leave_id))
    }

    /// An employee's own requests, newest start date first.
    pub async fn list_for_employee(&self, employee_id: u64) -> Result<Vec<LeaveRequest>> {
        let mut tx = self.store.begin().await?;
        tx.list_leaves(Some(employee_id), None).await
    }

    pub async fn list(&self, status: Option<LeaveStatus>) -> Result<Vec<LeaveRequest>> {
        let mut tx = self.store.begin().await?;
        tx.list_leaves(None, status).await
    }
}
