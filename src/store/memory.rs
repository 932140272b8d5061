//! Process-local record store.
//!
//! A unit of work holds the store mutex for its whole lifetime and edits a
//! private copy of the tables; `commit` swaps the copy in. Units therefore run
//! one at a time and an abandoned unit leaves no trace.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::errors::{HrmError, Result};
use crate::model::{
    attendance::{Attendance, NewAttendance},
    employee::Employee,
    leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest},
    payroll::{NewPayroll, Payroll},
};
use crate::store::{RecordStore, UnitOfWork};

#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub employees: BTreeMap<u64, Employee>,
    pub leaves: BTreeMap<u64, LeaveRequest>,
    pub attendance: BTreeMap<u64, Attendance>,
    pub payroll: BTreeMap<u64, Payroll>,
    next_id: u64,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn attendance_for(&self, employee_id: u64, date: NaiveDate) -> Option<&Attendance> {
        self.attendance
            .values()
            .find(|a| a.employee_id == employee_id && a.date == date)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    fail_attendance_writes: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an employee outside of any unit of work.
    pub async fn put_employee(&self, employee: Employee) {
        let mut tables = self.tables.lock().await;
        tables.next_id = tables.next_id.max(employee.id);
        tables.employees.insert(employee.id, employee);
    }

    /// Adds or replaces a leave request outside of any unit of work.
    pub async fn put_leave(&self, leave: LeaveRequest) {
        let mut tables = self.tables.lock().await;
        tables.next_id = tables.next_id.max(leave.id);
        tables.leaves.insert(leave.id, leave);
    }

    /// Adds or replaces an attendance row outside of any unit of work.
    pub async fn put_attendance(&self, attendance: Attendance) {
        let mut tables = self.tables.lock().await;
        tables.next_id = tables.next_id.max(attendance.id);
        tables.attendance.insert(attendance.id, attendance);
    }

    /// Copy of the committed tables.
    pub async fn snapshot(&self) -> Tables {
        self.tables.lock().await.clone()
    }

    /// Makes every later attendance write fail with a storage error.
    pub fn fail_attendance_writes(&self, fail: bool) {
        self.fail_attendance_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<InMemoryTx> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryTx {
            guard,
            working,
            fail_attendance_writes: self.fail_attendance_writes.load(Ordering::SeqCst),
        })
    }
}

pub struct InMemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    fail_attendance_writes: bool,
}

impl InMemoryTx {
    fn check_attendance_write(&self) -> Result<()> {
        if self.fail_attendance_writes {
            return Err(HrmError::Storage("attendance table is unavailable".to_string()));
        }
        Ok(())
    }
}

fn missing(entity: &'static str, id: u64) -> HrmError {
    HrmError::Storage(format!("{entity} {id} does not exist"))
}

#[async_trait]
impl UnitOfWork for InMemoryTx {
    async fn get_employee(&mut self, id: u64) -> Result<Option<Employee>> {
        Ok(self.working.employees.get(&id).cloned())
    }

    async fn lock_employee(&mut self, id: u64) -> Result<Option<Employee>> {
        self.get_employee(id).await
    }

    async fn list_employees(&mut self) -> Result<Vec<Employee>> {
        Ok(self.working.employees.values().cloned().collect())
    }

    async fn save_employee(&mut self, employee: &Employee) -> Result<()> {
        let slot = self
            .working
            .employees
            .get_mut(&employee.id)
            .ok_or_else(|| missing("employee", employee.id))?;
        *slot = employee.clone();
        Ok(())
    }

    async fn get_leave(&mut self, id: u64) -> Result<Option<LeaveRequest>> {
        Ok(self.working.leaves.get(&id).cloned())
    }

    async fn lock_leave(&mut self, id: u64) -> Result<Option<LeaveRequest>> {
        self.get_leave(id).await
    }

    async fn insert_leave(&mut self, leave: NewLeaveRequest) -> Result<LeaveRequest> {
        let leave = leave.with_id(self.working.next_id());
        self.working.leaves.insert(leave.id, leave.clone());
        Ok(leave)
    }

    async fn save_leave(&mut self, leave: &LeaveRequest) -> Result<()> {
        let slot = self
            .working
            .leaves
            .get_mut(&leave.id)
            .ok_or_else(|| missing("leave request", leave.id))?;
        *slot = leave.clone();
        Ok(())
    }

    async fn list_leaves(
        &mut self,
        employee_id: Option<u64>,
        status: Option<LeaveStatus>,
    ) -> Result<Vec<LeaveRequest>> {
        let mut leaves: Vec<_> = self
            .working
            .leaves
            .values()
            .filter(|l| employee_id.is_none_or(|id| l.employee_id == id))
            .filter(|l| status.is_none_or(|s| l.status == s))
            .cloned()
            .collect();
        leaves.sort_by(|a, b| (b.start_date, b.id).cmp(&(a.start_date, a.id)));
        Ok(leaves)
    }

    async fn find_attendance(
        &mut self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<Attendance>> {
        Ok(self.working.attendance_for(employee_id, date).cloned())
    }

    async fn lock_attendance(&mut self, id: u64) -> Result<Option<Attendance>> {
        Ok(self.working.attendance.get(&id).cloned())
    }

    async fn insert_attendance(&mut self, attendance: NewAttendance) -> Result<Attendance> {
        self.check_attendance_write()?;
        if self
            .working
            .attendance_for(attendance.employee_id, attendance.date)
            .is_some()
        {
            return Err(HrmError::Storage(format!(
                "duplicate attendance for employee {} on {}",
                attendance.employee_id, attendance.date
            )));
        }
        let row = attendance.with_id(self.working.next_id());
        self.working.attendance.insert(row.id, row.clone());
        Ok(row)
    }

    async fn insert_attendance_if_absent(&mut self, attendance: NewAttendance) -> Result<bool> {
        self.check_attendance_write()?;
        if self
            .working
            .attendance_for(attendance.employee_id, attendance.date)
            .is_some()
        {
            return Ok(false);
        }
        let row = attendance.with_id(self.working.next_id());
        self.working.attendance.insert(row.id, row);
        Ok(true)
    }

    async fn save_attendance(&mut self, attendance: &Attendance) -> Result<()> {
        self.check_attendance_write()?;
        let slot = self
            .working
            .attendance
            .get_mut(&attendance.id)
            .ok_or_else(|| missing("attendance", attendance.id))?;
        *slot = attendance.clone();
        Ok(())
    }

    async fn list_attendance_between(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Attendance>> {
        let mut rows: Vec<_> = self
            .working
            .attendance
            .values()
            .filter(|a| a.date >= start && a.date <= end)
            .cloned()
            .collect();
        rows.sort_by_key(|a| (a.date, a.employee_id));
        Ok(rows)
    }

    async fn list_attendance_by_employee_range(
        &mut self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Attendance>> {
        let mut rows: Vec<_> = self
            .working
            .attendance
            .values()
            .filter(|a| a.employee_id == employee_id && a.date >= start && a.date <= end)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.date);
        Ok(rows)
    }

    async fn finalize_attendance_between(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u64> {
        self.check_attendance_write()?;
        let mut count = 0;
        for row in self
            .working
            .attendance
            .values_mut()
            .filter(|a| a.date >= start && a.date <= end)
        {
            row.finalized = true;
            count += 1;
        }
        Ok(count)
    }

    async fn any_finalized_between(&mut self, start: NaiveDate, end: NaiveDate) -> Result<bool> {
        Ok(self
            .working
            .attendance
            .values()
            .any(|a| a.finalized && a.date >= start && a.date <= end))
    }

    async fn exists_payroll(
        &mut self,
        employee_id: Option<u64>,
        year: i32,
        month: u32,
    ) -> Result<bool> {
        Ok(self.working.payroll.values().any(|p| {
            p.year == year && p.month == month && employee_id.is_none_or(|id| p.employee_id == id)
        }))
    }

    async fn get_payroll(&mut self, id: u64) -> Result<Option<Payroll>> {
        Ok(self.working.payroll.get(&id).cloned())
    }

    async fn lock_payroll(&mut self, id: u64) -> Result<Option<Payroll>> {
        self.get_payroll(id).await
    }

    async fn insert_payroll(&mut self, payroll: NewPayroll) -> Result<Payroll> {
        if self.exists_payroll(Some(payroll.employee_id), payroll.year, payroll.month).await? {
            return Err(HrmError::AlreadyExists {
                year: payroll.year,
                month: payroll.month,
            });
        }
        let row = payroll.with_id(self.working.next_id());
        self.working.payroll.insert(row.id, row.clone());
        Ok(row)
    }

    async fn save_payroll(&mut self, payroll: &Payroll) -> Result<()> {
        let slot = self
            .working
            .payroll
            .get_mut(&payroll.id)
            .ok_or_else(|| missing("payroll", payroll.id))?;
        *slot = payroll.clone();
        Ok(())
    }

    async fn list_payroll(&mut self, year: i32, month: u32) -> Result<Vec<Payroll>> {
        Ok(self
            .working
            .payroll
            .values()
            .filter(|p| p.year == year && p.month == month)
            .cloned()
            .collect())
    }

    async fn lock_payroll_month(&mut self, year: i32, month: u32) -> Result<Vec<Payroll>> {
        self.list_payroll(year, month).await
    }

    async fn commit(mut self) -> Result<()> {
        *self.guard = std::mem::take(&mut self.working);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::payroll::PayrollStatus;
    use crate::test_utils::date;
    use rust_decimal_macros::dec;

    fn april_row(employee_id: u64) -> NewPayroll {
        NewPayroll {
            employee_id,
            month: 4,
            year: 2026,
            base_salary: dec!(3000),
            payable_days: 30,
            deduction_amount: dec!(0),
            net_salary: dec!(3000),
            generated_at: date(2026, 5, 1).and_hms_opt(9, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn second_payroll_for_employee_month_already_exists() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_payroll(april_row(1)).await.unwrap();

        let err = tx.insert_payroll(april_row(1)).await.unwrap_err();

        assert!(matches!(err, HrmError::AlreadyExists { year: 2026, month: 4 }));
        assert!(tx.insert_payroll(april_row(2)).await.is_ok());
    }

    #[tokio::test]
    async fn payroll_month_lock_sees_committed_rows_only() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_payroll(april_row(1)).await.unwrap();
        drop(tx);

        let mut tx = store.begin().await.unwrap();
        assert!(tx.lock_payroll_month(2026, 4).await.unwrap().is_empty());
        let row = tx.insert_payroll(april_row(1)).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let locked = tx.lock_payroll_month(2026, 4).await.unwrap();
        assert_eq!(locked, vec![row]);
        assert_eq!(locked[0].status, PayrollStatus::Generated);
    }

    #[tokio::test]
    async fn ties_on_start_date_list_newest_id_first() {
        let store = InMemoryStore::new();
        let day = date(2026, 6, 1);
        for id in 1..=3 {
            store
                .put_leave(crate::test_utils::leave(
                    id,
                    1,
                    day,
                    day,
                    crate::model::leave_request::LeaveType::SickLeave,
                ))
                .await;
        }

        let mut tx = store.begin().await.unwrap();
        let ids: Vec<_> = tx
            .list_leaves(Some(1), None)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .collect();

        assert_eq!(ids, vec![3, 2, 1]);
    }
}
