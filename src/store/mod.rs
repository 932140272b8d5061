//! Record-store abstraction consumed by the services.
//!
//! A core operation opens one [`UnitOfWork`] with [`RecordStore::begin`],
//! performs every read and write through it and calls [`UnitOfWork::commit`]
//! once at the end. Dropping a unit without committing discards its writes.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::Result;
use crate::model::{
    attendance::{Attendance, NewAttendance},
    employee::Employee,
    leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest},
    payroll::{NewPayroll, Payroll},
};

pub mod memory;
pub mod mysql;

pub use memory::InMemoryStore;
pub use mysql::MySqlStore;

#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    type Tx: UnitOfWork;

    async fn begin(&self) -> Result<Self::Tx>;
}

#[async_trait]
pub trait UnitOfWork: Send {
    // employees
    async fn get_employee(&mut self, id: u64) -> Result<Option<Employee>>;
    /// Like `get_employee`, holding the row until the unit ends.
    async fn lock_employee(&mut self, id: u64) -> Result<Option<Employee>>;
    async fn list_employees(&mut self) -> Result<Vec<Employee>>;
    async fn save_employee(&mut self, employee: &Employee) -> Result<()>;

    // leave requests
    async fn get_leave(&mut self, id: u64) -> Result<Option<LeaveRequest>>;
    async fn lock_leave(&mut self, id: u64) -> Result<Option<LeaveRequest>>;
    async fn insert_leave(&mut self, leave: NewLeaveRequest) -> Result<LeaveRequest>;
    async fn save_leave(&mut self, leave: &LeaveRequest) -> Result<()>;
    /// Ordered by start date, newest first.
    async fn list_leaves(
        &mut self,
        employee_id: Option<u64>,
        status: Option<LeaveStatus>,
    ) -> Result<Vec<LeaveRequest>>;

    // attendance
    async fn find_attendance(
        &mut self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<Attendance>>;
    async fn lock_attendance(&mut self, id: u64) -> Result<Option<Attendance>>;
    async fn insert_attendance(&mut self, attendance: NewAttendance) -> Result<Attendance>;
    /// Inserts unless a row for the same (employee, date) exists. Returns
    /// whether a row was written.
    async fn insert_attendance_if_absent(&mut self, attendance: NewAttendance) -> Result<bool>;
    async fn save_attendance(&mut self, attendance: &Attendance) -> Result<()>;
    async fn list_attendance_between(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Attendance>>;
    async fn list_attendance_by_employee_range(
        &mut self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Attendance>>;
    /// Sets the lock flag on every row dated within the range. Returns the
    /// number of rows the store reports as touched.
    async fn finalize_attendance_between(&mut self, start: NaiveDate, end: NaiveDate)
    -> Result<u64>;
    async fn any_finalized_between(&mut self, start: NaiveDate, end: NaiveDate) -> Result<bool>;

    // payroll
    async fn exists_payroll(
        &mut self,
        employee_id: Option<u64>,
        year: i32,
        month: u32,
    ) -> Result<bool>;
    async fn get_payroll(&mut self, id: u64) -> Result<Option<Payroll>>;
    async fn lock_payroll(&mut self, id: u64) -> Result<Option<Payroll>>;
    /// Fails with `AlreadyExists` when the employee already has a row for the
    /// month, including one committed by a concurrent unit of work.
    async fn insert_payroll(&mut self, payroll: NewPayroll) -> Result<Payroll>;
    async fn save_payroll(&mut self, payroll: &Payroll) -> Result<()>;
    async fn list_payroll(&mut self, year: i32, month: u32) -> Result<Vec<Payroll>>;
    /// Like `list_payroll`, holding the rows until the unit ends.
    async fn lock_payroll_month(&mut self, year: i32, month: u32) -> Result<Vec<Payroll>>;

    async fn commit(self) -> Result<()>;
}
