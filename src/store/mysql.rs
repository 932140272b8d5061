use std::str::FromStr;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySql, MySqlPool, Transaction};

use crate::errors::{HrmError, Result};
use crate::model::{
    attendance::{Attendance, NewAttendance},
    employee::Employee,
    leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest},
    payroll::{NewPayroll, Payroll},
};
use crate::store::{RecordStore, UnitOfWork};

const EMPLOYEE_COLUMNS: &str =
    "id, name, email, department, role, salary, leave_balance, is_active";
const LEAVE_COLUMNS: &str =
    "id, employee_id, start_date, end_date, reason, leave_type, status, applied_at";
const ATTENDANCE_COLUMNS: &str =
    "id, employee_id, date, status, leave_request_id, remarks, finalized";
const PAYROLL_COLUMNS: &str = "id, employee_id, month, year, base_salary, payable_days, \
     deduction_amount, net_salary, status, generated_at, payment_date";

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for MySqlStore {
    type Tx = MySqlTx;

    async fn begin(&self) -> Result<MySqlTx> {
        let tx = self.pool.begin().await?;
        Ok(MySqlTx { tx })
    }
}

pub struct MySqlTx {
    tx: Transaction<'static, MySql>,
}

fn parse_column<T: FromStr>(column: &'static str, value: &str) -> Result<T> {
    T::from_str(value)
        .map_err(|_| HrmError::Storage(format!("unexpected value {value:?} in column {column}")))
}

#[derive(FromRow)]
struct EmployeeRow {
    id: u64,
    name: String,
    email: String,
    department: Option<String>,
    role: String,
    salary: Option<Decimal>,
    leave_balance: i32,
    is_active: bool,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = HrmError;

    fn try_from(row: EmployeeRow) -> Result<Self> {
        Ok(Employee {
            id: row.id,
            name: row.name,
            email: row.email,
            department: row.department,
            role: parse_column("employees.role", &row.role)?,
            salary: row.salary,
            leave_balance: row.leave_balance,
            is_active: row.is_active,
        })
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: Option<String>,
    leave_type: String,
    status: String,
    applied_at: NaiveDateTime,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = HrmError;

    fn try_from(row: LeaveRow) -> Result<Self> {
        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            start_date: row.start_date,
            end_date: row.end_date,
            reason: row.reason,
            leave_type: parse_column("leave_requests.leave_type", &row.leave_type)?,
            status: parse_column("leave_requests.status", &row.status)?,
            applied_at: row.applied_at,
        })
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    date: NaiveDate,
    status: String,
    leave_request_id: Option<u64>,
    remarks: Option<String>,
    finalized: bool,
}

impl TryFrom<AttendanceRow> for Attendance {
    type Error = HrmError;

    fn try_from(row: AttendanceRow) -> Result<Self> {
        Ok(Attendance {
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            status: parse_column("attendance.status", &row.status)?,
            leave_request_id: row.leave_request_id,
            remarks: row.remarks,
            finalized: row.finalized,
        })
    }
}

#[derive(FromRow)]
struct PayrollRow {
    id: u64,
    employee_id: u64,
    month: u32,
    year: i32,
    base_salary: Decimal,
    payable_days: i32,
    deduction_amount: Decimal,
    net_salary: Decimal,
    status: String,
    generated_at: NaiveDateTime,
    payment_date: Option<NaiveDateTime>,
}

impl TryFrom<PayrollRow> for Payroll {
    type Error = HrmError;

    fn try_from(row: PayrollRow) -> Result<Self> {
        Ok(Payroll {
            id: row.id,
            employee_id: row.employee_id,
            month: row.month,
            year: row.year,
            base_salary: row.base_salary,
            payable_days: row.payable_days,
            deduction_amount: row.deduction_amount,
            net_salary: row.net_salary,
            status: parse_column("payroll.status", &row.status)?,
            generated_at: row.generated_at,
            payment_date: row.payment_date,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = HrmError>,
{
    rows.into_iter().map(T::try_from).collect()
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(String),
}

impl MySqlTx {
    async fn fetch_employee(&mut self, id: u64, lock: bool) -> Result<Option<Employee>> {
        let sql = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?{}",
            if lock { " FOR UPDATE" } else { "" }
        );
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(Employee::try_from)
            .transpose()
    }

    async fn fetch_leave(&mut self, id: u64, lock: bool) -> Result<Option<LeaveRequest>> {
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?{}",
            if lock { " FOR UPDATE" } else { "" }
        );
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }

    async fn fetch_payroll_month(
        &mut self,
        year: i32,
        month: u32,
        lock: bool,
    ) -> Result<Vec<Payroll>> {
        let sql = format!(
            "SELECT {PAYROLL_COLUMNS} FROM payroll WHERE month = ? AND year = ? \
             ORDER BY employee_id{}",
            if lock { " FOR UPDATE" } else { "" }
        );
        let rows = sqlx::query_as::<_, PayrollRow>(&sql)
            .bind(month)
            .bind(year)
            .fetch_all(&mut *self.tx)
            .await?;
        convert_all(rows)
    }

    async fn fetch_payroll(&mut self, id: u64, lock: bool) -> Result<Option<Payroll>> {
        let sql = format!(
            "SELECT {PAYROLL_COLUMNS} FROM payroll WHERE id = ?{}",
            if lock { " FOR UPDATE" } else { "" }
        );
        sqlx::query_as::<_, PayrollRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(Payroll::try_from)
            .transpose()
    }
}

#[async_trait]
impl UnitOfWork for MySqlTx {
    async fn get_employee(&mut self, id: u64) -> Result<Option<Employee>> {
        self.fetch_employee(id, false).await
    }

    async fn lock_employee(&mut self, id: u64) -> Result<Option<Employee>> {
        self.fetch_employee(id, true).await
    }

    async fn list_employees(&mut self) -> Result<Vec<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY id");
        let rows = sqlx::query_as::<_, EmployeeRow>(&sql)
            .fetch_all(&mut *self.tx)
            .await?;
        convert_all(rows)
    }

    async fn save_employee(&mut self, employee: &Employee) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE employees
            SET name = ?, email = ?, department = ?, role = ?, salary = ?,
                leave_balance = ?, is_active = ?
            WHERE id = ?
            "#,
        )
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.department)
        .bind(employee.role.as_ref())
        .bind(employee.salary)
        .bind(employee.leave_balance)
        .bind(employee.is_active)
        .bind(employee.id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn get_leave(&mut self, id: u64) -> Result<Option<LeaveRequest>> {
        self.fetch_leave(id, false).await
    }

    async fn lock_leave(&mut self, id: u64) -> Result<Option<LeaveRequest>> {
        self.fetch_leave(id, true).await
    }

    async fn insert_leave(&mut self, leave: NewLeaveRequest) -> Result<LeaveRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, start_date, end_date, reason, leave_type, status, applied_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(leave.employee_id)
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(&leave.reason)
        .bind(leave.leave_type.as_ref())
        .bind(leave.status.as_ref())
        .bind(leave.applied_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(leave.with_id(result.last_insert_id()))
    }

    async fn save_leave(&mut self, leave: &LeaveRequest) -> Result<()> {
        // applied_at is immutable once filed
        sqlx::query(
            r#"
            UPDATE leave_requests
            SET start_date = ?, end_date = ?, reason = ?, leave_type = ?, status = ?
            WHERE id = ?
            "#,
        )
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(&leave.reason)
        .bind(leave.leave_type.as_ref())
        .bind(leave.status.as_ref())
        .bind(leave.id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn list_leaves(
        &mut self,
        employee_id: Option<u64>,
        status: Option<LeaveStatus>,
    ) -> Result<Vec<LeaveRequest>> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(emp_id) = employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(emp_id));
        }

        if let Some(status) = status {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(status.to_string()));
        }

        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests{where_sql} ORDER BY start_date DESC, id DESC"
        );
        let mut query = sqlx::query_as::<_, LeaveRow>(&sql);
        for arg in args {
            query = match arg {
                FilterValue::U64(v) => query.bind(v),
                FilterValue::Str(s) => query.bind(s),
            };
        }
        let rows = query.fetch_all(&mut *self.tx).await?;
        convert_all(rows)
    }

    async fn find_attendance(
        &mut self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<Attendance>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? AND date = ? FOR UPDATE"
        );
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(Attendance::try_from)
            .transpose()
    }

    async fn lock_attendance(&mut self, id: u64) -> Result<Option<Attendance>> {
        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = ? FOR UPDATE");
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(Attendance::try_from)
            .transpose()
    }

    async fn insert_attendance(&mut self, attendance: NewAttendance) -> Result<Attendance> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
                (employee_id, date, status, leave_request_id, remarks, finalized)
            VALUES (?, ?, ?, ?, ?, FALSE)
            "#,
        )
        .bind(attendance.employee_id)
        .bind(attendance.date)
        .bind(attendance.status.as_ref())
        .bind(attendance.leave_request_id)
        .bind(&attendance.remarks)
        .execute(&mut *self.tx)
        .await?;
        Ok(attendance.with_id(result.last_insert_id()))
    }

    async fn insert_attendance_if_absent(&mut self, attendance: NewAttendance) -> Result<bool> {
        // the (employee_id, date) unique key turns a duplicate into a no-op
        let result = sqlx::query(
            r#"
            INSERT IGNORE INTO attendance
                (employee_id, date, status, leave_request_id, remarks, finalized)
            VALUES (?, ?, ?, ?, ?, FALSE)
            "#,
        )
        .bind(attendance.employee_id)
        .bind(attendance.date)
        .bind(attendance.status.as_ref())
        .bind(attendance.leave_request_id)
        .bind(&attendance.remarks)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn save_attendance(&mut self, attendance: &Attendance) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE attendance
            SET status = ?, leave_request_id = ?, remarks = ?, finalized = ?
            WHERE id = ?
            "#,
        )
        .bind(attendance.status.as_ref())
        .bind(attendance.leave_request_id)
        .bind(&attendance.remarks)
        .bind(attendance.finalized)
        .bind(attendance.id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn list_attendance_between(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Attendance>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE date BETWEEN ? AND ? ORDER BY date, employee_id"
        );
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&mut *self.tx)
            .await?;
        convert_all(rows)
    }

    async fn list_attendance_by_employee_range(
        &mut self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Attendance>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
             WHERE employee_id = ? AND date BETWEEN ? AND ? ORDER BY date"
        );
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(start)
            .bind(end)
            .fetch_all(&mut *self.tx)
            .await?;
        convert_all(rows)
    }

    async fn finalize_attendance_between(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET finalized = TRUE
            WHERE date BETWEEN ? AND ?
            "#,
        )
        .bind(start)
        .bind(end)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn any_finalized_between(&mut self, start: NaiveDate, end: NaiveDate) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM attendance WHERE date BETWEEN ? AND ? AND finalized = TRUE",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(count > 0)
    }

    async fn exists_payroll(
        &mut self,
        employee_id: Option<u64>,
        year: i32,
        month: u32,
    ) -> Result<bool> {
        let count = match employee_id {
            Some(employee_id) => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM payroll WHERE employee_id = ? AND month = ? AND year = ?",
                )
                .bind(employee_id)
                .bind(month)
                .bind(year)
                .fetch_one(&mut *self.tx)
                .await?
            }
            None => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM payroll WHERE month = ? AND year = ?",
                )
                .bind(month)
                .bind(year)
                .fetch_one(&mut *self.tx)
                .await?
            }
        };
        Ok(count > 0)
    }

    async fn get_payroll(&mut self, id: u64) -> Result<Option<Payroll>> {
        self.fetch_payroll(id, false).await
    }

    async fn lock_payroll(&mut self, id: u64) -> Result<Option<Payroll>> {
        self.fetch_payroll(id, true).await
    }

    async fn insert_payroll(&mut self, payroll: NewPayroll) -> Result<Payroll> {
        let (year, month) = (payroll.year, payroll.month);
        let result = sqlx::query(
            r#"
            INSERT INTO payroll
                (employee_id, month, year, base_salary, payable_days,
                 deduction_amount, net_salary, status, generated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 'GENERATED', ?)
            "#,
        )
        .bind(payroll.employee_id)
        .bind(payroll.month)
        .bind(payroll.year)
        .bind(payroll.base_salary)
        .bind(payroll.payable_days)
        .bind(payroll.deduction_amount)
        .bind(payroll.net_salary)
        .bind(payroll.generated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            // uq_payroll_employee_month, possibly taken by a concurrent generation
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return HrmError::AlreadyExists { year, month };
                }
            }
            HrmError::from(e)
        })?;
        Ok(payroll.with_id(result.last_insert_id()))
    }

    async fn save_payroll(&mut self, payroll: &Payroll) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE payroll
            SET status = ?, payment_date = ?
            WHERE id = ?
            "#,
        )
        .bind(payroll.status.as_ref())
        .bind(payroll.payment_date)
        .bind(payroll.id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn list_payroll(&mut self, year: i32, month: u32) -> Result<Vec<Payroll>> {
        self.fetch_payroll_month(year, month, false).await
    }

    async fn lock_payroll_month(&mut self, year: i32, month: u32) -> Result<Vec<Payroll>> {
        self.fetch_payroll_month(year, month, true).await
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
