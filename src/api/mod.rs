pub mod attendance;
pub mod leave_request;
pub mod payroll;

use serde::Deserialize;
use utoipa::IntoParams;

use crate::service::{AttendanceService, LeaveService, PayrollService};
use crate::store::MySqlStore;

pub type Leaves = LeaveService<MySqlStore>;
pub type Attendances = AttendanceService<MySqlStore>;
pub type Payrolls = PayrollService<MySqlStore>;

/// Calendar month selector shared by the attendance and payroll endpoints.
#[derive(Debug, Deserialize, IntoParams)]
pub struct MonthQuery {
    /// Four digit year
    #[param(example = 2026)]
    pub year: i32,
    /// Month number, 1 to 12
    #[param(example = 6)]
    pub month: u32,
}
