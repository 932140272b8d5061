pub mod attendance;
pub mod leave;
pub mod payroll;

pub use attendance::AttendanceService;
pub use leave::{LeaveApplication, LeaveService};
pub use payroll::PayrollService;
