use crate::api::attendance::{AttendanceListResponse, UpdateAttendance};
use crate::api::leave_request::{CreateLeave, LeaveFilter, LeaveListResponse};
use crate::api::payroll::PayrollListResponse;
use crate::model::attendance::{Attendance, AttendanceStatus};
use crate::model::employee::Employee;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use crate::model::payroll::{Payroll, PayrollStatus};
use crate::model::role::Role;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Ledger API",
        version = "1.0.0",
        description = r#"
## Leave, Attendance and Payroll reconciliation

Keeps three HR ledgers consistent with each other:

- **Leave**: employees file requests, HR approves or rejects them. Approval
  debits the leave balance and marks every covered attendance day as LEAVE.
- **Attendance**: monthly rows are seeded as ABSENT, corrected by hand and
  finally locked for payroll.
- **Payroll**: once a month is locked, payable days are derived from
  attendance and one payroll row is generated per salaried employee.

### Response Format
- JSON bodies, errors as `{"message": "..."}`
- Year and month are passed as query parameters

Authentication is handled upstream of this service.
"#,
    ),
    paths(
        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::employee_leaves,

        crate::api::attendance::init_month,
        crate::api::attendance::list_month,
        crate::api::attendance::update_attendance,
        crate::api::attendance::finalize_month,

        crate::api::payroll::generate_payroll,
        crate::api::payroll::list_payrolls,
        crate::api::payroll::get_payroll,
        crate::api::payroll::mark_paid,
        crate::api::payroll::process_batch
    ),
    components(
        schemas(
            CreateLeave,
            LeaveFilter,
            LeaveListResponse,
            LeaveRequest,
            LeaveStatus,
            LeaveType,
            UpdateAttendance,
            AttendanceListResponse,
            Attendance,
            AttendanceStatus,
            PayrollListResponse,
            Payroll,
            PayrollStatus,
            Employee,
            Role
        )
    ),
    tags(
        (name = "Leave", description = "Leave request lifecycle"),
        (name = "Attendance", description = "Monthly attendance ledger"),
        (name = "Payroll", description = "Payroll generation and disbursement"),
    )
)]
pub struct ApiDoc;
