use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[derive(EnumString, AsRefStr, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PayrollStatus {
    Generated,
    Paid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 1000,
    "month": 6,
    "year": 2026,
    "base_salary": "3000.00",
    "payable_days": 29,
    "deduction_amount": "100.00",
    "net_salary": "2900.00",
    "status": "GENERATED",
    "generated_at": "2026-07-01T10:00:00",
    "payment_date": null
}))]
pub struct Payroll {
    pub id: u64,
    pub employee_id: u64,
    pub month: u32,
    pub year: i32,
    pub base_salary: Decimal,
    /// Fractional payable days rounded up; net pay uses the exact fraction.
    pub payable_days: i32,
    pub deduction_amount: Decimal,
    pub net_salary: Decimal,
    pub status: PayrollStatus,
    pub generated_at: NaiveDateTime,
    pub payment_date: Option<NaiveDateTime>,
}

impl Payroll {
    pub fn mark_paid(&mut self, at: NaiveDateTime) {
        self.status = PayrollStatus::Paid;
        self.payment_date = Some(at);
    }
}

#[derive(Debug, Clone)]
pub struct NewPayroll {
    pub employee_id: u64,
    pub month: u32,
    pub year: i32,
    pub base_salary: Decimal,
    pub payable_days: i32,
    pub deduction_amount: Decimal,
    pub net_salary: Decimal,
    pub generated_at: NaiveDateTime,
}

impl NewPayroll {
    pub fn with_id(self, id: u64) -> Payroll {
        Payroll {
            id,
            employee_id: self.employee_id,
            month: self.month,
            year: self.year,
            base_salary: self.base_salary,
            payable_days: self.payable_days,
            deduction_amount: self.deduction_amount,
            net_salary: self.net_salary,
            status: PayrollStatus::Generated,
            generated_at: self.generated_at,
            payment_date: None,
        }
    }
}
