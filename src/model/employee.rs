use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::HrmError;
use crate::model::role::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "John Doe",
        "email": "john.doe@company.com",
        "department": "Engineering",
        "role": "EMPLOYEE",
        "salary": "3000.00",
        "leave_balance": 20,
        "is_active": true
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "John Doe")]
    pub name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,

    pub role: Role,

    /// Monthly base salary. `None` or zero means the employee is not on payroll.
    #[schema(example = "3000.00", nullable = true)]
    pub salary: Option<Decimal>,

    /// Leave days remaining; only leave approval moves it.
    #[schema(example = 20)]
    pub leave_balance: i32,

    #[schema(example = true)]
    pub is_active: bool,
}

impl Employee {
    /// Base salary for payroll; `None` unless a positive salary is set.
    pub fn payroll_salary(&self) -> Option<Decimal> {
        self.salary.filter(|salary| *salary > Decimal::ZERO)
    }

    /// Fails with `InsufficientBalance` if `days` exceeds the remaining balance.
    pub fn ensure_leave_available(&self, days: i64) -> Result<(), HrmError> {
        if i64::from(self.leave_balance) < days {
            return Err(HrmError::InsufficientBalance {
                employee_id: self.id,
                requested: days,
                available: self.leave_balance,
            });
        }
        Ok(())
    }

    /// Charges `days` against the balance. The balance never goes below zero.
    pub fn debit_leave(&mut self, days: i64) -> Result<(), HrmError> {
        self.ensure_leave_available(days)?;
        let days = i32::try_from(days).map_err(|_| HrmError::InsufficientBalance {
            employee_id: self.id,
            requested: days,
            available: self.leave_balance,
        })?;
        self.leave_balance -= days;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn employee(balance: i32, salary: Option<Decimal>) -> Employee {
        Employee {
            id: 7,
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            department: None,
            role: Role::Employee,
            salary,
            leave_balance: balance,
            is_active: true,
        }
    }

    #[test]
    fn debit_reduces_balance() {
        let mut e = employee(5, None);
        e.debit_leave(3).unwrap();
        assert_eq!(e.leave_balance, 2);
        e.debit_leave(2).unwrap();
        assert_eq!(e.leave_balance, 0);
    }

    #[test]
    fn debit_past_zero_is_refused_and_leaves_balance_alone() {
        let mut e = employee(2, None);
        let err = e.debit_leave(3).unwrap_err();
        assert_eq!(err.to_string(), "Insufficient leave balance. Requesting: 3, Available: 2");
        assert_eq!(e.leave_balance, 2);
    }

    #[test]
    fn payroll_eligibility_needs_positive_salary() {
        assert_eq!(employee(0, Some(dec!(1))).payroll_salary(), Some(dec!(1)));
        assert_eq!(employee(0, Some(Decimal::ZERO)).payroll_salary(), None);
        assert_eq!(employee(0, Some(dec!(-10))).payroll_salary(), None);
        assert_eq!(employee(0, None).payroll_salary(), None);
    }
}
