//! Payroll generation from finalized attendance, and disbursement.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Datelike;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info, instrument};

use crate::clock::{Clock, ClockExt};
use crate::errors::{HrmError, Result};
use crate::model::attendance::AttendanceStatus;
use crate::model::leave_request::LeaveType;
use crate::model::payroll::{NewPayroll, Payroll, PayrollStatus};
use crate::service::attendance::is_month_finalized;
use crate::store::{RecordStore, UnitOfWork};
use crate::utils::calendar;

/// Payable days counted in half-day units so the sum stays exact.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PayableDays {
    half_days: u32,
}

impl PayableDays {
    /// Adds one attendance day. `leave_type` is the type of the leave behind a
    /// LEAVE day, when known; unknown leave counts as paid.
    pub fn record(&mut self, status: AttendanceStatus, leave_type: Option<LeaveType>) {
        self.half_days += match status {
            AttendanceStatus::Present => 2,
            AttendanceStatus::HalfDay => 1,
            AttendanceStatus::Leave if leave_type.is_some_and(|t| !t.is_paid()) => 0,
            AttendanceStatus::Leave => 2,
            AttendanceStatus::Absent => 0,
        };
    }

    pub fn fractional(&self) -> Decimal {
        Decimal::new(i64::from(self.half_days) * 5, 1)
    }

    /// Whole days for storage, rounded up.
    pub fn rounded_up(&self) -> i32 {
        i32::try_from(self.half_days.div_ceil(2)).unwrap_or(i32::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayrollAmounts {
    pub per_day_salary: Decimal,
    pub net_salary: Decimal,
    pub deduction: Decimal,
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl PayrollAmounts {
    pub fn compute(base_salary: Decimal, days_in_month: u32, payable: PayableDays) -> Self {
        let per_day_salary = round_money(base_salary / Decimal::from(days_in_month));
        let net_salary = round_money(per_day_salary * payable.fractional());
        let deduction = (base_salary - net_salary).max(Decimal::ZERO);
        Self {
            per_day_salary,
            net_salary,
            deduction,
        }
    }
}

pub struct PayrollService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    settle_delay: Duration,
}

impl<S: RecordStore> PayrollService<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, settle_delay: Duration) -> Self {
        Self {
            store,
            clock,
            settle_delay,
        }
    }

    /// Generates one GENERATED row per payroll-eligible employee for a month
    /// whose attendance is finalized. Runs at most once per month.
    #[instrument(skip(self))]
    pub async fn generate_payroll(&self, year: i32, month: u32) -> Result<Vec<Payroll>> {
        let (first, last) = calendar::month_bounds(year, month)?;
        let days_in_month = last.day();
        let mut tx = self.store.begin().await?;

        if !is_month_finalized(&mut tx, year, month).await? {
            return Err(HrmError::FailedPrecondition { year, month });
        }
        if tx.exists_payroll(None, year, month).await? {
            return Err(HrmError::AlreadyExists { year, month });
        }

        let generated_at = self.clock.now();
        let mut leave_types: HashMap<u64, Option<LeaveType>> = HashMap::new();
        let mut generated = Vec::new();

        for employee in tx.list_employees().await? {
            let Some(base_salary) = employee.payroll_salary() else {
                debug!(employee_id = employee.id, "Skipping employee without salary");
                continue;
            };

            let records = tx
                .list_attendance_by_employee_range(employee.id, first, last)
                .await?;

            let mut payable = PayableDays::default();
            for record in &records {
                let leave_type = match (record.status, record.leave_request_id) {
                    (AttendanceStatus::Leave, Some(leave_id)) => match leave_types.get(&leave_id) {
                        Some(cached) => *cached,
                        None => {
                            let found = tx.get_leave(leave_id).await?.map(|l| l.leave_type);
                            leave_types.insert(leave_id, found);
                            found
                        }
                    },
                    _ => None,
                };
                payable.record(record.status, leave_type);
            }

            let amounts = PayrollAmounts::compute(base_salary, days_in_month, payable);
            let payroll = tx
                .insert_payroll(NewPayroll {
                    employee_id: employee.id,
                    month,
                    year,
                    base_salary,
                    payable_days: payable.rounded_up(),
                    deduction_amount: amounts.deduction,
                    net_salary: amounts.net_salary,
                    generated_at,
                })
                .await?;
            generated.push(payroll);
        }

        tx.commit().await?;
        info!(year, month, rows = generated.len(), "Payroll generated");
        Ok(generated)
    }

    /// Sets PAID and stamps the payment date. Calling it again on a PAID row
    /// only re-stamps the date.
    #[instrument(skip(self))]
    pub async fn mark_as_paid(&self, payroll_id: u64) -> Result<Payroll> {
        let mut tx = self.store.begin().await?;
        let mut payroll = tx
            .lock_payroll(payroll_id)
            .await?
            .ok_or_else(|| HrmError::not_found("Payroll", payroll_id))?;

        payroll.mark_paid(self.clock.now());
        tx.save_payroll(&payroll).await?;
        tx.commit().await?;

        info!(payroll_id, "Payroll marked as paid");
        Ok(payroll)
    }

    /// Pays every unpaid row of the month after the simulated bank settlement.
    /// Returns the number of rows moved to PAID.
    #[instrument(skip(self))]
    pub async fn process_payroll_batch(&self, year: i32, month: u32) -> Result<usize> {
        calendar::month_bounds(year, month)?;
        let mut tx = self.store.begin().await?;

        // locked until commit so a concurrent mark_as_paid or batch waits for us
        let payrolls = tx.lock_payroll_month(year, month).await?;
        if payrolls.is_empty() {
            return Err(HrmError::not_found(
                "Payroll records for",
                format!("{month}/{year}"),
            ));
        }

        debug!(delay_ms = self.settle_delay.as_millis() as u64, "Waiting for bank settlement");
        tokio::time::sleep(self.settle_delay).await;

        let mut paid = 0;
        for mut payroll in payrolls
            .into_iter()
            .filter(|p| p.status != PayrollStatus::Paid)
        {
            payroll.mark_paid(self.clock.now());
            tx.save_payroll(&payroll).await?;
            paid += 1;
        }

        tx.commit().await?;
        info!(year, month, paid, "Salaries disbursed");
        Ok(paid)
    }

    pub async fn list(&self, year: i32, month: u32) -> Result<Vec<Payroll>> {
        calendar::month_bounds(year, month)?;
        let mut tx = self.store.begin().await?;
        tx.list_payroll(year, month).await
    }

    pub async fn get(&self, payroll_id: u64) -> Result<Payroll> {
        let mut tx = self.store.begin().await?;
        tx.get_payroll(payroll_id)
            .await?
            .ok_or_else(|| HrmError::not_found("Payroll", payroll_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::model::attendance::Attendance;
    use crate::model::leave_request::LeaveStatus;
    use crate::store::InMemoryStore;
    use crate::test_utils::{attendance_row, date, employee_with_salary, leave};
    use chrono::NaiveDateTime;
    use rust_decimal_macros::dec;

    fn generated_at() -> NaiveDateTime {
        date(2026, 5, 1).and_hms_opt(9, 0, 0).unwrap()
    }

    fn service(store: &Arc<InMemoryStore>, now: NaiveDateTime) -> PayrollService<InMemoryStore> {
        PayrollService::new(store.clone(), Arc::new(FixedClock::new(now)), Duration::ZERO)
    }

    /// April 2026 has 30 days.
    async fn seed_april(store: &InMemoryStore, employee_id: u64, statuses: &[AttendanceStatus]) {
        for (i, status) in statuses.iter().enumerate() {
            let day = u32::try_from(i).unwrap() + 1;
            let mut row: Attendance = attendance_row(
                employee_id * 1000 + u64::from(day),
                employee_id,
                date(2026, 4, day),
                *status,
            );
            row.finalized = true;
            store.put_attendance(row).await;
        }
    }

    fn days(
        present: usize,
        half: usize,
        other: AttendanceStatus,
        other_count: usize,
    ) -> Vec<AttendanceStatus> {
        let mut v = vec![AttendanceStatus::Present; present];
        v.extend(std::iter::repeat_n(AttendanceStatus::HalfDay, half));
        v.extend(std::iter::repeat_n(other, other_count));
        v
    }

    #[test]
    fn payable_days_weights() {
        let mut payable = PayableDays::default();
        payable.record(AttendanceStatus::Present, None);
        payable.record(AttendanceStatus::HalfDay, None);
        payable.record(AttendanceStatus::Absent, None);
        payable.record(AttendanceStatus::Leave, Some(LeaveType::SickLeave));
        payable.record(AttendanceStatus::Leave, Some(LeaveType::UnpaidLeave));
        payable.record(AttendanceStatus::Leave, None);
        assert_eq!(payable.fractional(), dec!(3.5));
        assert_eq!(payable.rounded_up(), 4);
    }

    #[test]
    fn amounts_round_half_up() {
        let mut payable = PayableDays::default();
        for _ in 0..14 {
            payable.record(AttendanceStatus::Present, None);
        }
        payable.record(AttendanceStatus::HalfDay, None);

        // 1000 / 30 = 33.333.. -> 33.33; 33.33 * 14.5 = 483.285 -> 483.29
        let amounts = PayrollAmounts::compute(dec!(1000), 30, payable);
        assert_eq!(amounts.per_day_salary, dec!(33.33));
        assert_eq!(amounts.net_salary, dec!(483.29));
        assert_eq!(amounts.deduction, dec!(516.71));

        // 283.5 / 28 = 10.125 -> 10.13
        let amounts = PayrollAmounts::compute(dec!(283.5), 28, PayableDays::default());
        assert_eq!(amounts.per_day_salary, dec!(10.13));
        assert_eq!(amounts.net_salary, Decimal::ZERO);
    }

    #[test]
    fn deduction_never_goes_negative() {
        let mut payable = PayableDays::default();
        for _ in 0..31 {
            payable.record(AttendanceStatus::Present, None);
        }
        // 1000 / 30 rounds to 33.33, 31 days pay 1033.23
        let amounts = PayrollAmounts::compute(dec!(1000), 30, payable);
        assert_eq!(amounts.net_salary, dec!(1033.23));
        assert_eq!(amounts.deduction, Decimal::ZERO);
    }

    #[tokio::test]
    async fn generates_prorated_payroll() {
        let store = Arc::new(InMemoryStore::new());
        store.put_employee(employee_with_salary(1, Some(dec!(3000)))).await;
        seed_april(&store, 1, &days(28, 2, AttendanceStatus::Absent, 0)).await;

        let rows = service(&store, generated_at())
            .generate_payroll(2026, 4)
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        let payroll = &rows[0];
        assert_eq!(payroll.base_salary, dec!(3000));
        assert_eq!(payroll.net_salary, dec!(2900.00));
        assert_eq!(payroll.deduction_amount, dec!(100.00));
        assert_eq!(payroll.payable_days, 29);
        assert_eq!(payroll.status, PayrollStatus::Generated);
        assert_eq!(payroll.generated_at, generated_at());
        assert_eq!(payroll.payment_date, None);
        assert_eq!(store.snapshot().await.payroll.len(), 1);
    }

    #[tokio::test]
    async fn unpaid_leave_days_are_not_paid() {
        let store = Arc::new(InMemoryStore::new());
        for (employee_id, leave_id, leave_type) in
            [(1, 900, LeaveType::UnpaidLeave), (2, 901, LeaveType::EarnedLeave)]
        {
            store
                .put_employee(employee_with_salary(employee_id, Some(dec!(3000))))
                .await;
            let mut approved = leave(
                leave_id,
                employee_id,
                date(2026, 4, 29),
                date(2026, 4, 30),
                leave_type,
            );
            approved.status = LeaveStatus::Approved;
            store.put_leave(approved).await;
            seed_april(&store, employee_id, &days(28, 0, AttendanceStatus::Absent, 0)).await;
            for day in [29, 30] {
                let mut row = attendance_row(
                    employee_id * 1000 + u64::from(day),
                    employee_id,
                    date(2026, 4, day),
                    AttendanceStatus::Leave,
                );
                row.leave_request_id = Some(leave_id);
                row.finalized = true;
                store.put_attendance(row).await;
            }
        }

        let rows = service(&store, generated_at())
            .generate_payroll(2026, 4)
            .await
            .unwrap();

        let by_employee: HashMap<_, _> = rows.iter().map(|p| (p.employee_id, p)).collect();
        assert_eq!(by_employee[&1].net_salary, dec!(2800.00));
        assert_eq!(by_employee[&1].payable_days, 28);
        assert_eq!(by_employee[&2].net_salary, dec!(3000.00));
        assert_eq!(by_employee[&2].deduction_amount, Decimal::ZERO);
    }

    #[tokio::test]
    async fn skips_employees_without_salary() {
        let store = Arc::new(InMemoryStore::new());
        store.put_employee(employee_with_salary(1, None)).await;
        store.put_employee(employee_with_salary(2, Some(Decimal::ZERO))).await;
        store.put_employee(employee_with_salary(3, Some(dec!(1500)))).await;
        seed_april(&store, 1, &days(30, 0, AttendanceStatus::Absent, 0)).await;

        let rows = service(&store, generated_at())
            .generate_payroll(2026, 4)
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].employee_id, 3);
        assert_eq!(rows[0].net_salary, Decimal::ZERO);
        assert_eq!(rows[0].deduction_amount, dec!(1500));
    }

    #[tokio::test]
    async fn requires_finalized_attendance() {
        let store = Arc::new(InMemoryStore::new());
        store.put_employee(employee_with_salary(1, Some(dec!(3000)))).await;
        store
            .put_attendance(attendance_row(1, 1, date(2026, 4, 1), AttendanceStatus::Present))
            .await;

        let err = service(&store, generated_at())
            .generate_payroll(2026, 4)
            .await
            .unwrap_err();

        assert!(matches!(err, HrmError::FailedPrecondition { year: 2026, month: 4 }));
        assert!(store.snapshot().await.payroll.is_empty());
    }

    #[tokio::test]
    async fn generates_once_per_month() {
        let store = Arc::new(InMemoryStore::new());
        store.put_employee(employee_with_salary(1, Some(dec!(3000)))).await;
        seed_april(&store, 1, &days(30, 0, AttendanceStatus::Absent, 0)).await;
        let service = service(&store, generated_at());

        service.generate_payroll(2026, 4).await.unwrap();
        let err = service.generate_payroll(2026, 4).await.unwrap_err();

        assert!(matches!(err, HrmError::AlreadyExists { year: 2026, month: 4 }));
        assert_eq!(store.snapshot().await.payroll.len(), 1);
    }

    #[tokio::test]
    async fn mark_as_paid_restamps_paid_rows() {
        let store = Arc::new(InMemoryStore::new());
        store.put_employee(employee_with_salary(1, Some(dec!(3000)))).await;
        seed_april(&store, 1, &days(30, 0, AttendanceStatus::Absent, 0)).await;
        let rows = service(&store, generated_at())
            .generate_payroll(2026, 4)
            .await
            .unwrap();
        let id = rows[0].id;

        let first_stamp = date(2026, 5, 2).and_hms_opt(10, 0, 0).unwrap();
        let second_stamp = date(2026, 5, 3).and_hms_opt(11, 0, 0).unwrap();
        let paid = service(&store, first_stamp).mark_as_paid(id).await.unwrap();
        assert_eq!(paid.status, PayrollStatus::Paid);
        assert_eq!(paid.payment_date, Some(first_stamp));

        let again = service(&store, second_stamp).mark_as_paid(id).await.unwrap();
        assert_eq!(again.status, PayrollStatus::Paid);
        assert_eq!(again.payment_date, Some(second_stamp));
        assert_eq!(store.snapshot().await.payroll[&id].payment_date, Some(second_stamp));
    }

    #[tokio::test]
    async fn mark_as_paid_unknown_row() {
        let store = Arc::new(InMemoryStore::new());
        let err = service(&store, generated_at()).mark_as_paid(8).await.unwrap_err();
        assert!(matches!(err, HrmError::NotFound { .. }));
    }

    #[tokio::test]
    async fn batch_pays_only_unpaid_rows() {
        let store = Arc::new(InMemoryStore::new());
        for id in 1..=3 {
            store.put_employee(employee_with_salary(id, Some(dec!(3000)))).await;
        }
        seed_april(&store, 1, &days(30, 0, AttendanceStatus::Absent, 0)).await;
        let rows = service(&store, generated_at())
            .generate_payroll(2026, 4)
            .await
            .unwrap();
        let early = date(2026, 5, 2).and_hms_opt(8, 0, 0).unwrap();
        service(&store, early).mark_as_paid(rows[0].id).await.unwrap();

        let batch_time = date(2026, 5, 5).and_hms_opt(8, 0, 0).unwrap();
        let paid = service(&store, batch_time)
            .process_payroll_batch(2026, 4)
            .await
            .unwrap();

        assert_eq!(paid, 2);
        let tables = store.snapshot().await;
        assert!(tables.payroll.values().all(|p| p.status == PayrollStatus::Paid));
        assert_eq!(tables.payroll[&rows[0].id].payment_date, Some(early));
        assert_eq!(tables.payroll[&rows[1].id].payment_date, Some(batch_time));
    }

    #[tokio::test]
    async fn batch_requires_rows() {
        let store = Arc::new(InMemoryStore::new());
        let err = service(&store, generated_at())
            .process_payroll_batch(2026, 4)
            .await
            .unwrap_err();
        assert!(matches!(err, HrmError::NotFound { .. }));
    }

    #[tokio::test]
    async fn cancelled_batch_changes_nothing() {
        let store = Arc::new(InMemoryStore::new());
        store.put_employee(employee_with_salary(1, Some(dec!(3000)))).await;
        seed_april(&store, 1, &days(30, 0, AttendanceStatus::Absent, 0)).await;
        service(&store, generated_at())
            .generate_payroll(2026, 4)
            .await
            .unwrap();
        let slow = PayrollService::new(
            store.clone(),
            Arc::new(FixedClock::new(generated_at())),
            Duration::from_secs(30),
        );

        let outcome = tokio::time::timeout(
            Duration::from_millis(20),
            slow.process_payroll_batch(2026, 4),
        )
        .await;

        assert!(outcome.is_err());
        let tables = store.snapshot().await;
        assert!(tables
            .payroll
            .values()
            .all(|p| p.status == PayrollStatus::Generated && p.payment_date.is_none()));
    }

    #[tokio::test]
    async fn list_and_get_read_generated_rows() {
        let store = Arc::new(InMemoryStore::new());
        for id in 1..=2 {
            store.put_employee(employee_with_salary(id, Some(dec!(3000)))).await;
        }
        seed_april(&store, 1, &days(30, 0, AttendanceStatus::Absent, 0)).await;
        let service = service(&store, generated_at());
        let rows = service.generate_payroll(2026, 4).await.unwrap();

        assert_eq!(service.list(2026, 4).await.unwrap().len(), 2);
        assert!(service.list(2026, 5).await.unwrap().is_empty());
        assert_eq!(service.get(rows[0].id).await.unwrap(), rows[0]);
        assert!(matches!(
            service.list(2026, 13).await.unwrap_err(),
            HrmError::InvalidMonth { .. }
        ));
        assert!(matches!(
            service.get(999).await.unwrap_err(),
            HrmError::NotFound { .. }
        ));
    }

    async fn generated_april(store: &Arc<InMemoryStore>) -> Vec<Payroll> {
        for id in 1..=2 {
            store.put_employee(employee_with_salary(id, Some(dec!(3000)))).await;
        }
        seed_april(store, 1, &days(30, 0, AttendanceStatus::Absent, 0)).await;
        service(store, generated_at())
            .generate_payroll(2026, 4)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn mark_as_paid_during_settlement_waits_for_the_batch() {
        let store = Arc::new(InMemoryStore::new());
        let rows = generated_april(&store).await;
        let batch_time = date(2026, 5, 5).and_hms_opt(8, 0, 0).unwrap();
        let mark_time = date(2026, 5, 5).and_hms_opt(8, 0, 1).unwrap();
        let batch = PayrollService::new(
            store.clone(),
            Arc::new(FixedClock::new(batch_time)),
            Duration::from_millis(50),
        );
        let marker = service(&store, mark_time);

        let (paid, marked) = tokio::join!(batch.process_payroll_batch(2026, 4), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            marker.mark_as_paid(rows[0].id).await
        });

        assert_eq!(paid.unwrap(), 2);
        assert_eq!(marked.unwrap().payment_date, Some(mark_time));
        let tables = store.snapshot().await;
        assert_eq!(tables.payroll[&rows[0].id].payment_date, Some(mark_time));
        assert_eq!(tables.payroll[&rows[1].id].payment_date, Some(batch_time));
    }

    #[tokio::test]
    async fn concurrent_batches_pay_each_row_once() {
        let store = Arc::new(InMemoryStore::new());
        generated_april(&store).await;
        let batch = |at| {
            PayrollService::new(
                store.clone(),
                Arc::new(FixedClock::new(at)),
                Duration::from_millis(20),
            )
        };
        let first_time = date(2026, 5, 5).and_hms_opt(8, 0, 0).unwrap();
        let first = batch(first_time);
        let second = batch(date(2026, 5, 6).and_hms_opt(8, 0, 0).unwrap());

        let (a, b) = tokio::join!(
            first.process_payroll_batch(2026, 4),
            second.process_payroll_batch(2026, 4)
        );

        assert_eq!(a.unwrap() + b.unwrap(), 2);
        let tables = store.snapshot().await;
        assert!(tables.payroll.values().all(|p| p.payment_date == Some(first_time)));
    }
}
