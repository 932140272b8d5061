//! Wall-clock access for the services.
//!
//! Leave and payroll dates are calendar dates in the server's local time zone.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
pub use mockable::{Clock, DefaultClock};

/// Local calendar views over any [`Clock`].
pub trait ClockExt {
    fn today(&self) -> NaiveDate;
    fn now(&self) -> NaiveDateTime;
}

impl<C: Clock + ?Sized> ClockExt for C {
    fn today(&self) -> NaiveDate {
        self.local().date_naive()
    }

    fn now(&self) -> NaiveDateTime {
        self.local().naive_local()
    }
}

/// Clock pinned to one local instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Local>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        let now = Local
            .from_local_datetime(&now)
            .earliest()
            .unwrap_or_else(|| Local.from_utc_datetime(&now));
        Self { now }
    }

    /// Noon on `date`, clear of any daylight-saving transition.
    pub fn at_date(date: NaiveDate) -> Self {
        Self::new(date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)))
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.now
    }

    fn utc(&self) -> DateTime<Utc> {
        self.now.with_timezone(&Utc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_reports_its_local_date_and_time() {
        let at = NaiveDate::from_ymd_opt(2026, 6, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let clock = FixedClock::new(at);

        assert_eq!(clock.now(), at);
        assert_eq!(clock.today(), at.date());
    }

    #[test]
    fn at_date_stays_on_the_given_day() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 29).unwrap();
        assert_eq!(FixedClock::at_date(day).today(), day);
    }
}
