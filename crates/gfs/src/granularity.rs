//! Calendar granularities and period-start arithmetic
//!
//! Every rotation tier groups backups into periods of one granularity. A
//! period is identified by its start: the instant a timestamp truncates to.
//! Two timestamps share a period iff they truncate to the same start.

use std::fmt;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Weekday};

/// A calendar unit backups can be bucketed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl Granularity {
    /// Tiers finer than a calendar day, meaningless for date-only backups
    pub fn is_sub_daily(self) -> bool {
        matches!(
            self,
            Granularity::Seconds | Granularity::Minutes | Granularity::Hours
        )
    }

    /// Start of the period containing `instant`.
    ///
    /// Weeks snap back to the most recent `week_start` on or before the
    /// instant's date (the same day when they match); all other units
    /// truncate in place. Monotonic: ordering of instants is preserved by
    /// their period starts.
    pub fn floor(self, instant: NaiveDateTime, week_start: Weekday) -> NaiveDateTime {
        let date = instant.date();
        match self {
            Granularity::Seconds => date
                .and_hms_opt(instant.hour(), instant.minute(), instant.second())
                .unwrap(),
            Granularity::Minutes => date.and_hms_opt(instant.hour(), instant.minute(), 0).unwrap(),
            Granularity::Hours => date.and_hms_opt(instant.hour(), 0, 0).unwrap(),
            Granularity::Days => date.and_time(NaiveTime::MIN),
            Granularity::Weeks => {
                let run = instant.weekday().days_since(week_start);
                (date - Days::new(u64::from(run))).and_time(NaiveTime::MIN)
            }
            Granularity::Months => NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
                .unwrap()
                .and_time(NaiveTime::MIN),
            Granularity::Years => NaiveDate::from_ymd_opt(date.year(), 1, 1)
                .unwrap()
                .and_time(NaiveTime::MIN),
        }
    }

    /// Period start `periods` whole periods before `start`.
    ///
    /// `start` must itself be a period start of this granularity. Months
    /// and years step by calendar fields, so stepping back from January
    /// lands in December of the prior year. Returns `None` when the result
    /// falls outside the representable range, which a caller can read as
    /// "earlier than every representable instant".
    pub fn step_back(self, start: NaiveDateTime, periods: u32) -> Option<NaiveDateTime> {
        match self {
            Granularity::Seconds => start.checked_sub_signed(TimeDelta::seconds(i64::from(periods))),
            Granularity::Minutes => start.checked_sub_signed(TimeDelta::minutes(i64::from(periods))),
            Granularity::Hours => start.checked_sub_signed(TimeDelta::hours(i64::from(periods))),
            Granularity::Days => start.checked_sub_signed(TimeDelta::days(i64::from(periods))),
            Granularity::Weeks => start.checked_sub_signed(TimeDelta::weeks(i64::from(periods))),
            Granularity::Months => {
                let months =
                    i64::from(start.year()) * 12 + i64::from(start.month0()) - i64::from(periods);
                let year = i32::try_from(months.div_euclid(12)).ok()?;
                let month = months.rem_euclid(12) as u32 + 1;
                Some(NaiveDate::from_ymd_opt(year, month, 1)?.and_time(NaiveTime::MIN))
            }
            Granularity::Years => {
                let year = i32::try_from(i64::from(start.year()) - i64::from(periods)).ok()?;
                Some(NaiveDate::from_ymd_opt(year, 1, 1)?.and_time(NaiveTime::MIN))
            }
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Granularity::Seconds => "seconds",
            Granularity::Minutes => "minutes",
            Granularity::Hours => "hours",
            Granularity::Days => "days",
            Granularity::Weeks => "weeks",
            Granularity::Months => "months",
            Granularity::Years => "years",
        };
        f.write_str(label)
    }
}
