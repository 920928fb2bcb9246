//! Retention policy configuration
//!
//! A policy is plain data: seven tier counts, a week anchor, and an
//! optional reference instant. It validates once at the entry points and
//! carries no state between rotations.

use chrono::{NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::granularity::Granularity;

/// Week anchor used when none is configured. Saturday is the traditional
/// full-backup day in a grandfather-father-son rotation.
pub const DEFAULT_FIRST_WEEKDAY: Weekday = Weekday::Sat;

/// Tiered retention policy
///
/// Each count says how many trailing periods of that granularity keep one
/// backup (the earliest of the period). A count of 0 deactivates the tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    /// Trailing years that each keep their first backup
    pub years: u32,
    /// Trailing calendar months
    pub months: u32,
    /// Trailing weeks, anchored on `first_weekday`
    pub weeks: u32,
    /// Trailing calendar days
    pub days: u32,
    /// Trailing hours
    pub hours: u32,
    /// Trailing minutes
    pub minutes: u32,
    /// Trailing seconds
    pub seconds: u32,
    /// Weekday a retention week starts on
    pub first_weekday: Weekday,
    /// Reference instant anchoring period 0. When unset, the local clock
    /// is read once per rotation call.
    pub now: Option<NaiveDateTime>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            years: 0,
            months: 0,
            weeks: 0,
            days: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
            first_weekday: DEFAULT_FIRST_WEEKDAY,
            now: None,
        }
    }
}

impl RetentionPolicy {
    /// Policy that retains nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the years count
    pub fn with_years(mut self, years: u32) -> Self {
        self.years = years;
        self
    }

    /// Set the months count
    pub fn with_months(mut self, months: u32) -> Self {
        self.months = months;
        self
    }

    /// Set the weeks count
    pub fn with_weeks(mut self, weeks: u32) -> Self {
        self.weeks = weeks;
        self
    }

    /// Set the days count
    pub fn with_days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    /// Set the hours count
    pub fn with_hours(mut self, hours: u32) -> Self {
        self.hours = hours;
        self
    }

    /// Set the minutes count
    pub fn with_minutes(mut self, minutes: u32) -> Self {
        self.minutes = minutes;
        self
    }

    /// Set the seconds count
    pub fn with_seconds(mut self, seconds: u32) -> Self {
        self.seconds = seconds;
        self
    }

    /// Set the weekday a retention week starts on
    pub fn with_first_weekday(mut self, first_weekday: Weekday) -> Self {
        self.first_weekday = first_weekday;
        self
    }

    /// Pin the reference instant instead of reading the clock
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    /// Tier counts, coarsest first
    pub fn tiers(&self) -> [(Granularity, u32); 7] {
        [
            (Granularity::Years, self.years),
            (Granularity::Months, self.months),
            (Granularity::Weeks, self.weeks),
            (Granularity::Days, self.days),
            (Granularity::Hours, self.hours),
            (Granularity::Minutes, self.minutes),
            (Granularity::Seconds, self.seconds),
        ]
    }

    /// Reject tiers that cannot apply to date-only backups.
    ///
    /// A pure calendar date has no time of day, so a policy used with the
    /// date entry points must leave the hours, minutes, and seconds
    /// counts at 0.
    pub fn validate_for_dates(&self) -> Result<(), PolicyError> {
        for (tier, count) in self.tiers() {
            if tier.is_sub_daily() && count > 0 {
                return Err(PolicyError::SubDailyTier { tier, count });
            }
        }
        Ok(())
    }
}

/// Rejected policy configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// A tier finer than a day was given to a date-only rotation
    #[error("date rotation cannot retain {count} {tier}: dates carry no time of day")]
    SubDailyTier {
        /// The offending tier
        tier: Granularity,
        /// Its configured count
        count: u32,
    },
}
