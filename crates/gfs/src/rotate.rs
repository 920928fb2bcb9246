//! Keep/delete partitioning of backup timestamps
//!
//! One rotation is a single synchronous pass: resolve the reference
//! instant, bucket the backups once per active tier, union the per-bucket
//! representatives. Nothing is cached between calls and nothing is
//! deleted here; the caller owns the artifacts behind the timestamps.

use std::collections::HashSet;

use ahash::AHashMap;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use tracing::debug;

use crate::granularity::Granularity;
use crate::policy::RetentionPolicy;
use crate::Result;

/// Return the backups that the policy retains.
///
/// The result is a subset of the distinct input values. Backups dated
/// after the reference instant are never retained.
pub fn to_keep(backups: &[NaiveDateTime], policy: &RetentionPolicy) -> HashSet<NaiveDateTime> {
    let now = resolve_now(policy);
    keep_instants(backups.iter().copied(), policy, now)
}

/// Return the backups the policy lets go of: the distinct input values
/// minus [`to_keep`].
pub fn to_delete(backups: &[NaiveDateTime], policy: &RetentionPolicy) -> HashSet<NaiveDateTime> {
    let now = resolve_now(policy);
    let keep = keep_instants(backups.iter().copied(), policy, now);
    backups
        .iter()
        .copied()
        .filter(|backup| !keep.contains(backup))
        .collect()
}

/// Date-only variant of [`to_keep`].
///
/// Rejects policies with a non-zero hours, minutes, or seconds count,
/// since a calendar date carries no time of day. Each date is bucketed at
/// its implicit midnight instant.
pub fn dates_to_keep(backups: &[NaiveDate], policy: &RetentionPolicy) -> Result<HashSet<NaiveDate>> {
    policy.validate_for_dates()?;
    let now = resolve_now(policy);
    let instants = backups.iter().map(|date| date.and_time(NaiveTime::MIN));
    Ok(keep_instants(instants, policy, now)
        .into_iter()
        .map(|instant| instant.date())
        .collect())
}

/// Date-only variant of [`to_delete`].
pub fn dates_to_delete(
    backups: &[NaiveDate],
    policy: &RetentionPolicy,
) -> Result<HashSet<NaiveDate>> {
    let keep = dates_to_keep(backups, policy)?;
    Ok(backups
        .iter()
        .copied()
        .filter(|backup| !keep.contains(backup))
        .collect())
}

/// Union of per-tier representatives across every active tier.
fn keep_instants(
    backups: impl IntoIterator<Item = NaiveDateTime>,
    policy: &RetentionPolicy,
    now: NaiveDateTime,
) -> HashSet<NaiveDateTime> {
    let backups: Vec<NaiveDateTime> = backups.into_iter().collect();
    let mut keep = HashSet::new();
    for (tier, count) in policy.tiers() {
        if count == 0 {
            continue;
        }
        let retained = retained_for(tier, count, &backups, now, policy.first_weekday);
        debug!(%tier, count, retained = retained.len(), "tier bucketed");
        keep.extend(retained);
    }
    debug!(total = backups.len(), kept = keep.len(), "rotation done");
    keep
}

/// One tier of the rotation: bucket `backups` into the trailing `count`
/// periods of `tier` and keep the earliest backup of each occupied
/// period.
///
/// Period 0 is the period containing `now`; eligibility runs backward
/// from there. Backups after `now` and backups older than the window are
/// skipped; periods with no backup contribute nothing.
fn retained_for(
    tier: Granularity,
    count: u32,
    backups: &[NaiveDateTime],
    now: NaiveDateTime,
    week_start: Weekday,
) -> HashSet<NaiveDateTime> {
    if count == 0 {
        return HashSet::new();
    }

    let head = tier.floor(now, week_start);
    // Oldest period start still inside the window. None means the window
    // reaches past every representable instant, so only `now` bounds it.
    let window_start = tier.step_back(head, count - 1);

    let mut buckets: AHashMap<NaiveDateTime, NaiveDateTime> = AHashMap::new();
    for &backup in backups {
        if backup > now {
            continue;
        }
        if let Some(start) = window_start {
            if backup < start {
                continue;
            }
        }
        let period = tier.floor(backup, week_start);
        buckets
            .entry(period)
            .and_modify(|first| {
                if backup < *first {
                    *first = backup;
                }
            })
            .or_insert(backup);
    }

    buckets.into_values().collect()
}

fn resolve_now(policy: &RetentionPolicy) -> NaiveDateTime {
    // Read the clock once per call; a lazy read mid-pass could put the
    // tiers on different reference instants.
    policy.now.unwrap_or_else(|| Local::now().naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    fn date(y: i32, mo: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap()
    }

    #[test]
    fn test_zero_count_retains_nothing() {
        let backups = [dt(1999, 12, 30, 0, 0, 0), dt(1999, 12, 31, 0, 0, 0)];
        let retained = retained_for(
            Granularity::Days,
            0,
            &backups,
            dt(1999, 12, 31, 12, 0, 0),
            Weekday::Sat,
        );
        assert!(retained.is_empty());
    }

    #[test]
    fn test_earliest_backup_represents_the_period() {
        let backups = [
            dt(1999, 12, 31, 8, 0, 0),
            dt(1999, 12, 31, 3, 0, 0),
            dt(1999, 12, 31, 20, 0, 0),
        ];
        let retained = retained_for(
            Granularity::Days,
            1,
            &backups,
            dt(1999, 12, 31, 23, 0, 0),
            Weekday::Sat,
        );
        assert_eq!(retained, HashSet::from([dt(1999, 12, 31, 3, 0, 0)]));
    }

    #[test]
    fn test_window_excludes_older_periods() {
        let backups = [
            dt(1999, 12, 24, 0, 0, 0),
            dt(1999, 12, 25, 0, 0, 0),
            dt(1999, 12, 31, 0, 0, 0),
        ];
        let retained = retained_for(
            Granularity::Days,
            7,
            &backups,
            dt(1999, 12, 31, 0, 0, 0),
            Weekday::Sat,
        );
        // 1999-12-24 sits in the eighth day back, outside a 7-day window
        assert_eq!(
            retained,
            HashSet::from([dt(1999, 12, 25, 0, 0, 0), dt(1999, 12, 31, 0, 0, 0)])
        );
    }

    #[test]
    fn test_future_backups_are_never_retained() {
        let now = dt(1999, 12, 31, 12, 0, 0);
        let backups = [
            dt(1999, 12, 31, 6, 0, 0),
            dt(1999, 12, 31, 18, 0, 0),
            dt(2000, 1, 1, 0, 0, 0),
        ];
        let retained = retained_for(Granularity::Days, 2, &backups, now, Weekday::Sat);
        assert_eq!(retained, HashSet::from([dt(1999, 12, 31, 6, 0, 0)]));

        let policy = RetentionPolicy::new().with_days(2).with_now(now);
        let keep = to_keep(&backups, &policy);
        assert!(keep.iter().all(|backup| *backup <= now));
    }

    #[test]
    fn test_now_period_is_always_eligible() {
        // A backup sharing `now`'s period but later in it is still bucketed
        let now = dt(1999, 12, 31, 12, 0, 0);
        let backups = [dt(1999, 12, 31, 1, 0, 0)];
        let retained = retained_for(Granularity::Months, 1, &backups, now, Weekday::Sat);
        assert_eq!(retained, HashSet::from([dt(1999, 12, 31, 1, 0, 0)]));
    }

    #[test]
    fn test_huge_count_saturates_to_unbounded_window() {
        let backups = [dt(1901, 1, 1, 0, 0, 0), dt(1999, 12, 31, 0, 0, 0)];
        let retained = retained_for(
            Granularity::Years,
            u32::MAX,
            &backups,
            dt(1999, 12, 31, 0, 0, 0),
            Weekday::Sat,
        );
        assert_eq!(retained.len(), 2);
    }

    #[test]
    fn test_tiers_overlap_in_the_union() {
        // Daily and weekly tiers both elect 1999-12-25; the union holds it once
        let backups: Vec<NaiveDateTime> = (1..=31)
            .map(|day| dt(1999, 12, day, 0, 0, 0))
            .collect();
        let policy = RetentionPolicy::new()
            .with_days(7)
            .with_weeks(1)
            .with_now(dt(1999, 12, 31, 0, 0, 0));
        let keep = to_keep(&backups, &policy);
        let expected: HashSet<NaiveDateTime> =
            (25..=31).map(|day| dt(1999, 12, day, 0, 0, 0)).collect();
        assert_eq!(keep, expected);
    }

    #[test]
    fn test_to_delete_is_the_complement() {
        let backups: Vec<NaiveDateTime> = (1..=31)
            .map(|day| dt(1999, 12, day, 0, 0, 0))
            .collect();
        let policy = RetentionPolicy::new()
            .with_days(3)
            .with_now(dt(1999, 12, 31, 0, 0, 0));

        let keep = to_keep(&backups, &policy);
        let delete = to_delete(&backups, &policy);

        assert!(keep.is_disjoint(&delete));
        let mut all: Vec<NaiveDateTime> = keep.union(&delete).copied().collect();
        all.sort_unstable();
        assert_eq!(all, backups);
    }

    #[test]
    fn test_empty_input_yields_empty_partition() {
        let policy = RetentionPolicy::new()
            .with_days(7)
            .with_now(dt(1999, 12, 31, 0, 0, 0));
        assert!(to_keep(&[], &policy).is_empty());
        assert!(to_delete(&[], &policy).is_empty());
    }

    #[test]
    fn test_duplicate_backups_collapse() {
        let backups = [
            dt(1999, 12, 31, 0, 0, 0),
            dt(1999, 12, 31, 0, 0, 0),
            dt(1999, 12, 30, 0, 0, 0),
        ];
        let policy = RetentionPolicy::new()
            .with_days(1)
            .with_now(dt(1999, 12, 31, 0, 0, 0));
        assert_eq!(
            to_keep(&backups, &policy),
            HashSet::from([dt(1999, 12, 31, 0, 0, 0)])
        );
        assert_eq!(
            to_delete(&backups, &policy),
            HashSet::from([dt(1999, 12, 30, 0, 0, 0)])
        );
    }

    #[test]
    fn test_dates_reject_sub_daily_policies() {
        let backups = [date(1999, 12, 31)];
        let policy = RetentionPolicy::new().with_days(7).with_seconds(10);
        assert!(dates_to_keep(&backups, &policy).is_err());
        assert!(dates_to_delete(&backups, &policy).is_err());
    }

    #[test]
    fn test_dates_round_trip_through_midnight() -> anyhow::Result<()> {
        let backups: Vec<NaiveDate> = (1..=31).map(|day| date(1999, 12, day)).collect();
        let policy = RetentionPolicy::new()
            .with_days(2)
            .with_now(dt(1999, 12, 31, 0, 0, 0));

        let keep = dates_to_keep(&backups, &policy)?;
        assert_eq!(keep, HashSet::from([date(1999, 12, 30), date(1999, 12, 31)]));

        let delete = dates_to_delete(&backups, &policy)?;
        assert_eq!(keep.len() + delete.len(), backups.len());
        Ok(())
    }
}
