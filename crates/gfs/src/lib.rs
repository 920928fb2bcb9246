//! Grandfather-father-son backup rotation
//!
//! This crate provides:
//! - Tiered retention policies (seconds through years, one count per tier)
//! - Calendar-aware period bucketing with a configurable week anchor
//! - Keep/delete partitioning of backup timestamps
//!
//! The library only decides. It never touches storage: callers map the
//! returned timestamps back to their backup artifacts and do any deletion
//! themselves.
//!
//! # Example
//!
//! Daily backups for all of 1999, rotated on New Year's Eve down to a week
//! of dailies, a month of Saturday fulls, and a quarter of monthly fulls:
//!
//! ```
//! use chrono::NaiveDate;
//! use gfs::{RetentionPolicy, Weekday};
//!
//! let backups: Vec<NaiveDate> = (1..=365)
//!     .map(|day| NaiveDate::from_yo_opt(1999, day).unwrap())
//!     .collect();
//!
//! let policy = RetentionPolicy::new()
//!     .with_days(7)
//!     .with_weeks(4)
//!     .with_months(3)
//!     .with_first_weekday(Weekday::Sat)
//!     .with_now(NaiveDate::from_ymd_opt(1999, 12, 31).unwrap().and_hms_opt(0, 0, 0).unwrap());
//!
//! let keep = gfs::dates_to_keep(&backups, &policy)?;
//! assert_eq!(keep.len(), 13);
//!
//! let delete = gfs::dates_to_delete(&backups, &policy)?;
//! assert_eq!(keep.len() + delete.len(), backups.len());
//! # Ok::<(), gfs::PolicyError>(())
//! ```

pub mod granularity;
pub mod policy;
pub mod rotate;

// Re-exports
pub use chrono::Weekday;
pub use granularity::Granularity;
pub use policy::{PolicyError, RetentionPolicy, DEFAULT_FIRST_WEEKDAY};
pub use rotate::{dates_to_delete, dates_to_keep, to_delete, to_keep};

/// Result type for policy validation
pub type Result<T> = std::result::Result<T, PolicyError>;
