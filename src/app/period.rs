//! Report period expressions.
//!
//! A period is written as `<number>d` (that many days back from now) or
//! `<number>m` (that many whole calendar months back from the first of the
//! current month, ending at the first of the current month).

#![warn(clippy::all, rust_2018_idioms)]

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::ReportError;

static PERIOD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)([dm])$").expect("period pattern is valid"));

/// Time window for the health event query. Events whose start time falls inside
/// `[start, end]` are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Parsed `--period` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    Days(u32),
    Months(u32),
}

impl ReportPeriod {
    pub fn parse(expression: &str) -> Result<Self, ReportError> {
        let invalid = || {
            ReportError::config(format!(
                "Wrong report period '{}'. Period must be in the form <number>m|d e.g 30d for last 30 days or 1m for the last month",
                expression
            ))
        };

        let captures = PERIOD_PATTERN.captures(expression.trim()).ok_or_else(invalid)?;
        let amount: u32 = captures[1].parse().map_err(|_| invalid())?;

        match &captures[2] {
            "d" => Ok(ReportPeriod::Days(amount)),
            "m" => Ok(ReportPeriod::Months(amount)),
            _ => Err(invalid()),
        }
    }

    /// Resolve the period against `now`.
    pub fn window(&self, now: DateTime<Utc>) -> Result<TimeWindow, ReportError> {
        match *self {
            ReportPeriod::Days(days) => {
                let start = Duration::try_days(i64::from(days))
                    .and_then(|span| now.checked_sub_signed(span))
                    .ok_or_else(|| ReportError::config(format!("{} days is out of range", days)))?;
                Ok(TimeWindow { start, end: now })
            }
            ReportPeriod::Months(months) => {
                let current_month = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
                    .ok_or_else(|| ReportError::config("Current date has no first day"))?;
                let first_month = current_month
                    .checked_sub_months(Months::new(months))
                    .ok_or_else(|| {
                        ReportError::config(format!("{} months is out of range", months))
                    })?;

                Ok(TimeWindow {
                    start: midnight_utc(first_month),
                    end: midnight_utc(current_month),
                })
            }
        }
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}
