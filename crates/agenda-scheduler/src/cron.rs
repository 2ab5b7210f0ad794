//! Cron expression parser.
//!
//! Accepts `MIN HOUR DOM MON DOW` (5 fields) or `SEC MIN HOUR DOM MON DOW`
//! (6 fields). Each field takes `*`, `?`, `N`, `A-B`, `*/N`, `A-B/N`, `N/S`
//! and comma lists of those. Months and weekdays also accept three-letter
//! names (`JAN`, `MON`, ...). Weekday 0 and 7 are both Sunday.
//!
//! Example: `0 */2 * * * *` = every two minutes, on the minute.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use thiserror::Error;

/// Upper bound for the forward search; covers leap-day schedules across a skipped leap year.
const MAX_SEARCH_DAYS: u32 = 366 * 8;

const MONTH_NAMES: &[&str] = &[
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
const DAY_NAMES: &[&str] = &["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CronError {
    #[error("invalid cron expression '{expression}': expected 5 or 6 fields, got {found}")]
    FieldCount { expression: String, found: usize },

    #[error("invalid cron {field} field '{value}': {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },
}

struct FieldDef {
    name: &'static str,
    min: u32,
    max: u32,
    /// Names for `min`, `min + 1`, ...
    aliases: &'static [&'static str],
}

const SECONDS: FieldDef = FieldDef { name: "second", min: 0, max: 59, aliases: &[] };
const MINUTES: FieldDef = FieldDef { name: "minute", min: 0, max: 59, aliases: &[] };
const HOURS: FieldDef = FieldDef { name: "hour", min: 0, max: 23, aliases: &[] };
const DAYS_OF_MONTH: FieldDef = FieldDef { name: "day-of-month", min: 1, max: 31, aliases: &[] };
const MONTHS: FieldDef = FieldDef { name: "month", min: 1, max: 12, aliases: MONTH_NAMES };
const DAYS_OF_WEEK: FieldDef = FieldDef { name: "day-of-week", min: 0, max: 7, aliases: DAY_NAMES };

/// A parsed cron schedule. Fire times are local, naive date-times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    expression: String,
    seconds: u64,
    minutes: u64,
    hours: u64,
    days_of_month: u64,
    months: u64,
    days_of_week: u64,
    dom_restricted: bool,
    dow_restricted: bool,
}

impl CronSchedule {
    pub fn parse(expression: &str) -> Result<Self, CronError> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        let (sec, rest) = match fields.len() {
            5 => ("0", &fields[..]),
            6 => (fields[0], &fields[1..]),
            found => {
                return Err(CronError::FieldCount {
                    expression: expression.to_string(),
                    found,
                });
            }
        };

        let mut days_of_week = parse_field(rest[4], &DAYS_OF_WEEK)?;
        // 7 is an alias for Sunday
        if days_of_week & (1 << 7) != 0 {
            days_of_week = (days_of_week & !(1 << 7)) | 1;
        }

        Ok(Self {
            expression: fields.join(" "),
            seconds: parse_field(sec, &SECONDS)?,
            minutes: parse_field(rest[0], &MINUTES)?,
            hours: parse_field(rest[1], &HOURS)?,
            days_of_month: parse_field(rest[2], &DAYS_OF_MONTH)?,
            months: parse_field(rest[3], &MONTHS)?,
            days_of_week,
            dom_restricted: is_restricted(rest[2]),
            dow_restricted: is_restricted(rest[4]),
        })
    }

    /// The normalised expression text.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First fire time strictly after `after`.
    pub fn next_after(&self, after: NaiveDateTime) -> Option<NaiveDateTime> {
        let start = after.with_nanosecond(0)? + Duration::seconds(1);
        let mut date = start.date();
        for offset in 0..MAX_SEARCH_DAYS {
            if self.day_matches(date) {
                let from = if offset == 0 { start.time() } else { NaiveTime::MIN };
                if let Some(time) = self.first_time_from(from) {
                    return Some(date.and_time(time));
                }
            }
            date = date.succ_opt()?;
        }
        None
    }

    /// Whether `t` (to the second) is a fire time.
    pub fn matches(&self, t: NaiveDateTime) -> bool {
        self.day_matches(t.date())
            && has(self.hours, t.hour())
            && has(self.minutes, t.minute())
            && has(self.seconds, t.second())
    }

    fn day_matches(&self, date: NaiveDate) -> bool {
        if !has(self.months, date.month()) {
            return false;
        }
        let dom = has(self.days_of_month, date.day());
        let dow = has(self.days_of_week, date.weekday().num_days_from_sunday());
        // Classic cron: when both day fields are restricted either one may match.
        if self.dom_restricted && self.dow_restricted {
            dom || dow
        } else {
            dom && dow
        }
    }

    fn first_time_from(&self, from: NaiveTime) -> Option<NaiveTime> {
        for h in from.hour()..24 {
            if !has(self.hours, h) {
                continue;
            }
            let same_hour = h == from.hour();
            let m0 = if same_hour { from.minute() } else { 0 };
            for m in m0..60 {
                if !has(self.minutes, m) {
                    continue;
                }
                let s0 = if same_hour && m == from.minute() { from.second() } else { 0 };
                if let Some(s) = (s0..60).find(|s| has(self.seconds, *s)) {
                    return NaiveTime::from_hms_opt(h, m, s);
                }
            }
        }
        None
    }
}

impl FromStr for CronSchedule {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

fn has(set: u64, value: u32) -> bool {
    value < 64 && set & (1 << value) != 0
}

fn is_restricted(field: &str) -> bool {
    field != "*" && field != "?"
}

fn parse_field(field: &str, def: &FieldDef) -> Result<u64, CronError> {
    let invalid = |reason: String| CronError::InvalidField {
        field: def.name,
        value: field.to_string(),
        reason,
    };

    let mut bits = 0u64;
    for part in field.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => {
                let step: u32 = step
                    .parse()
                    .map_err(|_| invalid(format!("bad step '{step}'")))?;
                if step == 0 {
                    return Err(invalid("step must be positive".into()));
                }
                (range, Some(step))
            }
            None => (part, None),
        };

        let (lo, hi) = if range == "*" || range == "?" {
            (def.min, def.max)
        } else if let Some((a, b)) = range.split_once('-') {
            (parse_value(a, def).map_err(&invalid)?, parse_value(b, def).map_err(&invalid)?)
        } else {
            let v = parse_value(range, def).map_err(&invalid)?;
            // `N/S` runs from N to the end of the range
            (v, if step.is_some() { def.max } else { v })
        };

        if lo > hi {
            return Err(invalid(format!("range {lo}-{hi} is reversed")));
        }
        for v in (lo..=hi).step_by(step.unwrap_or(1) as usize) {
            bits |= 1 << v;
        }
    }
    Ok(bits)
}

fn parse_value(raw: &str, def: &FieldDef) -> Result<u32, String> {
    let value = match raw.parse::<u32>() {
        Ok(v) => v,
        Err(_) => def
            .aliases
            .iter()
            .position(|name| name.eq_ignore_ascii_case(raw))
            .map(|i| def.min + i as u32)
            .ok_or_else(|| format!("'{raw}' is not a number"))?,
    };
    if value < def.min || value > def.max {
        return Err(format!("{value} is outside {}-{}", def.min, def.max));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_every_two_minutes_with_seconds_field() {
        let cron = CronSchedule::parse("0 */2 * * * *").unwrap();
        let next = cron.next_after(at(2026, 10, 18, 10, 1, 30)).unwrap();
        assert_eq!(next, at(2026, 10, 18, 10, 2, 0));
        let next = cron.next_after(next).unwrap();
        assert_eq!(next, at(2026, 10, 18, 10, 4, 0));
    }

    #[test]
    fn test_next_is_strictly_after() {
        let cron = CronSchedule::parse("0 * * * *").unwrap();
        let next = cron.next_after(at(2026, 10, 18, 10, 0, 0)).unwrap();
        assert_eq!(next, at(2026, 10, 18, 11, 0, 0));
    }

    #[test]
    fn test_specific_time_rolls_over_midnight() {
        let cron = CronSchedule::parse("30 8 * * *").unwrap();
        let next = cron.next_after(at(2026, 12, 31, 9, 0, 0)).unwrap();
        assert_eq!(next, at(2027, 1, 1, 8, 30, 0));
    }

    #[test]
    fn test_weekday_names_and_ranges() {
        // 2026-10-18 is a Sunday
        let cron = CronSchedule::parse("0 9 * * MON-FRI").unwrap();
        let next = cron.next_after(at(2026, 10, 17, 12, 0, 0)).unwrap();
        assert_eq!(next, at(2026, 10, 19, 9, 0, 0));
    }

    #[test]
    fn test_sunday_as_seven() {
        let cron = CronSchedule::parse("0 0 * * 7").unwrap();
        assert!(cron.matches(at(2026, 10, 18, 0, 0, 0)));
    }

    #[test]
    fn test_day_fields_are_ored_when_both_restricted() {
        // the 1st of the month or any Monday
        let cron = CronSchedule::parse("0 0 1 * MON").unwrap();
        assert!(cron.matches(at(2026, 10, 19, 0, 0, 0)));
        assert!(cron.matches(at(2026, 11, 1, 0, 0, 0)));
        assert!(!cron.matches(at(2026, 10, 20, 0, 0, 0)));
    }

    #[test]
    fn test_lists_steps_and_month_names() {
        let cron = CronSchedule::parse("0 0,30 8-18/2 ? JAN,JUL *").unwrap();
        assert!(cron.matches(at(2027, 1, 5, 10, 30, 0)));
        assert!(!cron.matches(at(2027, 1, 5, 11, 30, 0)));
        assert!(!cron.matches(at(2027, 2, 5, 10, 30, 0)));
    }

    #[test]
    fn test_leap_day() {
        let cron = CronSchedule::parse("0 0 29 2 *").unwrap();
        let next = cron.next_after(at(2026, 3, 1, 0, 0, 0)).unwrap();
        assert_eq!(next, at(2028, 2, 29, 0, 0, 0));
    }

    #[test]
    fn test_invalid_expressions() {
        assert!(matches!(
            CronSchedule::parse("bad"),
            Err(CronError::FieldCount { found: 1, .. })
        ));
        assert!(CronSchedule::parse("61 * * * *").is_err());
        assert!(CronSchedule::parse("*/0 * * * *").is_err());
        assert!(CronSchedule::parse("0 20-10 * * *").is_err());
        assert!(CronSchedule::parse("0 0 * FOO *").is_err());
    }
}
