//! Recurrence rules for repeating events.
//!
//! A [`RecurrenceRule`] is the typed form of the repetition pattern the web layer
//! stores as a flat JSON object. Frequency-specific selectors live inside the
//! [`Frequency`] variant they apply to, so a daily rule cannot carry weekdays and a
//! monthly rule cannot carry a weekday set.
//!
//! The flat JSON shape is still what goes over the wire: the rule (de)serializes
//! through [`RawRecurrenceRule`], and every conversion from the raw form is validated.

mod describe;
mod expand;

pub use describe::{describe, describe_from, ordinal};
pub use expand::{Occurrences, expand, expand_in};

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_OCCURRENCES;
use crate::error::{CalDropError, CalDropResult};

/// Weekdays indexed Sunday=0 through Saturday=6, the numbering used on the wire.
pub(crate) const SUNDAY_FIRST: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// A validated repetition pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRecurrenceRule", into = "RawRecurrenceRule")]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    /// Every N days/weeks/months
    pub interval: u32,
    pub end: RecurrenceEnd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    /// An empty set means "the weekday of the series start".
    Weekly { days: WeekdaySet },
    /// `None` means "the day-of-month of the series start". Days past the end of a
    /// shorter month are clamped to its last day.
    Monthly { day_of_month: Option<u32> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceEnd {
    /// Stop after this many occurrences (still capped at [`MAX_OCCURRENCES`])
    After(u32),
    /// Stop after the last occurrence falling on or before this date
    Until(NaiveDate),
}

impl RecurrenceRule {
    pub fn daily(interval: u32, end: RecurrenceEnd) -> Self {
        RecurrenceRule {
            frequency: Frequency::Daily,
            interval,
            end,
        }
    }

    pub fn weekly(interval: u32, days: WeekdaySet, end: RecurrenceEnd) -> Self {
        RecurrenceRule {
            frequency: Frequency::Weekly { days },
            interval,
            end,
        }
    }

    pub fn monthly(interval: u32, day_of_month: Option<u32>, end: RecurrenceEnd) -> Self {
        RecurrenceRule {
            frequency: Frequency::Monthly { day_of_month },
            interval,
            end,
        }
    }

    pub fn validate(&self) -> CalDropResult<()> {
        if self.interval < 1 {
            return Err(CalDropError::validation(format!(
                "interval must be at least 1, got {}",
                self.interval
            )));
        }

        if let Frequency::Monthly {
            day_of_month: Some(day),
        } = self.frequency
        {
            validate_day_of_month(day)?;
        }

        if let RecurrenceEnd::After(0) = self.end {
            return Err(CalDropError::validation("endAfterCount must be at least 1"));
        }

        Ok(())
    }

    /// Upper bound on the number of occurrences this rule can produce.
    pub fn max_occurrences(&self) -> usize {
        match self.end {
            RecurrenceEnd::After(count) => (count as usize).min(MAX_OCCURRENCES),
            RecurrenceEnd::Until(_) => MAX_OCCURRENCES,
        }
    }
}

fn validate_day_of_month(day: u32) -> CalDropResult<()> {
    if (1..=31).contains(&day) {
        Ok(())
    } else {
        Err(CalDropError::validation(format!(
            "dayOfMonth must be between 1 and 31, got {}",
            day
        )))
    }
}

/// A set of weekdays, iterated Sunday first.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(day: Weekday) -> Self {
        let mut set = Self::new();
        set.insert(day);
        set
    }

    /// Build a set from wire indices (Sunday=0 .. Saturday=6).
    pub fn from_indices<I>(indices: I) -> CalDropResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<i64>,
    {
        let mut set = Self::new();
        for index in indices {
            let index = index.into();
            let day = usize::try_from(index)
                .ok()
                .and_then(|i| SUNDAY_FIRST.get(i))
                .ok_or_else(|| {
                    CalDropError::validation(format!(
                        "daysOfWeek values must be between 0 and 6, got {}",
                        index
                    ))
                })?;
            set.insert(*day);
        }
        Ok(set)
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_sunday();
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_sunday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Selected days in ascending order, Sunday first.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        SUNDAY_FIRST.into_iter().filter(|day| self.contains(*day))
    }

    pub fn indices(&self) -> Vec<u8> {
        self.iter().map(|day| day.num_days_from_sunday() as u8).collect()
    }

    /// The set itself, or the start's weekday when nothing was selected.
    pub fn or_weekday_of(&self, start: NaiveDate) -> WeekdaySet {
        use chrono::Datelike;

        if self.is_empty() {
            WeekdaySet::single(start.weekday())
        } else {
            *self
        }
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = WeekdaySet::new();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl fmt::Debug for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// The flat rule shape stored by the web layer.
///
/// Every field is kept loose (strings, signed integers) so that malformed input
/// reaches validation and produces a descriptive error instead of a serde one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecurrenceRule {
    pub frequency: String,
    #[serde(default = "default_interval")]
    pub interval: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<i64>,
    pub end_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_after_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_until_date: Option<String>,
}

fn default_interval() -> i64 {
    1
}

impl TryFrom<RawRecurrenceRule> for RecurrenceRule {
    type Error = CalDropError;

    fn try_from(raw: RawRecurrenceRule) -> CalDropResult<Self> {
        let interval = u32::try_from(raw.interval)
            .ok()
            .filter(|interval| *interval >= 1)
            .ok_or_else(|| {
                CalDropError::validation(format!(
                    "interval must be at least 1, got {}",
                    raw.interval
                ))
            })?;

        // Selectors are checked even when the frequency ignores them
        let days = raw
            .days_of_week
            .map(WeekdaySet::from_indices)
            .transpose()?
            .unwrap_or_default();
        let day_of_month = match raw.day_of_month {
            Some(day) => {
                let day = u32::try_from(day).map_err(|_| {
                    CalDropError::validation(format!(
                        "dayOfMonth must be between 1 and 31, got {}",
                        day
                    ))
                })?;
                validate_day_of_month(day)?;
                Some(day)
            }
            None => None,
        };

        let frequency = match raw.frequency.to_ascii_lowercase().as_str() {
            "daily" => Frequency::Daily,
            "weekly" => Frequency::Weekly { days },
            "monthly" => Frequency::Monthly { day_of_month },
            other => {
                return Err(CalDropError::configuration(format!(
                    "unknown recurrence frequency '{}'",
                    other
                )));
            }
        };

        let end = match raw.end_type.to_ascii_lowercase().as_str() {
            "after" => {
                let count = raw.end_after_count.ok_or_else(|| {
                    CalDropError::validation("endAfterCount is required when endType is 'after'")
                })?;
                let count = u32::try_from(count)
                    .ok()
                    .filter(|count| *count >= 1)
                    .ok_or_else(|| {
                        CalDropError::validation(format!(
                            "endAfterCount must be at least 1, got {}",
                            count
                        ))
                    })?;
                RecurrenceEnd::After(count)
            }
            "until" => {
                let date = raw.end_until_date.ok_or_else(|| {
                    CalDropError::validation("endUntilDate is required when endType is 'until'")
                })?;
                RecurrenceEnd::Until(parse_until_date(&date)?)
            }
            other => {
                return Err(CalDropError::configuration(format!(
                    "unknown recurrence end type '{}'",
                    other
                )));
            }
        };

        Ok(RecurrenceRule {
            frequency,
            interval,
            end,
        })
    }
}

impl From<RecurrenceRule> for RawRecurrenceRule {
    fn from(rule: RecurrenceRule) -> Self {
        let (frequency, days_of_week, day_of_month) = match rule.frequency {
            Frequency::Daily => ("daily", None, None),
            Frequency::Weekly { days } => (
                "weekly",
                Some(days.indices().into_iter().map(i64::from).collect()),
                None,
            ),
            Frequency::Monthly { day_of_month } => ("monthly", None, day_of_month.map(i64::from)),
        };

        let (end_type, end_after_count, end_until_date) = match rule.end {
            RecurrenceEnd::After(count) => ("after", Some(i64::from(count)), None),
            RecurrenceEnd::Until(date) => {
                ("until", None, Some(date.format("%Y-%m-%d").to_string()))
            }
        };

        RawRecurrenceRule {
            frequency: frequency.to_string(),
            interval: i64::from(rule.interval),
            days_of_week,
            day_of_month,
            end_type: end_type.to_string(),
            end_after_count,
            end_until_date,
        }
    }
}

/// Parse an until date given either as `YYYY-MM-DD` or as a full RFC 3339 timestamp.
pub fn parse_until_date(s: &str) -> CalDropResult<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc).date_naive()))
        .map_err(|_| {
            CalDropError::validation(format!(
                "invalid endUntilDate '{}'. Expected YYYY-MM-DD",
                s
            ))
        })
}
