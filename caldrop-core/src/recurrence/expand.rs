//! Occurrence expansion for recurrence rules.
//!
//! Expansion is lazy: [`Occurrences`] yields one [`Occurrence`] at a time and stops
//! at the rule's end condition or the [`MAX_OCCURRENCES`] ceiling, whichever comes
//! first. The iterator is `Clone`, so a series can be walked again from the start.
//!
//! Date arithmetic happens on the wall clock of the series timezone: a weekly
//! 19:00 event stays at 19:00 local time across a DST change.

use std::iter::FusedIterator;

use chrono::{
    DateTime, Datelike, Days, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone, Utc, Weekday,
};
use chrono_tz::Tz;

use crate::constants::MAX_OCCURRENCES;
use crate::error::CalDropResult;
use crate::event::{Occurrence, validate_span};
use crate::recurrence::{Frequency, RecurrenceEnd, RecurrenceRule};

/// Expand a rule in UTC.
pub fn expand(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    rule: &RecurrenceRule,
) -> CalDropResult<Occurrences> {
    expand_in(start, end, rule, chrono_tz::UTC)
}

/// Expand a rule on the wall clock of `tz`.
///
/// Fails with a validation error if the rule is malformed or `end` is not after `start`.
pub fn expand_in(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    rule: &RecurrenceRule,
    tz: Tz,
) -> CalDropResult<Occurrences> {
    rule.validate()?;
    validate_span(start, end)?;

    let local = start.with_timezone(&tz).naive_local();
    let start_date = local.date();
    let interval = u64::from(rule.interval);

    let cursor = match &rule.frequency {
        Frequency::Daily => Cursor::Daily {
            next: Some(start_date),
            step: interval,
        },
        Frequency::Weekly { days } => {
            let days: Vec<Weekday> = days.or_weekday_of(start_date).iter().collect();
            let offset = u64::from(start_date.weekday().num_days_from_sunday());
            Cursor::Weekly {
                week: start_date.checked_sub_days(Days::new(offset)),
                days,
                index: 0,
                not_before: start_date,
                step: interval * 7,
            }
        }
        Frequency::Monthly { day_of_month } => Cursor::Monthly {
            first_month: i64::from(start_date.year()) * 12 + i64::from(start_date.month0()),
            k: 0,
            step: i64::from(rule.interval),
            day: day_of_month.unwrap_or(start_date.day()),
        },
    };

    if let RecurrenceEnd::After(count) = rule.end {
        if count as usize > MAX_OCCURRENCES {
            tracing::debug!(
                requested = count,
                limit = MAX_OCCURRENCES,
                "capping recurring series at the occurrence ceiling"
            );
        }
    }

    Ok(Occurrences {
        cursor,
        time: local.time(),
        tz,
        duration: end.map(|end| end - start),
        until: match rule.end {
            RecurrenceEnd::Until(date) => Some(date),
            RecurrenceEnd::After(_) => None,
        },
        remaining: rule.max_occurrences(),
    })
}

/// Lazy, finite sequence of occurrences for one series.
#[derive(Debug, Clone)]
pub struct Occurrences {
    cursor: Cursor,
    time: NaiveTime,
    tz: Tz,
    duration: Option<Duration>,
    until: Option<NaiveDate>,
    remaining: usize,
}

#[derive(Debug, Clone)]
enum Cursor {
    Daily {
        next: Option<NaiveDate>,
        step: u64,
    },
    Weekly {
        /// Sunday of the week being walked
        week: Option<NaiveDate>,
        days: Vec<Weekday>,
        index: usize,
        not_before: NaiveDate,
        step: u64,
    },
    Monthly {
        /// Months since year 0 of the series start
        first_month: i64,
        k: i64,
        step: i64,
        day: u32,
    },
}

impl Cursor {
    fn next_date(&mut self) -> Option<NaiveDate> {
        match self {
            Cursor::Daily { next, step } => {
                let date = (*next)?;
                *next = date.checked_add_days(Days::new(*step));
                Some(date)
            }
            Cursor::Weekly {
                week,
                days,
                index,
                not_before,
                step,
            } => loop {
                let sunday = (*week)?;
                let Some(day) = days.get(*index) else {
                    *index = 0;
                    *week = sunday.checked_add_days(Days::new(*step));
                    continue;
                };
                *index += 1;

                let candidate =
                    sunday.checked_add_days(Days::new(u64::from(day.num_days_from_sunday())))?;
                // Partial first week: skip selected days before the series start
                if candidate < *not_before {
                    continue;
                }
                return Some(candidate);
            },
            Cursor::Monthly {
                first_month,
                k,
                step,
                day,
            } => {
                let month_index = k.checked_mul(*step)?.checked_add(*first_month)?;
                *k += 1;
                let year = i32::try_from(month_index.div_euclid(12)).ok()?;
                let month = u32::try_from(month_index.rem_euclid(12)).ok()? + 1;
                let day = (*day).min(days_in_month(year, month)?);
                NaiveDate::from_ymd_opt(year, month, day)
            }
        }
    }
}

impl Iterator for Occurrences {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        if self.remaining == 0 {
            return None;
        }

        let Some(date) = self.cursor.next_date() else {
            self.remaining = 0;
            return None;
        };

        if self.until.is_some_and(|until| date > until) {
            self.remaining = 0;
            return None;
        }

        let Some(start) = resolve_local(self.tz, date.and_time(self.time)) else {
            self.remaining = 0;
            return None;
        };

        self.remaining -= 1;
        if self.remaining == 0 && self.until.is_some() {
            tracing::trace!(%start, "occurrence ceiling reached before the until date");
        }

        Some(Occurrence {
            start_time: start,
            end_time: self.duration.map(|duration| start + duration),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl FusedIterator for Occurrences {}

/// Number of days in the given month, `None` if the month is out of chrono's range.
pub(crate) fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = first.checked_add_months(chrono::Months::new(1))?;
    Some(next_first.signed_duration_since(first).num_days() as u32)
}

/// Map a wall-clock time in `tz` to an instant.
///
/// Ambiguous times (DST fall-back) take the earlier instant. Times inside a DST gap
/// are read with the offset in force before the gap, which moves them forward by
/// the gap length (02:30 becomes 03:30 on a one hour spring-forward).
fn resolve_local(tz: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => {
            let before = tz
                .from_local_datetime(&(local - Duration::hours(3)))
                .earliest()?;
            let offset = before.offset().fix().local_minus_utc();
            let utc = local - Duration::seconds(i64::from(offset));
            Some(utc.and_utc())
        }
    }
}
