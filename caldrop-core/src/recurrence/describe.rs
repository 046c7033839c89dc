//! Human-readable summaries of recurrence rules, for previews.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::recurrence::{Frequency, RecurrenceEnd, RecurrenceRule, WeekdaySet};

/// Describe a rule on its own, e.g. "Repeats every 2 weeks on Monday, Wednesday, 6 times".
///
/// Without a start date, defaults that depend on the start are left out ("every week").
pub fn describe(rule: &RecurrenceRule) -> String {
    describe_rule(rule, None)
}

/// Describe a rule for a series starting on `start` (a local date).
///
/// Resolves the same defaults expansion uses: the start's weekday for weekly rules
/// without days, the start's day-of-month for monthly rules without one.
pub fn describe_from(rule: &RecurrenceRule, start: NaiveDate) -> String {
    describe_rule(rule, Some(start))
}

fn describe_rule(rule: &RecurrenceRule, start: Option<NaiveDate>) -> String {
    let mut desc = String::from("Repeats ");
    let n = rule.interval;

    match &rule.frequency {
        Frequency::Daily => {
            if n == 1 {
                desc.push_str("every day");
            } else {
                desc.push_str(&format!("every {} days", n));
            }
        }
        Frequency::Weekly { days } => {
            let days = match start {
                Some(start) => days.or_weekday_of(start),
                None => *days,
            };
            let names = weekday_names(&days);
            match (n, names.is_empty()) {
                (1, true) => desc.push_str("every week"),
                (1, false) => desc.push_str(&format!("every {}", names)),
                (_, true) => desc.push_str(&format!("every {} weeks", n)),
                (_, false) => desc.push_str(&format!("every {} weeks on {}", n, names)),
            }
        }
        Frequency::Monthly { day_of_month } => {
            let day = day_of_month.or_else(|| start.map(|s| s.day()));
            if n == 1 {
                desc.push_str("every month");
            } else {
                desc.push_str(&format!("every {} months", n));
            }
            if let Some(day) = day {
                desc.push_str(&format!(" on the {}", ordinal(day)));
                if day > 28 {
                    desc.push_str(" (or the last day of shorter months)");
                }
            }
        }
    }

    match rule.end {
        RecurrenceEnd::After(1) => desc.push_str(", 1 time"),
        RecurrenceEnd::After(count) => desc.push_str(&format!(", {} times", count)),
        RecurrenceEnd::Until(date) => {
            desc.push_str(&format!(" until {}", date.format("%b %-d, %Y")));
        }
    }

    desc
}

fn weekday_names(days: &WeekdaySet) -> String {
    days.iter().map(full_name).collect::<Vec<_>>().join(", ")
}

fn full_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "Sunday",
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
    }
}

/// English ordinal: 1st, 2nd, 3rd, 4th, 11th, 12th, 13th, 21st, ...
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}
