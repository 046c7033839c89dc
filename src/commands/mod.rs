pub mod describe;
pub mod expand;
pub mod feed;
pub mod ics;
pub mod link;
pub mod slug;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use caldrop_core::recurrence::RawRecurrenceRule;
use caldrop_core::{ReminderSet, RecurrenceRule};
use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use clap::{Args, ValueEnum};
use serde::de::DeserializeOwned;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Freq {
    Daily,
    Weekly,
    Monthly,
}

impl Freq {
    fn as_str(&self) -> &'static str {
        match self {
            Freq::Daily => "daily",
            Freq::Weekly => "weekly",
            Freq::Monthly => "monthly",
        }
    }
}

/// A recurrence rule, either from a JSON file or spelled out with flags.
#[derive(Args, Debug, Clone, Default)]
pub struct RuleArgs {
    /// JSON file with the rule in its stored shape (frequency, interval, daysOfWeek, ...)
    #[arg(long, conflicts_with_all = ["freq", "days", "day_of_month", "count", "until"])]
    pub rule: Option<PathBuf>,

    /// How often the event repeats
    #[arg(long, value_enum)]
    pub freq: Option<Freq>,

    /// Repeat every N days/weeks/months
    #[arg(long, default_value_t = 1)]
    pub interval: u32,

    /// Weekdays for weekly rules (e.g. "mon,wed" or "1,3")
    #[arg(long, value_delimiter = ',')]
    pub days: Vec<String>,

    /// Day of the month for monthly rules (1-31)
    #[arg(long)]
    pub day_of_month: Option<u32>,

    /// Stop after this many occurrences
    #[arg(long, conflicts_with = "until")]
    pub count: Option<u32>,

    /// Stop after this date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub until: Option<String>,
}

impl RuleArgs {
    pub fn to_rule(&self) -> Result<RecurrenceRule> {
        if let Some(ref path) = self.rule {
            return read_json(path);
        }

        let freq = self
            .freq
            .ok_or_else(|| anyhow::anyhow!("Either --rule <file> or --freq is required"))?;

        let days_of_week = if self.days.is_empty() {
            None
        } else {
            Some(
                self.days
                    .iter()
                    .map(|d| weekday_index(d))
                    .collect::<Result<Vec<i64>>>()?,
            )
        };

        let (end_type, end_after_count, end_until_date) = match (self.count, &self.until) {
            (_, Some(until)) => ("until", None, Some(until.clone())),
            (Some(count), None) => ("after", Some(i64::from(count)), None),
            (None, None) => anyhow::bail!("Either --count or --until is required"),
        };

        let raw = RawRecurrenceRule {
            frequency: freq.as_str().to_string(),
            interval: i64::from(self.interval),
            days_of_week,
            day_of_month: self.day_of_month.map(i64::from),
            end_type: end_type.to_string(),
            end_after_count,
            end_until_date,
        };

        Ok(RecurrenceRule::try_from(raw)?)
    }
}

/// Sunday=0 .. Saturday=6, from a name ("tue", "Tuesday") or a number.
fn weekday_index(input: &str) -> Result<i64> {
    let input = input.trim().to_ascii_lowercase();
    if let Ok(n) = input.parse::<i64>() {
        return Ok(n);
    }

    let index = match input.as_str() {
        "sun" | "sunday" => 0,
        "mon" | "monday" => 1,
        "tue" | "tuesday" => 2,
        "wed" | "wednesday" => 3,
        "thu" | "thursday" => 4,
        "fri" | "friday" => 5,
        "sat" | "saturday" => 6,
        _ => anyhow::bail!("Unknown weekday '{}'", input),
    };
    Ok(index)
}

/// Parse a start/end time: RFC 3339, or a local `YYYY-MM-DDTHH:MM` (or date) in `tz`.
pub fn parse_datetime(input: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Could not parse date/time: \"{}\". Expected RFC 3339 or YYYY-MM-DDTHH:MM",
                input
            )
        })?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Ok(dt.with_timezone(&Utc)),
        LocalResult::None => anyhow::bail!("{} does not exist in {} (DST gap)", naive, tz),
    }
}

/// Reminder offsets from humantime durations ("1h", "1day", "15m").
pub fn parse_reminders(inputs: &[String]) -> Result<ReminderSet> {
    inputs
        .iter()
        .map(|input| {
            let duration = humantime::parse_duration(input)
                .map_err(|e| anyhow::anyhow!("Invalid reminder '{}': {}", input, e))?;
            u32::try_from(duration.as_secs() / 60)
                .with_context(|| format!("Reminder '{}' is too large", input))
        })
        .collect()
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Write to `output`, or to stdout when `None`.
pub fn write_output(output: Option<&Path>, contents: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, contents)
                .with_context(|| format!("Could not write {}", path.display()))?;
            tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote output");
        }
        None => print!("{}", contents),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use caldrop_core::{Frequency, RecurrenceEnd};

    fn args() -> RuleArgs {
        RuleArgs {
            interval: 1,
            ..Default::default()
        }
    }

    #[test]
    fn rule_from_flags() {
        let rule = RuleArgs {
            freq: Some(Freq::Weekly),
            days: vec!["mon".into(), "Wednesday".into()],
            count: Some(4),
            ..args()
        }
        .to_rule()
        .unwrap();

        match rule.frequency {
            Frequency::Weekly { days } => assert_eq!(days.indices(), vec![1, 3]),
            other => panic!("Expected weekly, got {:?}", other),
        }
        assert_eq!(rule.end, RecurrenceEnd::After(4));
    }

    #[test]
    fn rule_requires_an_end() {
        let result = RuleArgs {
            freq: Some(Freq::Daily),
            ..args()
        }
        .to_rule();
        assert!(result.is_err());
    }

    #[test]
    fn rule_rejects_bad_weekday() {
        let result = RuleArgs {
            freq: Some(Freq::Weekly),
            days: vec!["someday".into()],
            count: Some(2),
            ..args()
        }
        .to_rule();
        assert!(result.is_err());

        let result = RuleArgs {
            freq: Some(Freq::Weekly),
            days: vec!["9".into()],
            count: Some(2),
            ..args()
        }
        .to_rule();
        assert!(result.is_err());
    }

    #[test]
    fn weekday_names_must_match_exactly() {
        assert_eq!(weekday_index("Sun").unwrap(), 0);
        assert_eq!(weekday_index(" saturday ").unwrap(), 6);
        assert_eq!(weekday_index("3").unwrap(), 3);

        for word in ["monkey", "wedge", "tues", "frida", "sundays"] {
            assert!(weekday_index(word).is_err(), "{} should not parse", word);
        }
    }

    #[test]
    fn datetime_rfc3339_and_local() {
        let utc = parse_datetime("2026-03-03T19:00:00Z", chrono_tz::UTC).unwrap();
        assert_eq!(utc, Utc.with_ymd_and_hms(2026, 3, 3, 19, 0, 0).unwrap());

        let local = parse_datetime("2026-03-03T14:00", chrono_tz::America::New_York).unwrap();
        assert_eq!(local, utc);

        assert!(parse_datetime("next tuesday", chrono_tz::UTC).is_err());
    }

    #[test]
    fn reminders_from_humantime() {
        let reminders = parse_reminders(&["1h".into(), "1day".into(), "15m".into()]).unwrap();
        assert_eq!(reminders.iter().collect::<Vec<_>>(), vec![15, 60, 1440]);
        assert!(parse_reminders(&["soon".into()]).is_err());
    }
}
