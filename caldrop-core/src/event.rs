//! Event templates, reminder sets and materialized occurrences.
//!
//! An [`Event`] is the caller-owned description of a single event (or the template
//! of a recurring series). It deserializes directly from the JSON rows the web
//! layer stores, so field names follow that camelCase shape.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_EVENT_MINUTES;
use crate::error::{CalDropError, CalDropResult};
use crate::ics::format_ics_utc;
use crate::recurrence::{self, Occurrences, RecurrenceRule};

/// A calendar event (or the template of a recurring series)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Stable identifier, used to derive the iCalendar UID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Event page or ticket link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub start_time: DateTime<Utc>,
    /// Absent means a one hour event wherever a duration is needed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Zone whose wall clock recurrence arithmetic follows (UTC when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<Tz>,
    /// `None` means "not specified": document builders fall back to their configured default.
    /// `Some` with an empty set means the event explicitly has no alarms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_minutes: Option<ReminderSet>,
    /// Template row of a stored series; its occurrences are stored as their own rows
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_recurring_parent: bool,
}

impl Event {
    pub fn new(title: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Event {
            id: None,
            title: title.into(),
            description: None,
            location: None,
            url: None,
            category: None,
            start_time,
            end_time: None,
            timezone: None,
            reminder_minutes: None,
            is_recurring_parent: false,
        }
    }

    /// Check the fields every consumer relies on: a non-empty title, an id and url
    /// without control characters and, when an end is given, a strictly positive
    /// duration.
    pub fn validate(&self) -> CalDropResult<()> {
        if self.title.trim().is_empty() {
            return Err(CalDropError::validation("event title is required"));
        }
        for (field, value) in [("id", &self.id), ("url", &self.url)] {
            if value.as_deref().is_some_and(|v| v.contains(char::is_control)) {
                return Err(CalDropError::validation(format!(
                    "event {} must not contain control characters",
                    field
                )));
            }
        }
        validate_span(self.start_time, self.end_time)
    }

    /// End time, defaulting to one hour after start.
    pub fn effective_end(&self) -> DateTime<Utc> {
        self.end_time
            .unwrap_or_else(|| self.start_time + Duration::minutes(DEFAULT_EVENT_MINUTES))
    }

    pub fn timezone(&self) -> Tz {
        self.timezone.unwrap_or(chrono_tz::UTC)
    }

    /// Expand this event as the template of a recurring series.
    pub fn occurrences(&self, rule: &RecurrenceRule) -> CalDropResult<Occurrences> {
        self.validate()?;
        recurrence::expand_in(self.start_time, self.end_time, rule, self.timezone())
    }

    /// The concrete event for one occurrence of this template.
    ///
    /// All descriptive fields are copied; the id gets the occurrence start appended so
    /// every instance keeps a distinct, stable UID.
    pub fn at_occurrence(&self, occurrence: &Occurrence) -> Event {
        Event {
            id: self
                .id
                .as_ref()
                .map(|id| format!("{}-{}", id, format_ics_utc(occurrence.start_time))),
            start_time: occurrence.start_time,
            end_time: occurrence.end_time,
            is_recurring_parent: false,
            ..self.clone()
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

pub(crate) fn validate_span(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> CalDropResult<()> {
    match end {
        Some(end) if end <= start => Err(CalDropError::validation(format!(
            "event end ({}) must be after its start ({})",
            end.to_rfc3339(),
            start.to_rfc3339()
        ))),
        _ => Ok(()),
    }
}

/// Ordered, de-duplicated reminder offsets in minutes before start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderSet(BTreeSet<u32>);

impl ReminderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<u32> for ReminderSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        ReminderSet(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[u32; N]> for ReminderSet {
    fn from(minutes: [u32; N]) -> Self {
        minutes.into_iter().collect()
    }
}

/// One materialized instance of a recurring series.
///
/// Carries no identity; pair it with the template via [`Event::at_occurrence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}
