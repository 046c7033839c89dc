//! Subscribable venue schedules.
//!
//! A feed is the whole upcoming schedule of one venue as a single calendar
//! document, plus the response headers a transport should serve it with.

use serde::{Deserialize, Serialize};

use crate::config::BuilderConfig;
use crate::error::{CalDropError, CalDropResult};
use crate::event::Event;
use crate::ics::CalendarBuilder;

/// The venue a feed belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Used as the location of events that don't name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Venue {
    pub fn new(username: impl Into<String>) -> Self {
        Venue {
            username: username.into(),
            name: None,
            address: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }

    pub fn calendar_name(&self) -> String {
        format!("{}'s Schedule", self.display_name())
    }

    pub fn file_name(&self) -> String {
        format!("{}-schedule.ics", self.username)
    }
}

/// A rendered feed with the headers it should be served with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedResponse {
    pub body: String,
    pub content_type: String,
    pub content_disposition: String,
    pub cache_control: String,
}

impl FeedResponse {
    /// Header name/value pairs, including the CORS header feed readers expect.
    pub fn headers(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Content-Type", self.content_type.as_str()),
            ("Content-Disposition", self.content_disposition.as_str()),
            ("Cache-Control", self.cache_control.as_str()),
            ("Access-Control-Allow-Origin", "*"),
        ]
    }
}

/// Render a venue's schedule as a feed response.
pub fn build_feed(
    venue: &Venue,
    events: &[Event],
    config: &BuilderConfig,
) -> CalDropResult<FeedResponse> {
    let body = feed_calendar(venue, events, config)?;

    Ok(FeedResponse {
        body,
        content_type: "text/calendar; charset=utf-8".to_string(),
        content_disposition: format!("inline; filename=\"{}\"", venue.file_name()),
        cache_control: "public, max-age=3600".to_string(),
    })
}

/// The feed document alone.
///
/// Series templates are skipped since their occurrences are listed as events of
/// their own. Events are ordered by start time and inherit the venue address when
/// they have no location. Only reminders an event asks for explicitly are emitted.
pub fn feed_calendar(
    venue: &Venue,
    events: &[Event],
    config: &BuilderConfig,
) -> CalDropResult<String> {
    if venue.username.trim().is_empty() {
        return Err(CalDropError::validation("venue username is required"));
    }

    let mut ordered: Vec<&Event> = events
        .iter()
        .filter(|event| !event.is_recurring_parent)
        .collect();
    ordered.sort_by_key(|event| event.start_time);

    let mut builder = CalendarBuilder::new(config)
        .schedule()
        .name(venue.calendar_name())
        .without_default_reminders();

    for event in ordered {
        let has_location = event
            .location
            .as_deref()
            .is_some_and(|loc| !loc.trim().is_empty());

        match venue.address {
            Some(ref address) if !has_location => {
                let mut event = event.clone();
                event.location = Some(address.clone());
                builder.add_event(&event)?;
            }
            _ => {
                builder.add_event(event)?;
            }
        }
    }

    tracing::debug!(
        venue = %venue.username,
        events = builder.len(),
        "built venue feed"
    );
    Ok(builder.build())
}
