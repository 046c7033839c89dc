//! Recurring events and calendar feeds for caldrop.
//!
//! This crate is pure and synchronous:
//! - `recurrence` expands a rule into concrete occurrences and describes it in English
//! - `ics` builds (and reads back) iCalendar documents
//! - `links` builds Google/Outlook "add to calendar" URLs and download names
//! - `feed` renders a venue's schedule as a subscribable calendar

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod feed;
pub mod ics;
pub mod links;
pub mod recurrence;

pub use config::BuilderConfig;
pub use error::{CalDropError, CalDropResult};
pub use event::{Event, Occurrence, ReminderSet};
pub use feed::{FeedResponse, Venue, build_feed, feed_calendar};
pub use ics::{CalendarBuilder, build_calendar, build_document, parse_document};
pub use links::{Provider, build_file_name, build_provider_url, page_slug};
pub use recurrence::{
    Frequency, Occurrences, RecurrenceEnd, RecurrenceRule, WeekdaySet, describe, describe_from,
    expand, expand_in,
};
