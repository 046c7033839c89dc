//! iCalendar documents: generation and parsing.
//!
//! Documents are built with the `icalendar` crate, which writes CRLF line endings
//! and folds long lines. TEXT values are escaped here before they reach it.

mod generate;
mod parse;
mod text;

use chrono::{DateTime, Utc};

pub use generate::{
    CalendarBuilder, build_calendar, build_document, format_trigger, reminder_label, uid_for,
};
pub use parse::parse_document;
pub use text::{escape_text, unescape_text};

/// Compact UTC form used by DTSTART, DTEND and DTSTAMP, e.g. `20260303T190000Z`.
pub fn format_ics_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}
