//! ICS parsing using the icalendar crate's parser.

use chrono::{DateTime, LocalResult, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, Property, read_calendar, unfold},
};

use crate::error::{CalDropError, CalDropResult};
use crate::event::{Event, ReminderSet};
use crate::ics::text::unescape_text;

/// Parse every VEVENT in a calendar document into an [`Event`].
///
/// Documents produced by this crate round-trip: ids come back without the
/// `@domain` suffix and each VALARM becomes a reminder offset. Alarms that fire
/// after the start are not representable and are dropped.
pub fn parse_document(content: &str) -> CalDropResult<Vec<Event>> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(CalDropError::IcsParse)?;

    let mut events = Vec::new();
    for component in &calendar.components {
        if component.name == "VEVENT" {
            events.push(parse_vevent(component)?);
        } else {
            for child in component.components.iter().filter(|c| c.name == "VEVENT") {
                events.push(parse_vevent(child)?);
            }
        }
    }

    tracing::debug!(count = events.len(), "parsed calendar document");
    Ok(events)
}

fn parse_vevent(vevent: &Component) -> CalDropResult<Event> {
    let start_prop = vevent
        .find_prop("DTSTART")
        .ok_or_else(|| CalDropError::IcsParse("VEVENT without DTSTART".to_string()))?;
    let start_time = to_utc(start_prop)?;
    let end_time = vevent.find_prop("DTEND").map(to_utc).transpose()?;

    let title = text_prop(vevent, "SUMMARY").unwrap_or_else(|| "(No title)".to_string());
    let mut event = Event::new(title, start_time);
    event.end_time = end_time;

    event.id = vevent.find_prop("UID").map(|p| {
        let uid = p.val.as_ref();
        match uid.rsplit_once('@') {
            Some((id, _domain)) => id.to_string(),
            None => uid.to_string(),
        }
    });
    event.description = text_prop(vevent, "DESCRIPTION");
    event.location = text_prop(vevent, "LOCATION");
    event.url = vevent.find_prop("URL").map(|p| p.val.to_string());
    event.category = text_prop(vevent, "CATEGORIES");

    // Reminders from VALARM components
    let reminders: ReminderSet = vevent
        .components
        .iter()
        .filter(|c| c.name == "VALARM")
        .filter_map(|alarm| {
            let trigger = alarm.find_prop("TRIGGER")?.val.as_ref();
            parse_trigger_minutes(trigger)
        })
        .collect();
    event.reminder_minutes = Some(reminders);

    Ok(event)
}

fn text_prop(component: &Component, name: &str) -> Option<String> {
    component
        .find_prop(name)
        .map(|p| unescape_text(p.val.as_ref()))
        .filter(|v| !v.is_empty())
}

/// Resolve DTSTART/DTEND to a UTC instant.
///
/// Floating times are read as UTC; all-day dates start at midnight UTC.
fn to_utc(prop: &Property) -> CalDropResult<DateTime<Utc>> {
    let value = DatePerhapsTime::try_from(prop).map_err(|_| {
        CalDropError::IcsParse(format!("invalid {} value: {}", prop.name, prop.val))
    })?;

    match value {
        DatePerhapsTime::Date(date) => Ok(date.and_time(NaiveTime::MIN).and_utc()),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => Ok(dt),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => Ok(naive.and_utc()),
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            let tz: Tz = tzid
                .parse()
                .map_err(|_| CalDropError::IcsParse(format!("unknown TZID: {}", tzid)))?;
            match tz.from_local_datetime(&date_time) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                    Ok(dt.with_timezone(&Utc))
                }
                LocalResult::None => Err(CalDropError::IcsParse(format!(
                    "{} does not exist in {}",
                    date_time, tzid
                ))),
            }
        }
    }
}

/// Parse a TRIGGER value to minutes before the event (`-PT30M`, `-P1D`, `PT0M`).
fn parse_trigger_minutes(value: &str) -> Option<u32> {
    let is_before = value.starts_with('-');
    let duration_str = value.trim_start_matches(['-', '+']);

    let duration = iso8601::duration(duration_str).ok()?;
    let std_duration: std::time::Duration = duration.into();
    let minutes = u32::try_from(std_duration.as_secs() / 60).ok()?;

    if is_before || minutes == 0 {
        Some(minutes)
    } else {
        None
    }
}
