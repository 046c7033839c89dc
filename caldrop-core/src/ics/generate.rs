//! ICS document generation.

use chrono::{DateTime, Duration, Utc};
use icalendar::{Alarm, Calendar, Component, EventLike, Property, Trigger};
use uuid::Uuid;

use crate::config::BuilderConfig;
use crate::constants::{MINUTES_PER_DAY, MINUTES_PER_HOUR, UNCATEGORIZED};
use crate::error::CalDropResult;
use crate::event::{Event, ReminderSet};
use crate::ics::format_ics_utc;
use crate::ics::text::escape_text;

/// Render a single event as a complete calendar document.
pub fn build_document(
    event: &Event,
    calendar_name: Option<&str>,
    config: &BuilderConfig,
) -> CalDropResult<String> {
    let mut builder = CalendarBuilder::new(config);
    if let Some(name) = calendar_name {
        builder = builder.name(name);
    }
    builder.add_event(event)?;
    Ok(builder.build())
}

/// Render many events under one calendar envelope.
pub fn build_calendar(
    events: &[Event],
    calendar_name: Option<&str>,
    config: &BuilderConfig,
) -> CalDropResult<String> {
    let mut builder = CalendarBuilder::new(config).schedule();
    if let Some(name) = calendar_name {
        builder = builder.name(name);
    }
    for event in events {
        builder.add_event(event)?;
    }
    Ok(builder.build())
}

/// Collects validated events and renders them into a VCALENDAR in one pass.
#[derive(Debug, Clone)]
pub struct CalendarBuilder<'a> {
    config: &'a BuilderConfig,
    kind: &'static str,
    name: Option<String>,
    stamp: DateTime<Utc>,
    default_reminders: bool,
    events: Vec<Event>,
}

impl<'a> CalendarBuilder<'a> {
    pub fn new(config: &'a BuilderConfig) -> Self {
        CalendarBuilder {
            config,
            kind: "Event",
            name: None,
            stamp: Utc::now(),
            default_reminders: true,
            events: Vec::new(),
        }
    }

    /// Mark the document as a multi-event schedule (affects PRODID only).
    pub fn schedule(mut self) -> Self {
        self.kind = "Schedule";
        self
    }

    /// Calendar display name (X-WR-CALNAME)
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Fix DTSTAMP instead of using the current time.
    pub fn stamped_at(mut self, stamp: DateTime<Utc>) -> Self {
        self.stamp = stamp;
        self
    }

    /// Only emit alarms for events that list their own reminders.
    pub fn without_default_reminders(mut self) -> Self {
        self.default_reminders = false;
        self
    }

    /// Validate and queue an event. Nothing is formatted until [`build`](Self::build).
    pub fn add_event(&mut self, event: &Event) -> CalDropResult<&mut Self> {
        event.validate()?;
        self.events.push(event.clone());
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The document as an `icalendar` value, before PRODID is rewritten.
    pub fn to_calendar(&self) -> Calendar {
        let mut cal = Calendar::new();
        cal.append_property(Property::new("METHOD", "PUBLISH"));

        if let Some(ref name) = self.name {
            cal.append_property(Property::new("X-WR-CALNAME", escape_text(name)));
        }

        for event in &self.events {
            cal.push(self.to_ics_event(event));
        }

        cal.done()
    }

    pub fn build(&self) -> String {
        let prodid = self.config.prodid(self.kind);
        strip_ics_bloat(&self.to_calendar().to_string(), &prodid)
    }

    fn to_ics_event(&self, event: &Event) -> icalendar::Event {
        let mut ics_event = icalendar::Event::new();
        ics_event.uid(&uid_for(event, &self.config.domain));

        // Fixed per build so every VEVENT in a document shares one stamp
        ics_event.add_property("DTSTAMP", format_ics_utc(self.stamp));
        ics_event.add_property("DTSTART", format_ics_utc(event.start_time));
        ics_event.add_property("DTEND", format_ics_utc(event.effective_end()));
        ics_event.summary(&escape_text(&event.title));

        if let Some(desc) = non_empty(&event.description) {
            ics_event.description(&escape_text(desc));
        }

        if let Some(loc) = non_empty(&event.location) {
            ics_event.location(&escape_text(loc));
        }

        if let Some(url) = non_empty(&event.url) {
            ics_event.add_property("URL", url);
        }

        if let Some(category) = non_empty(&event.category)
            .filter(|category| !category.eq_ignore_ascii_case(UNCATEGORIZED))
        {
            ics_event.add_property("CATEGORIES", escape_text(category));
        }

        ics_event.add_property("STATUS", "CONFIRMED");
        ics_event.add_property("TRANSP", "OPAQUE");

        for minutes in self.reminders_for(event).into_iter().flat_map(ReminderSet::iter) {
            ics_event.alarm(reminder_alarm(minutes, &event.title));
        }

        ics_event.done()
    }

    fn reminders_for<'e>(&'e self, event: &'e Event) -> Option<&'e ReminderSet> {
        match event.reminder_minutes {
            Some(ref reminders) => Some(reminders),
            None if self.default_reminders => Some(&self.config.default_reminders),
            None => None,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn reminder_alarm(minutes: u32, title: &str) -> Alarm {
    let description = format!("Reminder: {} ({})", title, reminder_label(minutes));
    let trigger = Trigger::before_start(Duration::minutes(i64::from(minutes)));
    let mut alarm = Alarm::display(&escape_text(&description), trigger);
    // Largest whole unit (-PT1H, -P1D) instead of the crate's spelling
    alarm.add_property("TRIGGER", format_trigger(minutes));
    alarm
}

/// Clean up the `icalendar` crate's output
/// - Replace its PRODID with ours
/// - Remove DTSTAMP and UID inside VALARM sections (not required by RFC 5545)
fn strip_ics_bloat(ics: &str, prodid: &str) -> String {
    let mut result = String::with_capacity(ics.len());
    let mut in_valarm = false;

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(prodid);
            result.push_str("\r\n");
            continue;
        }

        if line == "BEGIN:VALARM" {
            in_valarm = true;
        } else if line == "END:VALARM" {
            in_valarm = false;
        }

        if in_valarm && (line.starts_with("DTSTAMP:") || line.starts_with("UID:")) {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

/// Stable UID for an event: `<id>@<domain>`, or a value derived from the start time
/// and title when the event has no id yet.
pub fn uid_for(event: &Event, domain: &str) -> String {
    match non_empty(&event.id) {
        Some(id) => format!("{}@{}", id, domain),
        None => {
            let digest = Uuid::new_v5(&Uuid::NAMESPACE_OID, event.title.as_bytes()).simple();
            let digest = digest.to_string();
            format!(
                "{}-{}@{}",
                format_ics_utc(event.start_time),
                &digest[..8],
                domain
            )
        }
    }
}

/// TRIGGER value for a reminder `minutes` before start, in the largest whole unit.
pub fn format_trigger(minutes: u32) -> String {
    if minutes == 0 {
        "PT0M".to_string()
    } else if minutes % MINUTES_PER_DAY == 0 {
        format!("-P{}D", minutes / MINUTES_PER_DAY)
    } else if minutes % MINUTES_PER_HOUR == 0 {
        format!("-PT{}H", minutes / MINUTES_PER_HOUR)
    } else {
        format!("-PT{}M", minutes)
    }
}

/// Human label for a reminder offset, e.g. "1 hour before" or "2 days before".
pub fn reminder_label(minutes: u32) -> String {
    const MINUTES_PER_WEEK: u32 = 7 * MINUTES_PER_DAY;

    let (amount, unit) = match minutes {
        0 => return "At time of event".to_string(),
        m if m % MINUTES_PER_WEEK == 0 => (m / MINUTES_PER_WEEK, "week"),
        m if m % MINUTES_PER_DAY == 0 => (m / MINUTES_PER_DAY, "day"),
        m if m % MINUTES_PER_HOUR == 0 => (m / MINUTES_PER_HOUR, "hour"),
        m => (m, "minute"),
    };
    let plural = if amount == 1 { "" } else { "s" };
    format!("{} {}{} before", amount, unit, plural)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalDropError;
    use chrono::TimeZone;

    fn make_test_event() -> Event {
        let mut event = Event::new(
            "Test Event",
            Utc.with_ymd_and_hms(2026, 3, 3, 19, 0, 0).unwrap(),
        );
        event.id = Some("test-event-123".to_string());
        event.end_time = Some(Utc.with_ymd_and_hms(2026, 3, 3, 21, 0, 0).unwrap());
        event.reminder_minutes = Some(ReminderSet::new());
        event
    }

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap()
    }

    fn generate(event: &Event) -> String {
        let config = BuilderConfig::default();
        let mut builder = CalendarBuilder::new(&config).stamped_at(stamp());
        builder.add_event(event).unwrap();
        builder.build()
    }

    fn valarm_sections(ics: &str) -> Vec<String> {
        ics.split("BEGIN:VALARM")
            .skip(1)
            .map(|s| s.split("END:VALARM").next().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_generate_ics_full_document() {
        let ics = generate(&make_test_event());

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"), "ICS:\n{}", ics);
        assert!(ics.ends_with("END:VCALENDAR\r\n"), "ICS:\n{}", ics);
        assert!(!ics.replace("\r\n", "").contains('\n'), "bare LF in:\n{}", ics);

        for line in [
            "VERSION:2.0",
            "PRODID:-//CalDrop//Event//EN",
            "CALSCALE:GREGORIAN",
            "METHOD:PUBLISH",
            "BEGIN:VEVENT",
            "UID:test-event-123@caldrop.app",
            "DTSTAMP:20260201T120000Z",
            "DTSTART:20260303T190000Z",
            "DTEND:20260303T210000Z",
            "SUMMARY:Test Event",
            "STATUS:CONFIRMED",
            "TRANSP:OPAQUE",
            "END:VEVENT",
        ] {
            assert_eq!(
                ics.lines().filter(|l| *l == line).count(),
                1,
                "expected exactly one {} line. ICS:\n{}",
                line,
                ics
            );
        }
        assert_eq!(ics.matches("PRODID:").count(), 1);
        assert!(!ics.contains("X-WR-CALNAME"));
    }

    #[test]
    fn test_generate_ics_alarm_is_minimal() {
        let mut event = make_test_event();
        event.reminder_minutes = Some(ReminderSet::from([30]));

        let ics = generate(&event);
        let alarms = valarm_sections(&ics);
        assert_eq!(alarms.len(), 1);
        assert!(!alarms[0].contains("UID:"), "VALARM should not have UID. Got:\n{}", alarms[0]);
        assert!(
            !alarms[0].contains("DTSTAMP:"),
            "VALARM should not have DTSTAMP. Got:\n{}",
            alarms[0]
        );
        assert_eq!(alarms[0].matches("TRIGGER").count(), 1);
        // The event keeps its own stamp and UID
        assert!(ics.contains("DTSTAMP:20260201T120000Z\r\n"));
        assert!(ics.contains("UID:test-event-123@caldrop.app\r\n"));
    }

    #[test]
    fn test_generate_ics_folds_multibyte_title() {
        let mut event = make_test_event();
        event.title = "Café crème ☕ · soirée jazz ".repeat(4).trim().to_string();

        let ics = generate(&event);
        assert!(ics.contains("\r\n "), "long SUMMARY should be folded. ICS:\n{}", ics);
        for line in ics.split("\r\n") {
            let content = line.strip_prefix(' ').unwrap_or(line);
            assert!(content.len() <= 75, "{} octets: {:?}", content.len(), line);
        }

        let parsed = crate::ics::parse_document(&ics).unwrap();
        assert_eq!(parsed[0].title, event.title);
    }

    #[test]
    fn test_generate_ics_rejects_line_breaks_in_raw_fields() {
        let config = BuilderConfig::default();

        let mut event = make_test_event();
        event.id = Some("abc\r\nX-INJECTED:1".to_string());
        assert!(matches!(
            build_document(&event, None, &config),
            Err(CalDropError::Validation(_))
        ));

        let mut event = make_test_event();
        event.url = Some("https://x/\nBEGIN:VEVENT".to_string());
        assert!(matches!(
            build_document(&event, None, &config),
            Err(CalDropError::Validation(_))
        ));
    }

    #[test]
    fn test_generate_ics_escapes_text_fields() {
        let mut event = make_test_event();
        event.title = "Trivia Night!".to_string();
        event.description = Some("Win, lose, or draw: prizes for 1st place.".to_string());
        event.location = Some("Pub; back room\nUpstairs".to_string());

        let ics = generate(&event);
        assert!(ics.contains("SUMMARY:Trivia Night!\r\n"), "ICS:\n{}", ics);
        assert!(
            ics.contains("DESCRIPTION:Win\\, lose\\, or draw: prizes for 1st place.\r\n"),
            "ICS:\n{}",
            ics
        );
        assert!(ics.contains("LOCATION:Pub\\; back room\\nUpstairs\r\n"), "ICS:\n{}", ics);
    }

    #[test]
    fn test_generate_ics_default_end_is_one_hour() {
        let mut event = make_test_event();
        event.end_time = None;

        let ics = generate(&event);
        assert!(ics.contains("DTSTART:20260303T190000Z\r\n"));
        assert!(ics.contains("DTEND:20260303T200000Z\r\n"));
    }

    #[test]
    fn test_generate_ics_optional_fields_omitted() {
        let mut event = make_test_event();
        event.description = Some("  ".to_string());
        event.category = Some("Other".to_string());

        let ics = generate(&event);
        assert!(!ics.contains("DESCRIPTION"));
        assert!(!ics.contains("LOCATION"));
        assert!(!ics.contains("CATEGORIES"));
        assert!(!ics.contains("URL"));
    }

    #[test]
    fn test_generate_ics_category_and_url() {
        let mut event = make_test_event();
        event.category = Some("music".to_string());
        event.url = Some("https://caldrop.app/e/open-mic".to_string());

        let ics = generate(&event);
        assert!(ics.contains("CATEGORIES:music\r\n"));
        assert!(ics.contains("URL:https://caldrop.app/e/open-mic\r\n"));
    }

    #[test]
    fn test_generate_ics_alarm_triggers() {
        let mut event = make_test_event();
        event.reminder_minutes = Some(ReminderSet::from([0, 15, 60, 1440]));

        let ics = generate(&event);
        let alarms = valarm_sections(&ics);
        assert_eq!(alarms.len(), 4);

        // Ascending offsets
        assert!(alarms[0].contains("TRIGGER:PT0M\r\n"));
        assert!(alarms[1].contains("TRIGGER:-PT15M\r\n"));
        assert!(alarms[2].contains("TRIGGER:-PT1H\r\n"));
        assert!(alarms[3].contains("TRIGGER:-P1D\r\n"));

        for alarm in &alarms {
            assert!(alarm.contains("ACTION:DISPLAY\r\n"));
            assert!(alarm.contains("DESCRIPTION:Reminder: Test Event ("));
        }
        assert!(alarms[2].contains("DESCRIPTION:Reminder: Test Event (1 hour before)\r\n"));
    }

    #[test]
    fn test_generate_ics_alarm_description_escapes_title() {
        let mut event = make_test_event();
        event.title = "Cards, dice; more".to_string();
        event.reminder_minutes = Some(ReminderSet::from([30]));

        let ics = generate(&event);
        assert!(
            ics.contains("DESCRIPTION:Reminder: Cards\\, dice\\; more (30 minutes before)\r\n"),
            "ICS:\n{}",
            ics
        );
    }

    #[test]
    fn test_generate_ics_unspecified_reminders_use_default() {
        let mut event = make_test_event();
        event.reminder_minutes = None;

        let alarms = valarm_sections(&generate(&event));
        assert_eq!(alarms.len(), 2);
        assert!(alarms[0].contains("TRIGGER:-PT1H"));
        assert!(alarms[1].contains("TRIGGER:-P1D"));
    }

    #[test]
    fn test_generate_ics_explicit_empty_reminders_have_no_alarms() {
        let event = make_test_event();
        assert!(valarm_sections(&generate(&event)).is_empty());
    }

    #[test]
    fn test_generate_ics_default_reminders_can_be_disabled() {
        let mut event = make_test_event();
        event.reminder_minutes = None;

        let config = BuilderConfig::default();
        let mut builder = CalendarBuilder::new(&config).without_default_reminders();
        builder.add_event(&event).unwrap();
        assert!(!builder.build().contains("BEGIN:VALARM"));
    }

    #[test]
    fn test_generate_ics_calendar_name_is_escaped() {
        let config = BuilderConfig::default();
        let ics =
            build_document(&make_test_event(), Some("Bob's Bar, Grill"), &config).unwrap();
        assert!(ics.contains("X-WR-CALNAME:Bob's Bar\\, Grill\r\n"));
    }

    #[test]
    fn test_generate_ics_rejects_empty_title() {
        let mut event = make_test_event();
        event.title = String::new();
        let config = BuilderConfig::default();
        assert!(build_document(&event, None, &config).is_err());
    }

    #[test]
    fn test_build_calendar_has_one_vevent_per_event() {
        let first = make_test_event();
        let mut second = make_test_event();
        second.id = Some("second".to_string());
        second.title = "Second".to_string();

        let config = BuilderConfig::default();
        let ics = build_calendar(&[first, second], Some("Venue"), &config).unwrap();

        assert!(ics.contains("PRODID:-//CalDrop//Schedule//EN\r\n"));
        assert_eq!(ics.matches("BEGIN:VEVENT\r\n").count(), 2);
        assert_eq!(ics.matches("END:VEVENT\r\n").count(), 2);
        assert!(ics.contains("UID:second@caldrop.app\r\n"));
    }

    #[test]
    fn test_uid_fallback_is_stable() {
        let mut event = make_test_event();
        event.id = None;

        let first = uid_for(&event, "caldrop.app");
        let second = uid_for(&event, "caldrop.app");
        assert_eq!(first, second);
        assert!(first.starts_with("20260303T190000Z-"));
        assert!(first.ends_with("@caldrop.app"));

        event.title = "Another".to_string();
        assert_ne!(uid_for(&event, "caldrop.app"), first);
    }

    #[test]
    fn test_format_trigger_units() {
        assert_eq!(format_trigger(0), "PT0M");
        assert_eq!(format_trigger(15), "-PT15M");
        assert_eq!(format_trigger(60), "-PT1H");
        assert_eq!(format_trigger(90), "-PT90M");
        assert_eq!(format_trigger(120), "-PT2H");
        assert_eq!(format_trigger(1440), "-P1D");
        assert_eq!(format_trigger(10080), "-P7D");
    }

    #[test]
    fn test_reminder_labels() {
        assert_eq!(reminder_label(0), "At time of event");
        assert_eq!(reminder_label(5), "5 minutes before");
        assert_eq!(reminder_label(60), "1 hour before");
        assert_eq!(reminder_label(120), "2 hours before");
        assert_eq!(reminder_label(1440), "1 day before");
        assert_eq!(reminder_label(2880), "2 days before");
        assert_eq!(reminder_label(10080), "1 week before");
    }
}
