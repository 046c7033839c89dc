use std::path::{Path, PathBuf};

use anyhow::Result;
use caldrop_core::{
    BuilderConfig, Event, RecurrenceRule, ReminderSet, build_calendar, build_document,
    links::build_file_name,
};
use chrono::Utc;
use serde::Deserialize;

use crate::commands::{parse_reminders, read_json, write_output};
use crate::render::render_download;

/// An event JSON file, optionally carrying the rule it repeats by.
#[derive(Deserialize)]
struct EventFile {
    #[serde(flatten)]
    event: Event,
    #[serde(default)]
    recurrence: Option<RecurrenceRule>,
}

pub struct IcsOptions<'a> {
    pub name: Option<&'a str>,
    pub output: Option<&'a Path>,
    pub remind: &'a [String],
    pub no_reminders: bool,
}

pub fn run(event_path: &Path, options: IcsOptions<'_>, config: &BuilderConfig) -> Result<()> {
    let EventFile {
        mut event,
        recurrence,
    } = read_json(event_path)?;

    if options.no_reminders {
        event.reminder_minutes = Some(ReminderSet::new());
    } else if !options.remind.is_empty() {
        event.reminder_minutes = Some(parse_reminders(options.remind)?);
    }

    let ics = render(&event, recurrence.as_ref(), options.name, config)?;

    let output: Option<PathBuf> = options.output.map(|path| {
        if path.is_dir() {
            path.join(build_file_name(&event))
        } else {
            path.to_path_buf()
        }
    });
    write_output(output.as_deref(), &ics)?;

    if output.is_some() {
        eprintln!("{}", render_download(&event, Utc::now()));
    }
    Ok(())
}

/// One VEVENT for a plain event, one per occurrence for a recurring one.
fn render(
    event: &Event,
    recurrence: Option<&RecurrenceRule>,
    name: Option<&str>,
    config: &BuilderConfig,
) -> Result<String> {
    let ics = match recurrence {
        Some(rule) => {
            let instances: Vec<Event> = event
                .occurrences(rule)?
                .map(|occurrence| event.at_occurrence(&occurrence))
                .collect();
            tracing::debug!(count = instances.len(), "expanded recurring event");
            build_calendar(&instances, name, config)?
        }
        None => build_document(event, name, config)?,
    };
    Ok(ics)
}
