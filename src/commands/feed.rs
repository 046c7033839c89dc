use std::path::Path;

use anyhow::Result;
use caldrop_core::{BuilderConfig, Event, Venue, build_feed};

use crate::commands::{read_json, write_output};

pub fn run(
    events_path: &Path,
    venue: &Venue,
    output: Option<&Path>,
    headers: bool,
    config: &BuilderConfig,
) -> Result<()> {
    let events: Vec<Event> = read_json(events_path)?;
    let feed = build_feed(venue, &events, config)?;

    if headers {
        for (name, value) in feed.headers() {
            eprintln!("{}: {}", name, value);
        }
    }

    write_output(output, &feed.body)?;
    if let Some(path) = output {
        eprintln!("Wrote {} ({} events)", path.display(), events.len());
    }
    Ok(())
}
