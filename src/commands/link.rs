use std::path::Path;

use anyhow::Result;
use caldrop_core::{Event, Provider, build_provider_url};

use crate::commands::read_json;

pub fn run(provider: Provider, event_path: &Path) -> Result<()> {
    let event: Event = read_json(event_path)?;
    let url = build_provider_url(&event, provider)?;
    println!("{}", url);
    Ok(())
}
