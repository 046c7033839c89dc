use anyhow::Result;
use caldrop_core::{Occurrence, describe_from, expand_in};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use owo_colors::OwoColorize;

use crate::commands::RuleArgs;
use crate::render::render_occurrences;

pub fn run(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    rule: &RuleArgs,
    tz: Tz,
    json: bool,
) -> Result<()> {
    let rule = rule.to_rule()?;
    let occurrences: Vec<Occurrence> = expand_in(start, end, &rule, tz)?.collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&occurrences)?);
        return Ok(());
    }

    let local_start = start.with_timezone(&tz).date_naive();
    println!("{}", describe_from(&rule, local_start).dimmed());
    println!("{}", render_occurrences(&occurrences, tz));
    Ok(())
}
