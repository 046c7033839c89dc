use anyhow::Result;
use caldrop_core::{describe, describe_from};
use chrono::NaiveDate;

use crate::commands::RuleArgs;

pub fn run(rule: &RuleArgs, start: Option<NaiveDate>) -> Result<()> {
    let rule = rule.to_rule()?;
    let text = match start {
        Some(start) => describe_from(&rule, start),
        None => describe(&rule),
    };
    println!("{}", text);
    Ok(())
}
