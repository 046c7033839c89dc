mod commands;
mod config;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use caldrop_core::{Provider, Venue};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use commands::RuleArgs;
use commands::ics::IcsOptions;
use config::CaldropConfig;

#[derive(Parser)]
#[command(name = "caldrop")]
#[command(about = "Expand recurring events and build calendar files, feeds and links")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/caldrop/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the occurrences a rule produces
    Expand {
        /// First occurrence (RFC 3339, or YYYY-MM-DDTHH:MM in --tz)
        #[arg(short, long)]
        start: String,

        /// End of the first occurrence; every occurrence keeps this duration
        #[arg(short, long)]
        end: Option<String>,

        #[command(flatten)]
        rule: RuleArgs,

        /// Timezone whose wall clock the series follows
        #[arg(long)]
        tz: Option<String>,

        /// Print occurrences as JSON
        #[arg(long)]
        json: bool,
    },
    /// Describe a rule in plain English
    Describe {
        #[command(flatten)]
        rule: RuleArgs,

        /// Series start date (YYYY-MM-DD), to resolve defaults from
        #[arg(long)]
        start: Option<NaiveDate>,
    },
    /// Build an .ics file from an event JSON file
    Ics {
        event: PathBuf,

        /// Calendar name shown by calendar apps
        #[arg(long)]
        name: Option<String>,

        /// Output file or directory (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Reminder before the event, e.g. "1h" or "1day" (repeatable)
        #[arg(long, conflicts_with = "no_reminders")]
        remind: Vec<String>,

        /// Emit no alarms at all
        #[arg(long)]
        no_reminders: bool,
    },
    /// Build a venue's subscribable schedule from a JSON array of events
    Feed {
        events: PathBuf,

        #[arg(long)]
        username: String,

        #[arg(long)]
        venue_name: Option<String>,

        /// Location for events that don't have one
        #[arg(long)]
        venue_address: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the HTTP response headers to stderr
        #[arg(long)]
        headers: bool,
    },
    /// Print an "add to calendar" link
    Link {
        /// google or outlook
        provider: Provider,

        event: PathBuf,
    },
    /// Generate a page slug for an event title
    Slug { title: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = CaldropConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Expand {
            start,
            end,
            rule,
            tz,
            json,
        } => {
            let tz = config.timezone(tz.as_deref())?;
            let start = commands::parse_datetime(&start, tz)?;
            let end = end
                .map(|end| commands::parse_datetime(&end, tz))
                .transpose()?;
            commands::expand::run(start, end, &rule, tz, json)
        }
        Commands::Describe { rule, start } => commands::describe::run(&rule, start),
        Commands::Ics {
            event,
            name,
            output,
            remind,
            no_reminders,
        } => commands::ics::run(
            &event,
            IcsOptions {
                name: name.as_deref(),
                output: output.as_deref(),
                remind: &remind,
                no_reminders,
            },
            &config.builder_config(),
        ),
        Commands::Feed {
            events,
            username,
            venue_name,
            venue_address,
            output,
            headers,
        } => {
            let venue = Venue {
                username,
                name: venue_name,
                address: venue_address,
            };
            commands::feed::run(
                &events,
                &venue,
                output.as_deref(),
                headers,
                &config.builder_config(),
            )
        }
        Commands::Link { provider, event } => commands::link::run(provider, &event),
        Commands::Slug { title } => commands::slug::run(&title),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "caldrop=debug,caldrop_core=debug",
        _ => "caldrop=trace,caldrop_core=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
