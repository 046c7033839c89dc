//! Terminal rendering for caldrop-core types.
//!
//! Extension traits that add colored output using owo_colors.

use caldrop_core::links::build_file_name;
use caldrop_core::{Event, Occurrence};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use owo_colors::OwoColorize;

/// Render in a display timezone.
pub trait RenderIn {
    fn render_in(&self, tz: Tz) -> String;
}

impl RenderIn for Occurrence {
    fn render_in(&self, tz: Tz) -> String {
        let start = self.start_time.with_timezone(&tz);
        let date = start.format("%a %b %-d, %Y").to_string();
        let mut time = start.format("%H:%M").to_string();

        if let Some(end) = self.end_time {
            let end = end.with_timezone(&tz);
            if end.date_naive() == start.date_naive() {
                time = format!("{}–{}", time, end.format("%H:%M"));
            } else {
                time = format!("{} → {}", time, end.format("%b %-d %H:%M"));
            }
        }

        format!("{} {}", date.bold(), time)
    }
}

/// Numbered occurrence list with a summary footer.
pub fn render_occurrences(occurrences: &[Occurrence], tz: Tz) -> String {
    if occurrences.is_empty() {
        return "No occurrences".dimmed().to_string();
    }

    let width = occurrences.len().to_string().len();
    let mut lines: Vec<String> = occurrences
        .iter()
        .enumerate()
        .map(|(i, o)| format!("{:>width$}. {}", i + 1, o.render_in(tz), width = width))
        .collect();

    let label = format!(
        "{} {} ({})",
        occurrences.len(),
        pluralize("occurrence", occurrences.len()),
        tz
    );
    lines.push(label.dimmed().to_string());
    lines.join("\n")
}

/// One-line confirmation for a written .ics file.
pub fn render_download(event: &Event, generated_at: DateTime<Utc>) -> String {
    format!(
        "{} {} {}",
        "✓".green(),
        build_file_name(event),
        format!("(generated {})", generated_at.format("%Y-%m-%d %H:%M UTC")).dimmed()
    )
}

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn occurrence_in_local_time() {
        let occurrence = Occurrence {
            start_time: Utc.with_ymd_and_hms(2026, 3, 3, 19, 0, 0).unwrap(),
            end_time: Some(Utc.with_ymd_and_hms(2026, 3, 3, 21, 0, 0).unwrap()),
        };
        let text = occurrence.render_in(chrono_tz::America::New_York);
        assert!(text.contains("Tue Mar 3, 2026"));
        assert!(text.contains("14:00–16:00"));
    }

    #[test]
    fn list_has_footer() {
        let occurrences = [Occurrence {
            start_time: Utc.with_ymd_and_hms(2026, 3, 3, 19, 0, 0).unwrap(),
            end_time: None,
        }];
        let text = render_occurrences(&occurrences, chrono_tz::UTC);
        assert!(text.contains("1. "));
        assert!(text.contains("1 occurrence (UTC)"));
    }
}
