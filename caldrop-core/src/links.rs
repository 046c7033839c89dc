//! "Add to calendar" deep links, download file names and page slugs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::{CalDropError, CalDropResult};
use crate::event::Event;
use crate::ics::format_ics_utc;

const GOOGLE_BASE: &str = "https://calendar.google.com/calendar/render";
const OUTLOOK_BASE: &str = "https://outlook.live.com/calendar/0/deeplink/compose";

const SLUG_MAX_LEN: usize = 50;

/// Web calendars that accept a pre-filled event through a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Outlook,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Outlook => "outlook",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = CalDropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(Provider::Google),
            "outlook" => Ok(Provider::Outlook),
            other => Err(CalDropError::configuration(format!(
                "unknown calendar provider: {}",
                other
            ))),
        }
    }
}

/// Build the "add to calendar" URL for a provider.
///
/// Empty optional fields are sent as empty parameters; the providers ignore them.
pub fn build_provider_url(event: &Event, provider: Provider) -> CalDropResult<Url> {
    event.validate()?;

    let start = event.start_time;
    let end = event.effective_end();
    let details = event.description.as_deref().unwrap_or_default();
    let location = event.location.as_deref().unwrap_or_default();

    let url = match provider {
        Provider::Google => {
            let dates = format!("{}/{}", format_ics_utc(start), format_ics_utc(end));
            Url::parse_with_params(
                GOOGLE_BASE,
                &[
                    ("action", "TEMPLATE"),
                    ("text", event.title.as_str()),
                    ("dates", dates.as_str()),
                    ("details", details),
                    ("location", location),
                ],
            )
        }
        Provider::Outlook => {
            let startdt = outlook_time(start);
            let enddt = outlook_time(end);
            Url::parse_with_params(
                OUTLOOK_BASE,
                &[
                    ("path", "/calendar/action/compose"),
                    ("rru", "addevent"),
                    ("subject", event.title.as_str()),
                    ("startdt", startdt.as_str()),
                    ("enddt", enddt.as_str()),
                    ("body", details),
                    ("location", location),
                ],
            )
        }
    };

    url.map_err(|e| CalDropError::IcsGenerate(format!("invalid {} link: {}", provider, e)))
}

fn outlook_time(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Download name for an event's `.ics` file: every character that isn't an ASCII
/// letter or digit becomes `_`.
pub fn build_file_name(event: &Event) -> String {
    let stem: String = event
        .title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}.ics", stem)
}

/// URL slug for an event page: the slugified title plus a short random suffix so
/// events with the same title get distinct pages.
pub fn page_slug(title: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    let base = slugify(title);
    if base.is_empty() {
        suffix[..6].to_string()
    } else {
        format!("{}-{}", base, &suffix[..6])
    }
}

/// Lowercase ASCII slug of at most 50 characters, without leading or trailing `-`.
///
/// Accented letters are transliterated (`Café` becomes `cafe`) before the remaining
/// runs of non-alphanumerics collapse to `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = slug::slugify(title);
    slug.truncate(SLUG_MAX_LEN);
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
