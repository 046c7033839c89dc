use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use caldrop_core::constants::{DEFAULT_DOMAIN, DEFAULT_PRODUCT_NAME, DEFAULT_REMINDER_MINUTES};
use caldrop_core::{BuilderConfig, ReminderSet};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

fn default_product_name() -> String {
    DEFAULT_PRODUCT_NAME.to_string()
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

fn default_reminders() -> Vec<u32> {
    DEFAULT_REMINDER_MINUTES.to_vec()
}

/// Global configuration at ~/.config/caldrop/config.toml
///
/// Every key is optional; a missing file means all defaults.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CaldropConfig {
    #[serde(default = "default_product_name")]
    pub product_name: String,

    #[serde(default = "default_domain")]
    pub domain: String,

    /// Reminder offsets in minutes for events that don't list their own
    #[serde(default = "default_reminders")]
    pub default_reminders: Vec<u32>,

    /// IANA zone for local times; the system zone when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl Default for CaldropConfig {
    fn default() -> Self {
        CaldropConfig {
            product_name: default_product_name(),
            domain: default_domain(),
            default_reminders: default_reminders(),
            timezone: None,
        }
    }
}

impl CaldropConfig {
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("caldrop");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from `path`, or from the default location when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Could not read config file {}", path.display()))?;
        let config: CaldropConfig = toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn builder_config(&self) -> BuilderConfig {
        BuilderConfig {
            product_name: self.product_name.clone(),
            domain: self.domain.clone(),
            default_reminders: self.default_reminders.iter().copied().collect::<ReminderSet>(),
        }
    }

    /// The zone local times are read in: `override_tz`, then the config, then the
    /// system zone, then UTC.
    pub fn timezone(&self, override_tz: Option<&str>) -> Result<Tz> {
        if let Some(name) = override_tz.or(self.timezone.as_deref()) {
            return parse_tz(name);
        }

        match iana_time_zone::get_timezone() {
            Ok(name) => Ok(name.parse().unwrap_or(chrono_tz::UTC)),
            Err(e) => {
                tracing::debug!(error = %e, "could not detect system timezone, using UTC");
                Ok(chrono_tz::UTC)
            }
        }
    }
}

pub fn parse_tz(name: &str) -> Result<Tz> {
    name.parse::<Tz>().map_err(|_| {
        anyhow::anyhow!(
            "Unknown timezone '{}'. Expected an IANA name like America/New_York",
            name
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_means_defaults() {
        let config: CaldropConfig = toml::from_str("").unwrap();
        assert_eq!(config, CaldropConfig::default());
        assert_eq!(
            config.builder_config(),
            BuilderConfig::default(),
            "defaults should match the library's"
        );
    }

    #[test]
    fn partial_file_overrides_keys() {
        let config: CaldropConfig = toml::from_str(
            r#"
product_name = "Venue Tools"
default_reminders = [15]
timezone = "Europe/Berlin"
"#,
        )
        .unwrap();

        let builder = config.builder_config();
        assert_eq!(builder.product_name, "Venue Tools");
        assert_eq!(builder.domain, DEFAULT_DOMAIN);
        assert_eq!(builder.default_reminders.iter().collect::<Vec<_>>(), vec![15]);
        assert_eq!(config.timezone(None).unwrap(), chrono_tz::Europe::Berlin);
    }

    #[test]
    fn override_timezone_wins() {
        let config = CaldropConfig {
            timezone: Some("Europe/Berlin".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.timezone(Some("Asia/Tokyo")).unwrap(),
            chrono_tz::Asia::Tokyo
        );
        assert!(config.timezone(Some("Mars/Olympus")).is_err());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CaldropConfig::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(config, CaldropConfig::default());
    }
}
