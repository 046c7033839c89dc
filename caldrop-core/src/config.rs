//! Settings passed explicitly into document builders.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DOMAIN, DEFAULT_PRODUCT_NAME, DEFAULT_REMINDER_MINUTES};
use crate::event::ReminderSet;

/// Product identity and defaults used when rendering calendar documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Product name used in PRODID, e.g. `-//CalDrop//Event//EN`
    pub product_name: String,
    /// Domain appended to every UID
    pub domain: String,
    /// Reminders for events that don't specify their own
    pub default_reminders: ReminderSet,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        BuilderConfig {
            product_name: DEFAULT_PRODUCT_NAME.to_string(),
            domain: DEFAULT_DOMAIN.to_string(),
            default_reminders: ReminderSet::from(DEFAULT_REMINDER_MINUTES),
        }
    }
}

impl BuilderConfig {
    pub fn prodid(&self, kind: &str) -> String {
        format!("-//{}//{}//EN", self.product_name, kind)
    }
}
