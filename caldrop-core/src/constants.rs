/// Hard ceiling on the number of occurrences a single rule may produce.
pub const MAX_OCCURRENCES: usize = 52;

/// Reminder offsets (minutes before start) applied when an event doesn't specify any.
pub const DEFAULT_REMINDER_MINUTES: [u32; 2] = [60, 1440];

/// Length assumed for events without an explicit end.
pub const DEFAULT_EVENT_MINUTES: i64 = 60;

pub const DEFAULT_PRODUCT_NAME: &str = "CalDrop";

pub const DEFAULT_DOMAIN: &str = "caldrop.app";

/// Category value that means "uncategorized" and is never emitted.
pub const UNCATEGORIZED: &str = "other";

pub const MINUTES_PER_HOUR: u32 = 60;

pub const MINUTES_PER_DAY: u32 = 1440;
