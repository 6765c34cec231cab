//! Slot configuration.
//!
//! A slot is one of six independently configured filters. Its configuration
//! is resolved from the [`ConfigStore`] on every evaluation and is never
//! cached.

use std::fmt;

use crate::config::{read_flag, read_string, ConfigStore};
use crate::extraction::ExtractionType;
use crate::id_list::IdSet;

/// Slot number, always within `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotNumber(u8);

impl SlotNumber {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;

    /// Returns `None` outside `1..=6`.
    pub fn new(slot: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&slot).then_some(Self(slot))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// All slots in ascending order.
    pub fn all() -> impl Iterator<Item = SlotNumber> {
        (Self::MIN..=Self::MAX).map(SlotNumber)
    }

    /// Config key for a per-slot setting, e.g. `filter3.ids`.
    pub fn key(self, setting: &str) -> String {
        format!("filter{}.{}", self.0, setting)
    }
}

impl fmt::Display for SlotNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Polarity of a slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterMode {
    /// Pass when the extracted value is in the id set.
    #[default]
    Allow,
    /// Pass when the extracted value is not in the id set.
    Deny,
}

impl FilterMode {
    /// Only the exact value `deny` selects deny mode; anything else allows.
    pub fn parse(raw: &str) -> Self {
        if raw == "deny" {
            FilterMode::Deny
        } else {
            FilterMode::Allow
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterMode::Allow => "allow",
            FilterMode::Deny => "deny",
        }
    }

    /// Apply the polarity to a membership result.
    pub fn apply(self, in_list: bool) -> bool {
        match self {
            FilterMode::Allow => in_list,
            FilterMode::Deny => !in_list,
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolved configuration of one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotConfig {
    slot: SlotNumber,
    pub enabled: bool,
    pub extraction_type: ExtractionType,
    pub mode: FilterMode,
    pub ids: IdSet,
    /// Free-text label used only in diagnostics.
    pub hint: String,
}

impl SlotConfig {
    /// Default (disabled) configuration for a slot.
    pub fn new(slot: SlotNumber) -> Self {
        Self {
            slot,
            enabled: false,
            extraction_type: ExtractionType::default(),
            mode: FilterMode::default(),
            ids: IdSet::new(),
            hint: String::new(),
        }
    }

    pub fn slot(&self) -> SlotNumber {
        self.slot
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_type(mut self, extraction_type: ExtractionType) -> Self {
        self.extraction_type = extraction_type;
        self
    }

    pub fn with_mode(mut self, mode: FilterMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_ids(mut self, ids: IdSet) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    /// Hint as rendered in trace events: ` (hint)`, or empty when unset.
    pub fn hint_label(&self) -> String {
        if self.hint.is_empty() {
            String::new()
        } else {
            format!(" ({})", self.hint)
        }
    }

    /// Resolve a slot from live configuration.
    ///
    /// Missing or unreadable keys fall back to: disabled, type `contact`,
    /// mode `allow`, no ids, empty hint.
    ///
    /// # Example
    /// ```
    /// use order_filter::{SlotConfig, SlotNumber, StaticConfig};
    ///
    /// let config = StaticConfig::new()
    ///     .with_value("filter2.enabled", "1")
    ///     .with_value("filter2.ids", "4\n5");
    ///
    /// let slot = SlotConfig::resolve(&config, SlotNumber::new(2).unwrap());
    /// assert!(slot.enabled);
    /// assert_eq!(slot.ids.to_vec(), vec![4, 5]);
    /// ```
    pub fn resolve(store: &dyn ConfigStore, slot: SlotNumber) -> Self {
        Self {
            slot,
            enabled: read_flag(store, &slot.key("enabled")),
            extraction_type: ExtractionType::parse(&read_string(store, &slot.key("type"), "contact")),
            mode: FilterMode::parse(&read_string(store, &slot.key("mode"), "allow")),
            ids: IdSet::parse(&read_string(store, &slot.key("ids"), "")),
            hint: read_string(store, &slot.key("hint"), ""),
        }
    }
}
