//! # order-filter: Slot-Based Allow/Deny Filters for Orders
//!
//! order-filter decides, for up to six independently configured slots, whether
//! an order passes. Each slot extracts one identifying id from the order and
//! tests it against a configured id list with allow or deny polarity.
//!
//! ## Features
//!
//! - **Shape-tolerant extraction**: orders are read through the [`OrderAccess`]
//!   trait; missing or malformed fields fall through to the next lookup
//! - **Fallback chains**: contact, billing address and shipping address ids
//!   are each resolved by an ordered chain of lookups, first positive id wins
//! - **Live configuration**: slots are resolved from a [`ConfigStore`] on every
//!   evaluation (YAML, environment, or layered)
//! - **Diagnostics**: optional structured trace events through a
//!   [`DiagnosticsSink`] when the `debug` flag is on
//!
//! ## Example: Configuration
//!
//! ```yaml
//! debug: 0
//! filter1:
//!   enabled: 1
//!   type: contact
//!   mode: allow
//!   ids: |
//!     10
//!     20
//!   hint: key accounts
//! filter2:
//!   enabled: 1
//!   type: shippingAddress
//!   mode: deny
//!   ids: "7, 8"
//! ```
//!
//! ## Example: Evaluation
//!
//! ```
//! use order_filter::{SlotEvaluator, SlotNumber, StaticConfig, TracingSink};
//! use serde_json::json;
//!
//! let config = StaticConfig::from_yaml_str(
//!     "filter1:\n  enabled: 1\n  type: contact\n  ids: \"10,20\"\n",
//! )
//! .unwrap();
//! let evaluator = SlotEvaluator::new(&config, &TracingSink);
//!
//! let order = json!({"contactReceiverId": 20});
//! assert!(evaluator.evaluate_slot(Some(&order), SlotNumber::new(1).unwrap()));
//! ```

// Core modules
pub mod id_list;
pub mod record;
pub mod extraction;
pub mod slot;

// Configuration and diagnostics collaborators
pub mod config;
pub mod diagnostics;

// Decision logic
pub mod evaluator;

// Re-export key types
pub use id_list::IdSet;
pub use record::OrderAccess;
pub use extraction::{extract, extract_with_step, AddressKind, Extracted, ExtractionStep, ExtractionType, FallbackChain};
pub use slot::{FilterMode, SlotConfig, SlotNumber};
pub use config::{ConfigError, ConfigStore, EnvConfig, LayeredConfig, StaticConfig};
pub use diagnostics::{DiagnosticsSink, NoopSink, RecordingSink, TraceContext, TraceEvent, TracingSink};
pub use evaluator::{SlotEvaluator, SlotOutcome, SlotReport};
