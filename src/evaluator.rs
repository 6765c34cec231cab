//! Slot evaluation.
//!
//! Combines a slot configuration and an order into a pass/fail decision.
//! Every anomaly (missing order, disabled slot, empty id list, unknown type,
//! unresolvable value) is a regular `false` outcome, optionally traced.

use serde::Serialize;
use std::fmt;

use crate::config::{read_flag, ConfigStore};
use crate::diagnostics::{codes, order_dump, DiagnosticsSink, TraceContext, Tracer};
use crate::extraction::extract_with_step;
use crate::record::OrderAccess;
use crate::slot::{SlotConfig, SlotNumber};

/// Global config key switching diagnostics on.
pub const DEBUG_KEY: &str = "debug";

/// Why a slot evaluated the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SlotOutcome {
    NoOrder,
    Disabled,
    NoIds,
    UnknownType {
        #[serde(rename = "type")]
        extraction_type: String,
    },
    NoValue,
    #[serde(rename_all = "camelCase")]
    Decided {
        value: i64,
        step: &'static str,
        in_list: bool,
        passed: bool,
    },
}

impl SlotOutcome {
    /// The boolean decision.
    pub fn passed(&self) -> bool {
        matches!(self, SlotOutcome::Decided { passed: true, .. })
    }
}

impl fmt::Display for SlotOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotOutcome::NoOrder => write!(f, "no order"),
            SlotOutcome::Disabled => write!(f, "disabled"),
            SlotOutcome::NoIds => write!(f, "no ids configured"),
            SlotOutcome::UnknownType { extraction_type } => {
                write!(f, "unknown type '{}'", extraction_type)
            }
            SlotOutcome::NoValue => write!(f, "no value"),
            SlotOutcome::Decided {
                value,
                step,
                in_list,
                ..
            } => {
                let membership = if *in_list { "in list" } else { "not in list" };
                write!(f, "value {} via {}, {}", value, step, membership)
            }
        }
    }
}

/// Result of one slot in a whole-order evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotReport {
    pub slot: u8,
    pub passed: bool,
    #[serde(flatten)]
    pub outcome: SlotOutcome,
}

/// Evaluates slots against orders.
///
/// Holds only borrowed collaborators and no state of its own, so a single
/// evaluator can be shared across threads.
///
/// # Example
///
/// ```
/// use order_filter::{NoopSink, SlotEvaluator, SlotNumber, StaticConfig};
/// use serde_json::json;
///
/// let config = StaticConfig::new()
///     .with_value("filter1.enabled", 1)
///     .with_value("filter1.ids", "10, 20");
/// let evaluator = SlotEvaluator::new(&config, &NoopSink);
///
/// let order = json!({"contactReceiverId": 10});
/// assert!(evaluator.evaluate_slot(Some(&order), SlotNumber::new(1).unwrap()));
/// ```
#[derive(Clone, Copy)]
pub struct SlotEvaluator<'a> {
    config: &'a dyn ConfigStore,
    sink: &'a dyn DiagnosticsSink,
}

impl<'a> SlotEvaluator<'a> {
    pub fn new(config: &'a dyn ConfigStore, sink: &'a dyn DiagnosticsSink) -> Self {
        Self { config, sink }
    }

    /// Whether diagnostics are currently switched on.
    pub fn debug_enabled(&self) -> bool {
        read_flag(self.config, DEBUG_KEY)
    }

    /// Decide one slot for an order.
    pub fn evaluate(&self, order: Option<&dyn OrderAccess>, slot: &SlotConfig) -> bool {
        self.explain(order, slot).passed()
    }

    /// Decide one slot and report why.
    pub fn explain(&self, order: Option<&dyn OrderAccess>, slot: &SlotConfig) -> SlotOutcome {
        let Some(order) = order else {
            return SlotOutcome::NoOrder;
        };

        let tracer = Tracer::new(self.sink, self.debug_enabled());
        let number = slot.slot();

        tracer.emit(codes::PING, || TraceContext::new().with("slot", number));
        if tracer.is_enabled() {
            let tag = format!("before_check_slot_{}", number);
            let data = order_dump(order, &tag);
            tracer.emit(codes::ORDER_DUMP, || {
                TraceContext::new().with("tag", &tag).with("data", data)
            });
        }

        if !slot.enabled {
            return SlotOutcome::Disabled;
        }

        if slot.ids.is_empty() {
            tracer.emit(codes::NO_IDS, || {
                TraceContext::new().with("slot", number).with("hint", slot.hint_label())
            });
            return SlotOutcome::NoIds;
        }

        let type_name = slot.extraction_type.as_str();
        if !slot.extraction_type.is_known() {
            tracer.emit(codes::UNKNOWN_TYPE, || {
                TraceContext::new()
                    .with("slot", number)
                    .with("hint", slot.hint_label())
                    .with("type", type_name)
            });
            return SlotOutcome::UnknownType {
                extraction_type: type_name.to_string(),
            };
        }

        let Some(found) = extract_with_step(order, &slot.extraction_type) else {
            tracer.emit(codes::NO_VALUE, || {
                TraceContext::new()
                    .with("slot", number)
                    .with("hint", slot.hint_label())
                    .with("type", type_name)
            });
            return SlotOutcome::NoValue;
        };

        let in_list = slot.ids.contains(found.value);
        let passed = slot.mode.apply(in_list);

        tracer.emit(codes::DECISION, || {
            TraceContext::new()
                .with("slot", number)
                .with("hint", slot.hint_label())
                .with("type", type_name)
                .with("value", found.value)
                .with("mode", slot.mode)
                .with("inList", if in_list { "1" } else { "0" })
                .with("result", passed)
                .with("ids", &slot.ids)
                .with("step", found.step)
        });

        SlotOutcome::Decided {
            value: found.value,
            step: found.step,
            in_list,
            passed,
        }
    }

    /// Resolve a slot from live configuration, then decide it.
    pub fn evaluate_slot(&self, order: Option<&dyn OrderAccess>, slot: SlotNumber) -> bool {
        self.explain_slot(order, slot).passed()
    }

    pub fn explain_slot(&self, order: Option<&dyn OrderAccess>, slot: SlotNumber) -> SlotOutcome {
        let config = SlotConfig::resolve(self.config, slot);
        self.explain(order, &config)
    }

    /// Decide all six slots for an order, in slot order.
    pub fn evaluate_all(&self, order: Option<&dyn OrderAccess>) -> Vec<SlotReport> {
        SlotNumber::all()
            .map(|slot| {
                let outcome = self.explain_slot(order, slot);
                SlotReport {
                    slot: slot.get(),
                    passed: outcome.passed(),
                    outcome,
                }
            })
            .collect()
    }
}

impl fmt::Debug for SlotEvaluator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotEvaluator").finish_non_exhaustive()
    }
}
