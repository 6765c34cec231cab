//! Diagnostic trace events emitted during slot evaluation.
//!
//! Events are only produced when the global `debug` flag is on. A sink
//! returns nothing, so whatever happens inside it cannot influence a
//! decision.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};

use crate::extraction::{first_collection, ADDRESS_RELATION_FIELDS, RELATION_FIELDS};
use crate::record::OrderAccess;

/// Event codes, in the order they may appear within one evaluation.
pub mod codes {
    pub const PING: &str = "ping";
    pub const ORDER_DUMP: &str = "orderDump";
    pub const NO_IDS: &str = "noIds";
    pub const UNKNOWN_TYPE: &str = "unknownType";
    pub const NO_VALUE: &str = "noValue";
    pub const DECISION: &str = "decision";
}

/// Maximum number of collection entries rendered in an order dump.
pub const DUMP_PREVIEW_LIMIT: usize = 20;

/// Ordered string context attached to a trace event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceContext {
    fields: IndexMap<String, String>,
}

impl TraceContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.fields.insert(key.into(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Receiver of diagnostic events.
///
/// Must be safe to call from several slot evaluations at once and must not
/// block for long.
pub trait DiagnosticsSink: Send + Sync {
    fn emit(&self, code: &str, context: &TraceContext);
}

impl<T: DiagnosticsSink + ?Sized> DiagnosticsSink for &T {
    fn emit(&self, code: &str, context: &TraceContext) {
        (**self).emit(code, context)
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticsSink for NoopSink {
    fn emit(&self, _code: &str, _context: &TraceContext) {}
}

/// Forwards events to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn emit(&self, code: &str, context: &TraceContext) {
        let rendered = context
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");

        tracing::debug!(target: "order_filter::trace", code, "{}", rendered);
    }
}

/// A recorded trace event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub code: String,
    pub context: TraceContext,
    pub recorded_at: DateTime<Utc>,
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TraceEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }

    /// Recorded event codes, in order.
    pub fn codes(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.code.clone()).collect()
    }

    /// Remove and return all recorded events.
    pub fn drain(&self) -> Vec<TraceEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl DiagnosticsSink for RecordingSink {
    fn emit(&self, code: &str, context: &TraceContext) {
        self.events.lock().push(TraceEvent {
            code: code.to_string(),
            context: context.clone(),
            recorded_at: Utc::now(),
        });
    }
}

/// Sink gated by the debug flag. Context is only built when enabled.
pub(crate) struct Tracer<'a> {
    sink: &'a dyn DiagnosticsSink,
    enabled: bool,
}

impl<'a> Tracer<'a> {
    pub(crate) fn new(sink: &'a dyn DiagnosticsSink, enabled: bool) -> Self {
        Self { sink, enabled }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn emit(&self, code: &str, build: impl FnOnce() -> TraceContext) {
        if self.enabled {
            self.sink.emit(code, &build());
        }
    }
}

/// Summarize an order for the `orderDump` event.
///
/// Scalar ids default to 0. Relation previews show the collection extraction
/// reads (named in the `*_source` entries). Collections are previewed up to
/// [`DUMP_PREVIEW_LIMIT`] entries, followed by a `{"...": "max reached"}`
/// marker when truncated.
pub fn order_dump(order: &dyn OrderAccess, tag: &str) -> JsonValue {
    let int = |field: &str| order.try_get_int(field).unwrap_or(0);
    let nested_id = |field: &str| {
        order
            .try_get_object(field)
            .and_then(|o| o.try_get_int("id"))
            .unwrap_or(0)
    };

    let mut data = Map::new();
    data.insert("tag".into(), json!(tag));
    data.insert("id".into(), json!(int("id")));
    data.insert("orderId".into(), json!(int("orderId")));
    data.insert(
        "statusId".into(),
        json!(order.try_get_str("statusId").map(|s| s.into_owned()).unwrap_or_default()),
    );
    data.insert("contactReceiverId".into(), json!(int("contactReceiverId")));
    data.insert("contactId".into(), json!(int("contactId")));
    data.insert(
        "has_addressRelations".into(),
        json!(u8::from(order.has_collection("addressRelations"))),
    );
    data.insert("has_addresses".into(), json!(u8::from(order.has_collection("addresses"))));
    data.insert(
        "has_orderRelations".into(),
        json!(u8::from(order.has_collection("orderRelations"))),
    );
    data.insert("billingAddress_id".into(), json!(nested_id("billingAddress")));
    data.insert("deliveryAddress_id".into(), json!(nested_id("deliveryAddress")));

    if let Some((source, relations)) = first_collection(order, ADDRESS_RELATION_FIELDS) {
        data.insert("addressRelations_source".into(), json!(source));
        data.insert(
            "addressRelations_preview".into(),
            preview(&relations, &["typeId", "addressId", "referenceId"], &[]),
        );
    }
    if let Some(addresses) = order.try_get_collection("addresses") {
        data.insert(
            "addresses_preview".into(),
            preview(&addresses, &["id", "typeId", "addressTypeId", "addressId"], &[]),
        );
    }
    if let Some((source, relations)) = first_collection(order, RELATION_FIELDS) {
        data.insert("orderRelations_source".into(), json!(source));
        data.insert(
            "orderRelations_preview".into(),
            preview(&relations, &["referenceId"], &["referenceType", "relation"]),
        );
    }

    JsonValue::Object(data)
}

fn preview(entries: &[&dyn OrderAccess], int_fields: &[&str], str_fields: &[&str]) -> JsonValue {
    let mut out: Vec<JsonValue> = entries
        .iter()
        .take(DUMP_PREVIEW_LIMIT)
        .map(|entry| {
            let mut row = Map::new();
            for field in str_fields {
                let value = entry.try_get_str(field).map(|s| s.into_owned()).unwrap_or_default();
                row.insert((*field).to_string(), json!(value));
            }
            for field in int_fields {
                row.insert((*field).to_string(), json!(entry.try_get_int(field).unwrap_or(0)));
            }
            JsonValue::Object(row)
        })
        .collect();

    if entries.len() > DUMP_PREVIEW_LIMIT {
        out.push(json!({"...": "max reached"}));
    }

    JsonValue::Array(out)
}
