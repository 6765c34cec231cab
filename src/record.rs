//! Capability-probing access to loosely structured order records.
//!
//! Order payloads differ in shape depending on which part of the host pipeline
//! produced them. Nothing here assumes a field exists: every accessor answers
//! `None` when the field is missing or has an unusable type.

use serde_json::Value;
use std::borrow::Cow;

use crate::id_list::leading_int;

/// Read-only view of an order (or of a nested object inside one).
///
/// Extraction strategies depend only on this trait, never on a concrete
/// payload shape. `serde_json::Value` implements it out of the box.
///
/// # Example
///
/// ```
/// use order_filter::OrderAccess;
/// use serde_json::json;
///
/// let order = json!({"contactReceiverId": "17", "billingAddress": {"id": 4}});
///
/// assert_eq!(order.try_get_int("contactReceiverId"), Some(17));
/// let billing = order.try_get_object("billingAddress").unwrap();
/// assert_eq!(billing.try_get_int("id"), Some(4));
/// assert!(order.try_get_collection("addresses").is_none());
/// ```
pub trait OrderAccess {
    /// Integer value of a scalar field, coerced permissively.
    fn try_get_int(&self, field: &str) -> Option<i64>;

    /// String value of a scalar field. Numbers and booleans are rendered.
    fn try_get_str(&self, field: &str) -> Option<Cow<'_, str>>;

    /// Nested object stored under `field`.
    fn try_get_object(&self, field: &str) -> Option<&dyn OrderAccess>;

    /// Sequence of nested objects stored under `field`.
    ///
    /// Elements that are not objects are skipped.
    fn try_get_collection(&self, field: &str) -> Option<Vec<&dyn OrderAccess>>;

    /// Whether `field` holds a collection at all (even an empty one).
    fn has_collection(&self, field: &str) -> bool {
        self.try_get_collection(field).is_some()
    }
}

impl OrderAccess for Value {
    fn try_get_int(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(coerce_int)
    }

    fn try_get_str(&self, field: &str) -> Option<Cow<'_, str>> {
        match self.get(field)? {
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::Bool(true) => Some(Cow::Borrowed("1")),
            Value::Bool(false) => Some(Cow::Borrowed("")),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    fn try_get_object(&self, field: &str) -> Option<&dyn OrderAccess> {
        let nested = self.get(field)?;
        if nested.is_object() {
            Some(nested as &dyn OrderAccess)
        } else {
            None
        }
    }

    fn try_get_collection(&self, field: &str) -> Option<Vec<&dyn OrderAccess>> {
        match self.get(field)? {
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter(|item| item.is_object())
                    .map(|item| item as &dyn OrderAccess)
                    .collect(),
            ),
            _ => None,
        }
    }
}

/// Coerce a JSON scalar to an integer.
///
/// Integers pass through, floats are truncated, booleans map to 0/1 and
/// strings use their leading numeric prefix (`"12ab"` is 12, `"ab"` is 0).
/// `null`, arrays and objects are treated as absent.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i)
            } else if let Some(u) = n.as_u64() {
                Some(i64::try_from(u).unwrap_or(i64::MAX))
            } else {
                n.as_f64().map(truncate_float)
            }
        }
        Value::String(s) => Some(leading_int(s)),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn truncate_float(f: f64) -> i64 {
    if f.is_finite() {
        // `as` saturates at the i64 bounds.
        f.trunc() as i64
    } else {
        0
    }
}

/// Coerce a JSON scalar to a string the way loose casts render scalars.
pub fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some(String::new()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
