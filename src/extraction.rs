//! Value extraction from order records.
//!
//! Each extraction type resolves one identifying integer from an order by
//! walking an ordered fallback chain. The first step that yields a positive
//! integer wins; later steps are never consulted once a value is found.

use std::fmt;

use crate::record::OrderAccess;

/// Which attribute of an order a slot tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExtractionType {
    /// Receiver contact of the order.
    #[default]
    Contact,
    /// Billing address (address type 1).
    BillingAddress,
    /// Shipping address (address type 2).
    ShippingAddress,
    /// Any configured value that is not recognized. Never matches.
    Unknown(String),
}

impl ExtractionType {
    /// Parse a configured type name. Matching is exact and case-sensitive.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "contact" => ExtractionType::Contact,
            "billingAddress" => ExtractionType::BillingAddress,
            "shippingAddress" => ExtractionType::ShippingAddress,
            other => ExtractionType::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ExtractionType::Contact => "contact",
            ExtractionType::BillingAddress => "billingAddress",
            ExtractionType::ShippingAddress => "shippingAddress",
            ExtractionType::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ExtractionType::Unknown(_))
    }

    /// Fallback chain for this type, or `None` for unknown types.
    pub fn chain(&self) -> Option<FallbackChain> {
        match self {
            ExtractionType::Contact => Some(FallbackChain::contact()),
            ExtractionType::BillingAddress => Some(FallbackChain::address(AddressKind::Billing)),
            ExtractionType::ShippingAddress => Some(FallbackChain::address(AddressKind::Shipping)),
            ExtractionType::Unknown(_) => None,
        }
    }
}

impl fmt::Display for ExtractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Address kinds, identified by their address type id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Billing,
    Shipping,
}

impl AddressKind {
    pub fn type_id(self) -> i64 {
        match self {
            AddressKind::Billing => 1,
            AddressKind::Shipping => 2,
        }
    }

    /// Field holding the hydrated address object on the order.
    pub fn direct_field(self) -> &'static str {
        match self {
            AddressKind::Billing => "billingAddress",
            AddressKind::Shipping => "deliveryAddress",
        }
    }
}

/// Collections that may carry order relations, in lookup order.
pub(crate) const RELATION_FIELDS: &[&str] = &["orderRelations", "relations"];

/// Collections that may carry address relations, in lookup order.
pub(crate) const ADDRESS_RELATION_FIELDS: &[&str] = &[
    "addressRelations",
    "ordersAddressRelations",
    "orderAddressRelations",
];

/// One lookup in a fallback chain.
///
/// Any `Fn(&dyn OrderAccess) -> Option<i64>` closure is a step.
pub trait ExtractionStep: Send + Sync {
    /// Probe the order. `None` (or a non-positive value) means "try the next step".
    fn lookup(&self, order: &dyn OrderAccess) -> Option<i64>;
}

impl<F> ExtractionStep for F
where
    F: Fn(&dyn OrderAccess) -> Option<i64> + Send + Sync,
{
    fn lookup(&self, order: &dyn OrderAccess) -> Option<i64> {
        self(order)
    }
}

/// Value found by a chain, together with the step that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extracted {
    pub value: i64,
    pub step: &'static str,
}

/// Ordered list of named extraction steps.
pub struct FallbackChain {
    steps: Vec<(&'static str, Box<dyn ExtractionStep>)>,
}

impl FallbackChain {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step to the end of the chain.
    pub fn step(mut self, name: &'static str, step: impl ExtractionStep + 'static) -> Self {
        self.steps.push((name, Box::new(step)));
        self
    }

    /// Run the chain: the first step yielding a positive integer wins.
    pub fn resolve(&self, order: &dyn OrderAccess) -> Option<Extracted> {
        self.steps.iter().find_map(|(name, step)| {
            step.lookup(order)
                .filter(|value| *value > 0)
                .map(|value| Extracted { value, step: *name })
        })
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|(name, _)| *name).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Receiver contact chain: direct ids first, then the receiver relation.
    pub fn contact() -> Self {
        Self::new()
            .step("contactReceiverId", |order: &dyn OrderAccess| {
                order.try_get_int("contactReceiverId")
            })
            .step("contactId", |order: &dyn OrderAccess| order.try_get_int("contactId"))
            .step("orderRelations", receiver_relation)
    }

    /// Address chain: hydrated address, then address relations, then the
    /// generic address list.
    pub fn address(kind: AddressKind) -> Self {
        Self::new()
            .step(kind.direct_field(), move |order: &dyn OrderAccess| {
                direct_address(order, kind)
            })
            .step("addressRelations", move |order: &dyn OrderAccess| {
                address_relation(order, kind)
            })
            .step("addresses", move |order: &dyn OrderAccess| address_list(order, kind))
    }
}

impl Default for FallbackChain {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FallbackChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackChain")
            .field("steps", &self.step_names())
            .finish()
    }
}

/// Extract the identifying value for `extraction_type` from `order`.
///
/// Returns `None` for unknown types and when no step yields a positive id.
///
/// # Example
///
/// ```
/// use order_filter::{extract, ExtractionType};
/// use serde_json::json;
///
/// let order = json!({"addressRelations": [{"typeId": 2, "addressId": 31}]});
///
/// assert_eq!(extract(&order, &ExtractionType::ShippingAddress), Some(31));
/// assert_eq!(extract(&order, &ExtractionType::BillingAddress), None);
/// ```
pub fn extract(order: &dyn OrderAccess, extraction_type: &ExtractionType) -> Option<i64> {
    extract_with_step(order, extraction_type).map(|found| found.value)
}

/// Like [`extract`], but also reports which step produced the value.
pub fn extract_with_step(
    order: &dyn OrderAccess,
    extraction_type: &ExtractionType,
) -> Option<Extracted> {
    extraction_type.chain()?.resolve(order)
}

/// First non-empty collection among `fields`, with the field it came from.
pub(crate) fn first_collection<'a>(
    order: &'a dyn OrderAccess,
    fields: &[&'static str],
) -> Option<(&'static str, Vec<&'a dyn OrderAccess>)> {
    fields.iter().find_map(|field| {
        order
            .try_get_collection(field)
            .filter(|entries| !entries.is_empty())
            .map(|entries| (*field, entries))
    })
}

fn positive(value: Option<i64>) -> Option<i64> {
    value.filter(|v| *v > 0)
}

// The first receiver relation carrying a referenceId decides, even when
// that id is not positive.
fn receiver_relation(order: &dyn OrderAccess) -> Option<i64> {
    let (_, relations) = first_collection(order, RELATION_FIELDS)?;
    let reference = relations
        .into_iter()
        .filter(|relation| {
            relation.try_get_str("referenceType").as_deref() == Some("contact")
                && relation.try_get_str("relation").as_deref() == Some("receiver")
        })
        .find_map(|relation| relation.try_get_int("referenceId"));
    positive(reference)
}

fn direct_address(order: &dyn OrderAccess, kind: AddressKind) -> Option<i64> {
    order
        .try_get_object(kind.direct_field())
        .and_then(|address| positive(address.try_get_int("id")))
}

fn address_relation(order: &dyn OrderAccess, kind: AddressKind) -> Option<i64> {
    let (_, relations) = first_collection(order, ADDRESS_RELATION_FIELDS)?;
    relations
        .into_iter()
        .filter(|relation| relation.try_get_int("typeId") == Some(kind.type_id()))
        .find_map(|relation| {
            positive(relation.try_get_int("addressId"))
                .or_else(|| positive(relation.try_get_int("referenceId")))
        })
}

fn address_list(order: &dyn OrderAccess, kind: AddressKind) -> Option<i64> {
    order
        .try_get_collection("addresses")?
        .into_iter()
        .filter(|address| {
            let discriminator = address
                .try_get_int("typeId")
                .or_else(|| address.try_get_int("addressTypeId"));
            discriminator == Some(kind.type_id())
        })
        .find_map(|address| {
            positive(address.try_get_int("id"))
                .or_else(|| positive(address.try_get_int("addressId")))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extraction_type_parse() {
        assert_eq!(ExtractionType::parse("contact"), ExtractionType::Contact);
        assert_eq!(
            ExtractionType::parse("billingAddress"),
            ExtractionType::BillingAddress
        );
        assert_eq!(
            ExtractionType::parse("shippingAddress"),
            ExtractionType::ShippingAddress
        );
        assert_eq!(
            ExtractionType::parse("Contact"),
            ExtractionType::Unknown("Contact".to_string())
        );
        assert_eq!(ExtractionType::parse("unknownXyz").as_str(), "unknownXyz");
        assert!(ExtractionType::parse("unknownXyz").chain().is_none());
    }

    #[test]
    fn test_contact_prefers_receiver_id() {
        let order = json!({
            "contactReceiverId": 10,
            "contactId": 20,
            "orderRelations": [
                {"referenceType": "contact", "relation": "receiver", "referenceId": 30}
            ]
        });

        let found = extract_with_step(&order, &ExtractionType::Contact).unwrap();
        assert_eq!(found.value, 10);
        assert_eq!(found.step, "contactReceiverId");
    }

    #[test]
    fn test_contact_skips_zero_receiver_id() {
        let order = json!({"contactReceiverId": 0, "contactId": "20"});

        assert_eq!(extract(&order, &ExtractionType::Contact), Some(20));
    }

    #[test]
    fn test_contact_falls_back_to_relations() {
        let order = json!({
            "relations": [
                {"referenceType": "contact", "relation": "sender", "referenceId": 41},
                {"referenceType": "warehouse", "relation": "receiver", "referenceId": 43},
                {"referenceType": "contact", "relation": "receiver", "referenceId": 42}
            ]
        });

        let found = extract_with_step(&order, &ExtractionType::Contact).unwrap();
        assert_eq!(found.value, 42);
        assert_eq!(found.step, "orderRelations");
    }

    #[test]
    fn test_contact_skips_empty_relation_collection() {
        let order = json!({
            "relations": [],
            "orderRelations": [
                {"referenceType": "contact", "relation": "receiver", "referenceId": 42}
            ]
        });
        assert_eq!(extract(&order, &ExtractionType::Contact), Some(42));

        let order = json!({
            "orderRelations": [],
            "relations": [
                {"referenceType": "contact", "relation": "receiver", "referenceId": 43}
            ]
        });
        assert_eq!(extract(&order, &ExtractionType::Contact), Some(43));
    }

    #[test]
    fn test_contact_prefers_order_relations() {
        let order = json!({
            "relations": [
                {"referenceType": "contact", "relation": "receiver", "referenceId": 41}
            ],
            "orderRelations": [
                {"referenceType": "contact", "relation": "receiver", "referenceId": 42}
            ]
        });

        assert_eq!(extract(&order, &ExtractionType::Contact), Some(42));
    }

    #[test]
    fn test_first_receiver_relation_decides() {
        let order = json!({
            "orderRelations": [
                {"referenceType": "contact", "relation": "receiver", "referenceId": 0},
                {"referenceType": "contact", "relation": "receiver", "referenceId": 42}
            ]
        });
        assert_eq!(extract(&order, &ExtractionType::Contact), None);

        // Relations without a referenceId are passed over.
        let order = json!({
            "orderRelations": [
                {"referenceType": "contact", "relation": "receiver"},
                {"referenceType": "contact", "relation": "receiver", "referenceId": null},
                {"referenceType": "contact", "relation": "receiver", "referenceId": "42"}
            ]
        });
        assert_eq!(extract(&order, &ExtractionType::Contact), Some(42));
    }

    #[test]
    fn test_contact_not_found() {
        assert_eq!(extract(&json!({}), &ExtractionType::Contact), None);
        assert_eq!(extract(&json!(null), &ExtractionType::Contact), None);
    }

    #[test]
    fn test_billing_address_direct() {
        let order = json!({
            "billingAddress": {"id": 7},
            "addressRelations": [{"typeId": 1, "addressId": 8}]
        });

        assert_eq!(extract(&order, &ExtractionType::BillingAddress), Some(7));
    }

    #[test]
    fn test_shipping_address_uses_delivery_address() {
        let order = json!({
            "billingAddress": {"id": 7},
            "deliveryAddress": {"id": 9}
        });

        let found = extract_with_step(&order, &ExtractionType::ShippingAddress).unwrap();
        assert_eq!(found.value, 9);
        assert_eq!(found.step, "deliveryAddress");
    }

    #[test]
    fn test_address_relation_fallback() {
        let order = json!({
            "billingAddress": {"id": 0},
            "addressRelations": [
                {"typeId": 2, "addressId": 5},
                {"typeId": 1, "addressId": 0, "referenceId": 6}
            ]
        });

        let found = extract_with_step(&order, &ExtractionType::BillingAddress).unwrap();
        assert_eq!(found.value, 6);
        assert_eq!(found.step, "addressRelations");
    }

    #[test]
    fn test_alternate_address_relation_collections() {
        let order = json!({"ordersAddressRelations": [{"typeId": "1", "addressId": "77"}]});
        assert_eq!(extract(&order, &ExtractionType::BillingAddress), Some(77));

        let order = json!({"orderAddressRelations": [{"typeId": 2, "addressId": 78}]});
        assert_eq!(extract(&order, &ExtractionType::ShippingAddress), Some(78));
    }

    #[test]
    fn test_address_list_fallback() {
        let order = json!({
            "addresses": [
                {"typeId": 1, "id": 11},
                {"addressTypeId": 2, "id": 0, "addressId": 12}
            ]
        });

        assert_eq!(extract(&order, &ExtractionType::BillingAddress), Some(11));

        let found = extract_with_step(&order, &ExtractionType::ShippingAddress).unwrap();
        assert_eq!(found.value, 12);
        assert_eq!(found.step, "addresses");
    }

    #[test]
    fn test_address_type_id_wins_over_address_type_id() {
        let order = json!({"addresses": [{"typeId": 2, "addressTypeId": 1, "id": 13}]});

        assert_eq!(extract(&order, &ExtractionType::BillingAddress), None);
        assert_eq!(extract(&order, &ExtractionType::ShippingAddress), Some(13));
    }

    #[test]
    fn test_custom_chain_first_positive_wins() {
        let chain = FallbackChain::new()
            .step("zero", |_: &dyn OrderAccess| -> Option<i64> { Some(0) })
            .step("none", |_: &dyn OrderAccess| -> Option<i64> { None })
            .step("five", |_: &dyn OrderAccess| -> Option<i64> { Some(5) })
            .step("six", |_: &dyn OrderAccess| -> Option<i64> { Some(6) });

        assert_eq!(chain.len(), 4);
        assert_eq!(
            chain.resolve(&json!({})),
            Some(Extracted { value: 5, step: "five" })
        );
    }

    #[test]
    fn test_chain_step_names() {
        assert_eq!(
            FallbackChain::contact().step_names(),
            vec!["contactReceiverId", "contactId", "orderRelations"]
        );
        assert_eq!(
            FallbackChain::address(AddressKind::Shipping).step_names(),
            vec!["deliveryAddress", "addressRelations", "addresses"]
        );
    }
}
