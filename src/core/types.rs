use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Descriptive fields of an invoice submission (everything except the items).
///
/// Field names match the wire format the billing pipeline submits, so the
/// struct serializes flat into the template context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceHeader {
    /// Reference to the seller's logo image.
    pub logo_url: String,

    // Seller block
    pub seller_name: String,
    pub seller_address: String,
    pub seller_city: String,
    pub seller_state: String,
    pub seller_pincode: String,
    /// Permanent Account Number of the seller.
    pub seller_pan: String,
    /// GST identification number of the seller.
    pub seller_gst: String,

    // Billing block
    pub billing_name: String,
    pub billing_address: String,
    pub billing_city: String,
    pub billing_state: String,
    pub billing_pincode: String,
    pub billing_state_code: String,

    // Shipping block
    pub shipping_name: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_pincode: String,
    pub shipping_state_code: String,

    pub order_no: String,
    /// Order date, `YYYY-MM-DD` (pattern-checked only).
    pub order_date: String,
    pub invoice_no: String,
    /// Invoice date, `YYYY-MM-DD` (pattern-checked only).
    pub invoice_date: String,
    /// Whether tax is payable on reverse charge, carried through as text.
    pub reverse_charge: String,
    /// Jurisdiction of supply; compared literally with `place_of_delivery`.
    pub place_of_supply: String,
    pub place_of_delivery: String,
    /// Reference to the authorised signature image.
    pub signature_url: String,
}

/// One billed unit as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub description: String,
    /// Price per unit, non-negative.
    #[serde(with = "amount")]
    pub unit_price: Decimal,
    /// Number of units, positive.
    pub quantity: u64,
    /// Absolute discount on the line (currency amount, not a percentage).
    #[serde(with = "amount")]
    pub discount: Decimal,
    /// Tax rate in percent (e.g. 18 for 18%).
    #[serde(with = "rate")]
    pub tax_rate: Decimal,
}

/// A validated invoice submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    #[serde(flatten)]
    pub header: InvoiceHeader,
    pub items: Vec<LineItem>,
}

/// Which tax components apply to an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxSplit {
    /// Supply and delivery in the same state: CGST + SGST, half the rate each.
    IntraState,
    /// Supply and delivery in different states: IGST at the full rate.
    InterState,
}

impl TaxSplit {
    pub fn is_intra_state(&self) -> bool {
        matches!(self, Self::IntraState)
    }
}

/// A line item with its derived amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedLineItem {
    #[serde(flatten)]
    pub item: LineItem,
    /// unit_price × quantity − discount (may be negative).
    #[serde(with = "amount")]
    pub net_amount: Decimal,
    #[serde(with = "amount")]
    pub cgst_amount: Decimal,
    #[serde(with = "amount")]
    pub sgst_amount: Decimal,
    #[serde(with = "amount")]
    pub igst_amount: Decimal,
    /// net + cgst + sgst + igst.
    #[serde(with = "amount")]
    pub total_amount: Decimal,
}

/// The calculated invoice handed to the template renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDocument {
    #[serde(flatten)]
    pub header: InvoiceHeader,
    pub items: Vec<ComputedLineItem>,
    pub tax_split: TaxSplit,
    /// Sum of all item totals, in item order.
    #[serde(with = "amount")]
    pub total_amount: Decimal,
    /// `total_amount` in English words, first letter capitalized.
    pub amount_in_words: String,
}

/// Format a Decimal for display: always include at least 2 decimal places,
/// strip trailing zeros beyond that.
pub fn format_amount(d: Decimal) -> String {
    let s = d.normalize().to_string();
    if let Some(dot_pos) = s.find('.') {
        let decimals = s.len() - dot_pos - 1;
        if decimals < 2 {
            format!("{s}{}", "0".repeat(2 - decimals))
        } else {
            s
        }
    } else {
        format!("{s}.00")
    }
}

/// Convert a JSON number to a Decimal through its shortest textual form,
/// so `17.1` stays exactly `17.1`.
pub(crate) fn decimal_from_number(n: &serde_json::Number) -> Option<Decimal> {
    if let Some(i) = n.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(Decimal::from(u));
    }
    let text = n.to_string();
    text.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn decimal_from_value<E: serde::de::Error>(value: serde_json::Value) -> Result<Decimal, E> {
    match value {
        serde_json::Value::Number(n) => decimal_from_number(&n)
            .ok_or_else(|| E::custom(format!("number {n} is out of range"))),
        serde_json::Value::String(s) => s.trim().parse::<Decimal>().map_err(E::custom),
        other => Err(E::custom(format!("expected a number, got {other}"))),
    }
}

/// Monetary amounts: accept JSON numbers or strings, emit display strings.
mod amount {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_amount(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        super::decimal_from_value(serde_json::Value::deserialize(deserializer)?)
    }
}

/// Percentages: emitted without trailing zeros ("18", "2.5").
mod rate {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.normalize().to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        super::decimal_from_value(serde_json::Value::deserialize(deserializer)?)
    }
}

/// Header of the reference sample invoice (intra-state: supply and delivery
/// both in "Seller State").
#[cfg(test)]
pub(crate) fn test_header() -> InvoiceHeader {
    InvoiceHeader {
        logo_url: "https://example.com/logo.png".into(),
        seller_name: "Example Seller".into(),
        seller_address: "123 Seller St.".into(),
        seller_city: "Seller City".into(),
        seller_state: "Seller State".into(),
        seller_pincode: "123456".into(),
        seller_pan: "ABCDE1234F".into(),
        seller_gst: "12ABCDE1234F1Z5".into(),
        billing_name: "Customer Name".into(),
        billing_address: "456 Billing St.".into(),
        billing_city: "Billing City".into(),
        billing_state: "Billing State".into(),
        billing_pincode: "654321".into(),
        billing_state_code: "12".into(),
        shipping_name: "Customer Name".into(),
        shipping_address: "789 Shipping St.".into(),
        shipping_city: "Shipping City".into(),
        shipping_state: "Shipping State".into(),
        shipping_pincode: "987654".into(),
        shipping_state_code: "34".into(),
        order_no: "ORD123".into(),
        order_date: "2024-01-01".into(),
        invoice_no: "INV123".into(),
        invoice_date: "2024-01-02".into(),
        reverse_charge: "No".into(),
        place_of_supply: "Seller State".into(),
        place_of_delivery: "Seller State".into(),
        signature_url: "https://example.com/signature.png".into(),
    }
}
