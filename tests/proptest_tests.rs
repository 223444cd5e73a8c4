//! Property-based tests for validation and tax calculation.
//!
//! Run with: `cargo test --test proptest_tests`

use gstbill::core::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::{Value, json};

fn header(place_of_delivery: &str) -> InvoiceHeader {
    InvoiceHeader {
        logo_url: String::new(),
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
        invoice_no: "INV-PROP".into(),
        invoice_date: "2024-01-02".into(),
        reverse_charge: "No".into(),
        place_of_supply: "Seller State".into(),
        place_of_delivery: place_of_delivery.into(),
        signature_url: String::new(),
    }
}

fn submission(items: Value) -> Value {
    let mut value = serde_json::to_value(header("Seller State")).unwrap();
    value["items"] = items;
    value
}

// ── Strategies ──────────────────────────────────────────────────────────────

/// A price between 0.00 and 99999.99.
fn arb_price() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Common GST slabs plus an arbitrary two-decimal rate.
fn arb_rate() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        Just(Decimal::from(0)),
        Just(Decimal::from(5)),
        Just(Decimal::from(12)),
        Just(Decimal::from(18)),
        Just(Decimal::from(28)),
        (0i64..10_000).prop_map(|bp| Decimal::new(bp, 2)),
    ]
}

/// A line whose discount never exceeds its gross amount.
fn arb_item() -> impl Strategy<Value = LineItem> {
    (arb_price(), 1u64..=100, 0u32..=100, arb_rate()).prop_map(|(price, qty, pct, rate)| {
        let gross = price * Decimal::from(qty);
        LineItem {
            description: "Item".into(),
            unit_price: price,
            quantity: qty,
            discount: (gross * Decimal::from(pct) / Decimal::from(100)).round_dp(2),
            tax_rate: rate,
        }
    })
}

/// A line with no constraint tying discount to gross.
fn arb_any_item() -> impl Strategy<Value = LineItem> {
    (arb_price(), 1u64..=1000, arb_price(), arb_rate()).prop_map(|(price, qty, discount, rate)| {
        LineItem {
            description: "Item".into(),
            unit_price: price,
            quantity: qty,
            discount,
            tax_rate: rate,
        }
    })
}

fn record(items: Vec<LineItem>, place_of_delivery: &str) -> InvoiceRecord {
    InvoiceRecord {
        header: header(place_of_delivery),
        items,
    }
}

// ── Property Tests ──────────────────────────────────────────────────────────

proptest! {
    /// Exactly one of the two tax regimes carries the tax.
    #[test]
    fn one_regime_per_line(item in arb_item(), intra in any::<bool>()) {
        let split = if intra { TaxSplit::IntraState } else { TaxSplit::InterState };
        let line = compute_line(&item, split).unwrap();

        prop_assert!(line.net_amount >= Decimal::ZERO);
        if intra {
            prop_assert_eq!(line.igst_amount, Decimal::ZERO);
            prop_assert_eq!(line.cgst_amount, line.sgst_amount);
            prop_assert!(line.cgst_amount >= Decimal::ZERO);
        } else {
            prop_assert_eq!(line.cgst_amount, Decimal::ZERO);
            prop_assert_eq!(line.sgst_amount, Decimal::ZERO);
            prop_assert!(line.igst_amount >= Decimal::ZERO);
        }
        prop_assert_eq!(
            line.total_amount,
            line.net_amount + line.cgst_amount + line.sgst_amount + line.igst_amount
        );
    }

    /// The invoice total is the sum of line totals taken in order.
    #[test]
    fn total_is_sum_of_lines(items in prop::collection::vec(arb_item(), 1..=20)) {
        let doc = compute(&record(items, "Seller State"), &EnglishWords).unwrap();
        let expected = doc
            .items
            .iter()
            .fold(Decimal::ZERO, |acc, line| acc + line.total_amount);
        prop_assert_eq!(doc.total_amount, expected);
    }

    /// Only the split of the tax changes with the places, never its sum.
    #[test]
    fn split_does_not_change_total(items in prop::collection::vec(arb_item(), 1..=10)) {
        let intra = compute(&record(items.clone(), "Seller State"), &EnglishWords).unwrap();
        let inter = compute(&record(items, "Billing State"), &EnglishWords).unwrap();

        prop_assert_eq!(intra.tax_split, TaxSplit::IntraState);
        prop_assert_eq!(inter.tax_split, TaxSplit::InterState);
        prop_assert_eq!(intra.total_amount, inter.total_amount);
        for (a, b) in intra.items.iter().zip(&inter.items) {
            prop_assert_eq!(a.cgst_amount + a.sgst_amount, b.igst_amount);
        }
    }

    /// Calculation either succeeds or reports an error, whatever the discount.
    #[test]
    fn calculation_never_panics(items in prop::collection::vec(arb_any_item(), 1..=10)) {
        match compute(&record(items, "Billing State"), &EnglishWords) {
            Ok(doc) => prop_assert!(doc.total_amount >= Decimal::ZERO),
            Err(err) => prop_assert_eq!(err.kind(), ErrorKind::Conversion),
        }
    }

    /// Zero quantity is always rejected, at any position.
    #[test]
    fn zero_quantity_rejected(count in 1usize..=5, pick in any::<prop::sample::Index>()) {
        let bad = pick.index(count);
        let items: Vec<Value> = (0..count)
            .map(|i| json!({
                "description": "Item",
                "unit_price": 10,
                "quantity": if i == bad { 0 } else { 1 },
                "discount": 0,
                "tax_rate": 18
            }))
            .collect();
        let err = validate(&submission(Value::Array(items))).unwrap_err();
        prop_assert_eq!(err.field, format!("items[{bad}].quantity"));
    }

    /// Negative discounts are always rejected.
    #[test]
    fn negative_discount_rejected(cents in 1i64..1_000_000) {
        let discount = -(cents as f64) / 100.0;
        let items = json!([{
            "description": "Item",
            "unit_price": 10,
            "quantity": 1,
            "discount": discount,
            "tax_rate": 18
        }]);
        let err = validate(&submission(items)).unwrap_err();
        prop_assert_eq!(err.rule, ValidationRule::Discount);
        prop_assert_eq!(err.field, "items[0].discount");
    }

    /// A date followed by a time still passes the date format check.
    #[test]
    fn datetime_suffix_accepted(date in "[0-9]{4}-[0-9]{2}-[0-9]{2}", time in "(T[0-9]{2}:[0-9]{2}(:[0-9]{2})?)?") {
        let mut data = submission(json!([{
            "description": "Item", "unit_price": 1, "quantity": 1, "discount": 0, "tax_rate": 0
        }]));
        data["order_date"] = json!(format!("{date}{time}"));
        prop_assert!(validate(&data).is_ok());
    }

    /// Any four-two-two digit string passes the date format check.
    #[test]
    fn digit_dates_accepted(date in "[0-9]{4}-[0-9]{2}-[0-9]{2}") {
        let mut data = submission(json!([{
            "description": "Item", "unit_price": 1, "quantity": 1, "discount": 0, "tax_rate": 0
        }]));
        data["invoice_date"] = json!(date);
        prop_assert!(validate(&data).is_ok());
    }

    /// Anything that does not start with that shape fails it.
    #[test]
    fn other_dates_rejected(date in "[0-9/ .a-z-]{0,12}") {
        prop_assume!(!regex_like_date(&date));
        let mut data = submission(json!([{
            "description": "Item", "unit_price": 1, "quantity": 1, "discount": 0, "tax_rate": 0
        }]));
        data["order_date"] = json!(date);
        let err = validate(&data).unwrap_err();
        prop_assert_eq!(err.rule, ValidationRule::DateFormat);
    }
}

fn regex_like_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 10
        && b[..10].iter().enumerate().all(|(i, c)| match i {
            4 | 7 => *c == b'-',
            _ => c.is_ascii_digit(),
        })
}
