use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{InvoiceError, ValidationError, ValidationRule};
use super::types::{InvoiceRecord, LineItem, decimal_from_number};

/// Top-level fields every submission must carry, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 29] = [
    "logo_url",
    "seller_name",
    "seller_address",
    "seller_city",
    "seller_state",
    "seller_pincode",
    "seller_pan",
    "seller_gst",
    "billing_name",
    "billing_address",
    "billing_city",
    "billing_state",
    "billing_pincode",
    "billing_state_code",
    "shipping_name",
    "shipping_address",
    "shipping_city",
    "shipping_state",
    "shipping_pincode",
    "shipping_state_code",
    "order_no",
    "order_date",
    "invoice_no",
    "invoice_date",
    "reverse_charge",
    "place_of_supply",
    "place_of_delivery",
    "items",
    "signature_url",
];

/// Optional hardening rules on top of the base checks. Both are off by
/// default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    /// Reject items whose discount exceeds `unit_price × quantity`.
    pub reject_negative_net: bool,
    /// Require dates to be real calendar dates, not just `YYYY-MM-DD`-shaped.
    pub calendar_dates: bool,
}

/// Validate a raw submission with the default policy.
///
/// Stops at the first failing rule:
/// 1. all [`REQUIRED_FIELDS`] present
/// 2. `order_date` and `invoice_date` start with `YYYY-MM-DD`
/// 3. `items` is a non-empty list
/// 4. per item: `unit_price` number ≥ 0, `quantity` integer > 0,
///    `discount` number ≥ 0, `tax_rate` number ≥ 0
///
/// No upper bounds are checked. A number too large or too precise for a
/// [`Decimal`] passes here and is reported by [`parse_submission`] as a
/// conversion error.
pub fn validate(submission: &Value) -> Result<(), ValidationError> {
    validate_with(submission, &ValidationPolicy::default())
}

/// Validate a raw submission against the given policy.
pub fn validate_with(submission: &Value, policy: &ValidationPolicy) -> Result<(), ValidationError> {
    let Some(map) = submission.as_object() else {
        return Err(ValidationError::new(
            "record",
            "submission must be a JSON object",
            ValidationRule::RequiredField,
        ));
    };

    for field in REQUIRED_FIELDS {
        if !map.contains_key(field) {
            return Err(ValidationError::new(
                field,
                format!("Missing required field: {field}"),
                ValidationRule::RequiredField,
            ));
        }
    }

    check_date("order_date", "order", map["order_date"].as_str(), policy)?;
    check_date("invoice_date", "invoice", map["invoice_date"].as_str(), policy)?;

    let items = map["items"]
        .as_array()
        .filter(|items| !items.is_empty())
        .ok_or_else(empty_items)?;

    for (index, item) in items.iter().enumerate() {
        let field = |key: &str| item.get(key);

        let unit_price = check_unit_price(index, field("unit_price").and_then(number))?;
        let quantity = check_quantity(index, field("quantity").and_then(Value::as_u64))?;
        let discount = check_discount(index, field("discount").and_then(number))?;
        check_tax_rate(index, field("tax_rate").and_then(number))?;

        if policy.reject_negative_net {
            check_net_amount(index, unit_price, quantity, discount)?;
        }
    }

    Ok(())
}

/// Validate a submission and convert it into a typed [`InvoiceRecord`].
///
/// Text fields that are not strings are rendered as text: scalars with
/// their JSON form, `null` as an empty string, arrays and objects as JSON.
/// Unknown fields are ignored. An item amount that no [`Decimal`] can hold
/// fails with [`InvoiceError::Conversion`].
pub fn parse_submission(
    submission: &Value,
    policy: &ValidationPolicy,
) -> Result<InvoiceRecord, InvoiceError> {
    validate_with(submission, policy)?;

    let mut normalized: Map<String, Value> = match submission {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    for field in text_fields() {
        if let Some(value) = normalized.get_mut(field) {
            stringify_text(value);
        }
    }
    if let Some(Value::Array(items)) = normalized.get_mut("items") {
        for (index, item) in items.iter_mut().enumerate() {
            if let Some(description) = item.get_mut("description") {
                stringify_text(description);
            }
            check_representable(index, item)?;
        }
    }

    serde_json::from_value(Value::Object(normalized)).map_err(|e| {
        InvoiceError::Validation(ValidationError::new(
            "record",
            format!("malformed submission: {e}"),
            ValidationRule::RequiredField,
        ))
    })
}

/// Re-check a typed record (e.g. one assembled in code) against the rules
/// that its types do not already guarantee.
pub fn validate_record(
    record: &InvoiceRecord,
    policy: &ValidationPolicy,
) -> Result<(), ValidationError> {
    check_date("order_date", "order", Some(&record.header.order_date), policy)?;
    check_date(
        "invoice_date",
        "invoice",
        Some(&record.header.invoice_date),
        policy,
    )?;

    if record.items.is_empty() {
        return Err(empty_items());
    }

    for (index, item) in record.items.iter().enumerate() {
        validate_item(index, item, policy)?;
    }

    Ok(())
}

fn validate_item(
    index: usize,
    item: &LineItem,
    policy: &ValidationPolicy,
) -> Result<(), ValidationError> {
    let unit_price = check_unit_price(index, Some(NumberField::exact(item.unit_price)))?;
    let quantity = check_quantity(index, Some(item.quantity))?;
    let discount = check_discount(index, Some(NumberField::exact(item.discount)))?;
    check_tax_rate(index, Some(NumberField::exact(item.tax_rate)))?;

    if policy.reject_negative_net {
        check_net_amount(index, unit_price, quantity, discount)?;
    }
    Ok(())
}

fn text_fields() -> impl Iterator<Item = &'static str> {
    REQUIRED_FIELDS.into_iter().filter(|f| *f != "items")
}

fn stringify_text(value: &mut Value) {
    let text = match value {
        Value::String(_) => return,
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        ref other => other.to_string(),
    };
    *value = Value::String(text);
}

fn check_representable(index: usize, item: &Value) -> Result<(), InvoiceError> {
    for key in ["unit_price", "discount", "tax_rate"] {
        if let Some(Value::Number(n)) = item.get(key) {
            if decimal_from_number(n).is_none() {
                return Err(InvoiceError::Conversion(format!(
                    "{} value {n} is not representable",
                    item_field(index, key)
                )));
            }
        }
    }
    Ok(())
}

fn empty_items() -> ValidationError {
    ValidationError::new(
        "items",
        "Items must be a non-empty list.",
        ValidationRule::Items,
    )
}

/// Starts with the `YYYY-MM-DD` shape: four digits, hyphen, two digits,
/// hyphen, two digits. Whatever follows (a time, a zone) is not checked.
fn matches_date_pattern(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 10
        && bytes[..10].iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

fn check_date(
    field: &str,
    label: &str,
    value: Option<&str>,
    policy: &ValidationPolicy,
) -> Result<(), ValidationError> {
    let Some(date) = value.filter(|s| matches_date_pattern(s)) else {
        return Err(ValidationError::new(
            field,
            format!("Invalid {label} date format. Expected YYYY-MM-DD."),
            ValidationRule::DateFormat,
        ));
    };

    // The first ten bytes are ASCII, so the slice is on a char boundary.
    let day = &date[..10];
    if policy.calendar_dates && NaiveDate::parse_from_str(day, "%Y-%m-%d").is_err() {
        return Err(ValidationError::new(
            field,
            format!("Invalid {label} date: {day} is not a calendar date."),
            ValidationRule::CalendarDate,
        ));
    }
    Ok(())
}

/// A submitted amount: its sign, and its exact value when a [`Decimal`]
/// can hold it.
#[derive(Debug, Clone, Copy)]
struct NumberField {
    non_negative: bool,
    exact: Option<Decimal>,
}

impl NumberField {
    fn exact(value: Decimal) -> Self {
        Self {
            non_negative: value >= Decimal::ZERO,
            exact: Some(value),
        }
    }
}

fn number(value: &Value) -> Option<NumberField> {
    let Value::Number(n) = value else {
        return None;
    };
    Some(NumberField {
        non_negative: n.as_f64().is_some_and(|f| f >= 0.0),
        exact: decimal_from_number(n),
    })
}

fn item_field(index: usize, key: &str) -> String {
    format!("items[{index}].{key}")
}

fn non_negative(
    index: usize,
    key: &str,
    label: &str,
    rule: ValidationRule,
    value: Option<NumberField>,
) -> Result<Option<Decimal>, ValidationError> {
    match value {
        Some(field) if field.non_negative => Ok(field.exact),
        _ => Err(ValidationError::new(
            item_field(index, key),
            format!("Invalid {label} in items: expected a number >= 0."),
            rule,
        )),
    }
}

fn check_unit_price(
    index: usize,
    value: Option<NumberField>,
) -> Result<Option<Decimal>, ValidationError> {
    non_negative(index, "unit_price", "unit price", ValidationRule::UnitPrice, value)
}

fn check_discount(
    index: usize,
    value: Option<NumberField>,
) -> Result<Option<Decimal>, ValidationError> {
    non_negative(index, "discount", "discount", ValidationRule::Discount, value)
}

fn check_tax_rate(
    index: usize,
    value: Option<NumberField>,
) -> Result<Option<Decimal>, ValidationError> {
    non_negative(index, "tax_rate", "tax rate", ValidationRule::TaxRate, value)
}

/// `value` is `None` unless the field is a JSON integer that fits a `u64`.
fn check_quantity(index: usize, value: Option<u64>) -> Result<u64, ValidationError> {
    value.filter(|q| *q > 0).ok_or_else(|| {
        ValidationError::new(
            item_field(index, "quantity"),
            "Invalid quantity in items: expected an integer > 0.",
            ValidationRule::Quantity,
        )
    })
}

fn check_net_amount(
    index: usize,
    unit_price: Option<Decimal>,
    quantity: u64,
    discount: Option<Decimal>,
) -> Result<(), ValidationError> {
    // Amounts no Decimal can hold are left to the calculator.
    let (Some(unit_price), Some(discount)) = (unit_price, discount) else {
        return Ok(());
    };
    // An overflowing gross amount cannot be smaller than the discount.
    let negative = unit_price
        .checked_mul(Decimal::from(quantity))
        .is_some_and(|gross| gross < discount);
    if negative {
        return Err(ValidationError::new(
            item_field(index, "discount"),
            format!("Discount {discount} exceeds the gross amount of the item."),
            ValidationRule::NetAmount,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn submission() -> Value {
        json!({
            "logo_url": "https://example.com/logo.png",
            "seller_name": "Example Seller",
            "seller_address": "123 Seller St.",
            "seller_city": "Seller City",
            "seller_state": "Seller State",
            "seller_pincode": "123456",
            "seller_pan": "ABCDE1234F",
            "seller_gst": "12ABCDE1234F1Z5",
            "billing_name": "Customer Name",
            "billing_address": "456 Billing St.",
            "billing_city": "Billing City",
            "billing_state": "Billing State",
            "billing_pincode": "654321",
            "billing_state_code": "12",
            "shipping_name": "Customer Name",
            "shipping_address": "789 Shipping St.",
            "shipping_city": "Shipping City",
            "shipping_state": "Shipping State",
            "shipping_pincode": "987654",
            "shipping_state_code": "34",
            "order_no": "ORD123",
            "order_date": "2024-01-01",
            "invoice_no": "INV123",
            "invoice_date": "2024-01-02",
            "reverse_charge": "No",
            "place_of_supply": "Seller State",
            "place_of_delivery": "Seller State",
            "items": [
                {"description": "Item 1", "unit_price": 100.00, "quantity": 2, "discount": 10.00, "tax_rate": 18},
                {"description": "Item 2", "unit_price": 200.00, "quantity": 1, "discount": 0.00, "tax_rate": 18}
            ],
            "signature_url": "https://example.com/signature.png"
        })
    }

    fn rule_of(value: &Value) -> ValidationRule {
        validate(value).unwrap_err().rule
    }

    #[test]
    fn valid_submission() {
        assert_eq!(validate(&submission()), Ok(()));
    }

    #[test]
    fn non_object_rejected() {
        assert_eq!(rule_of(&json!([1, 2])), ValidationRule::RequiredField);
    }

    #[test]
    fn first_missing_field_wins() {
        let mut data = submission();
        let map = data.as_object_mut().unwrap();
        map.remove("seller_gst");
        map.remove("signature_url");
        let err = validate(&data).unwrap_err();
        assert_eq!(err.field, "seller_gst");
        assert_eq!(err.message, "Missing required field: seller_gst");
    }

    #[test]
    fn missing_field_checked_before_dates() {
        let mut data = submission();
        data["order_date"] = json!("01-01-2024");
        data.as_object_mut().unwrap().remove("items");
        assert_eq!(rule_of(&data), ValidationRule::RequiredField);
    }

    #[test]
    fn date_pattern() {
        assert!(matches_date_pattern("2024-01-01"));
        assert!(matches_date_pattern("2024-02-31"));
        assert!(!matches_date_pattern("01-01-2024"));
        assert!(!matches_date_pattern("2024-1-01"));
        assert!(matches_date_pattern("2024-01-01T00:00"));
        assert!(!matches_date_pattern("2024-01-0"));
        assert!(!matches_date_pattern(" 2024-01-01"));
        assert!(!matches_date_pattern(""));
    }

    #[test]
    fn non_string_date_rejected() {
        let mut data = submission();
        data["invoice_date"] = json!(20240102);
        let err = validate(&data).unwrap_err();
        assert_eq!(err.field, "invoice_date");
        assert_eq!(err.rule, ValidationRule::DateFormat);
    }

    #[test]
    fn calendar_dates_policy() {
        let mut data = submission();
        data["order_date"] = json!("2024-02-31");
        assert_eq!(validate(&data), Ok(()));

        let policy = ValidationPolicy {
            calendar_dates: true,
            ..Default::default()
        };
        let err = validate_with(&data, &policy).unwrap_err();
        assert_eq!(err.rule, ValidationRule::CalendarDate);
    }

    #[test]
    fn items_must_be_non_empty_list() {
        let mut data = submission();
        data["items"] = json!([]);
        assert_eq!(rule_of(&data), ValidationRule::Items);
        data["items"] = json!({"description": "not a list"});
        assert_eq!(rule_of(&data), ValidationRule::Items);
    }

    #[test]
    fn item_rules() {
        let cases = [
            ("unit_price", json!(-1), ValidationRule::UnitPrice),
            ("unit_price", json!("100"), ValidationRule::UnitPrice),
            ("quantity", json!(0), ValidationRule::Quantity),
            ("quantity", json!(1.5), ValidationRule::Quantity),
            ("quantity", json!(2.0), ValidationRule::Quantity),
            ("quantity", json!(true), ValidationRule::Quantity),
            ("quantity", json!(-3), ValidationRule::Quantity),
            ("discount", json!(-5), ValidationRule::Discount),
            ("tax_rate", json!(-18), ValidationRule::TaxRate),
        ];
        for (key, value, rule) in cases {
            let mut data = submission();
            data["items"][1][key] = value.clone();
            let err = validate(&data).unwrap_err();
            assert_eq!(err.rule, rule, "{key} = {value}");
            assert_eq!(err.field, format!("items[1].{key}"));
        }
    }

    #[test]
    fn missing_item_key() {
        let mut data = submission();
        data["items"][0].as_object_mut().unwrap().remove("tax_rate");
        assert_eq!(rule_of(&data), ValidationRule::TaxRate);
    }

    #[test]
    fn negative_net_is_allowed_unless_policy_says_otherwise() {
        let mut data = submission();
        data["items"][0]["discount"] = json!(500);
        assert_eq!(validate(&data), Ok(()));

        let policy = ValidationPolicy {
            reject_negative_net: true,
            ..Default::default()
        };
        let err = validate_with(&data, &policy).unwrap_err();
        assert_eq!(err.rule, ValidationRule::NetAmount);
        assert_eq!(err.field, "items[0].discount");
    }

    #[test]
    fn structured_text_field_is_stringified() {
        let mut data = submission();
        data["seller_name"] = json!({"first": "Example"});
        data["billing_name"] = json!(["A", "B"]);
        assert_eq!(validate(&data), Ok(()));

        let record = parse_submission(&data, &ValidationPolicy::default()).unwrap();
        assert_eq!(record.header.seller_name, r#"{"first":"Example"}"#);
        assert_eq!(record.header.billing_name, r#"["A","B"]"#);
    }

    #[test]
    fn datetime_suffix_is_accepted() {
        let mut data = submission();
        data["order_date"] = json!("2024-01-01T10:00:00");
        data["invoice_date"] = json!("2024-01-02 09:30");
        assert_eq!(validate(&data), Ok(()));

        let policy = ValidationPolicy {
            calendar_dates: true,
            ..Default::default()
        };
        assert_eq!(validate_with(&data, &policy), Ok(()));

        data["order_date"] = json!("2024-02-30T10:00:00");
        let err = validate_with(&data, &policy).unwrap_err();
        assert_eq!(err.rule, ValidationRule::CalendarDate);
    }

    #[test]
    fn quantity_has_no_upper_bound() {
        let mut data = submission();
        data["items"][0]["quantity"] = json!(5_000_000_000u64);
        assert_eq!(validate(&data), Ok(()));

        let record = parse_submission(&data, &ValidationPolicy::default()).unwrap();
        assert_eq!(record.items[0].quantity, 5_000_000_000);
    }

    #[test]
    fn unrepresentable_amounts_pass_validation() {
        for (key, value) in [
            ("unit_price", json!(1e30)),
            ("unit_price", json!(1e-30)),
            ("discount", json!(1e30)),
            ("tax_rate", json!(1e29)),
        ] {
            let mut data = submission();
            data["items"][0][key] = value.clone();
            assert_eq!(validate(&data), Ok(()), "{key} = {value}");

            let err = parse_submission(&data, &ValidationPolicy::default()).unwrap_err();
            assert!(
                matches!(&err, InvoiceError::Conversion(msg) if msg.contains(&format!("items[0].{key}"))),
                "{key} = {value}: {err}"
            );
        }
    }

    #[test]
    fn negative_net_policy_skips_unrepresentable_amounts() {
        let mut data = submission();
        data["items"][0]["discount"] = json!(1e30);
        let policy = ValidationPolicy {
            reject_negative_net: true,
            ..Default::default()
        };
        assert_eq!(validate_with(&data, &policy), Ok(()));
    }

    #[test]
    fn parse_submission_stringifies_scalars() {
        let mut data = submission();
        data["seller_pincode"] = json!(123456);
        data["reverse_charge"] = json!(false);
        data["logo_url"] = Value::Null;
        data["extra"] = json!("ignored");

        let record = parse_submission(&data, &ValidationPolicy::default()).unwrap();
        assert_eq!(record.header.seller_pincode, "123456");
        assert_eq!(record.header.reverse_charge, "false");
        assert_eq!(record.header.logo_url, "");
        assert_eq!(record.items.len(), 2);
        assert_eq!(record.items[0].unit_price, dec!(100));
        assert_eq!(record.items[0].quantity, 2);
    }

    #[test]
    fn validate_record_checks_typed_fields() {
        let data = submission();
        let mut record = parse_submission(&data, &ValidationPolicy::default()).unwrap();
        assert_eq!(validate_record(&record, &ValidationPolicy::default()), Ok(()));

        record.items[1].quantity = 0;
        let err = validate_record(&record, &ValidationPolicy::default()).unwrap_err();
        assert_eq!(err.rule, ValidationRule::Quantity);

        record.items.clear();
        let err = validate_record(&record, &ValidationPolicy::default()).unwrap_err();
        assert_eq!(err.rule, ValidationRule::Items);
    }
}
