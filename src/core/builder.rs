use rust_decimal::Decimal;

use super::error::InvoiceError;
use super::types::*;
use super::validation::{self, ValidationPolicy};

/// Builder for invoice records assembled in code rather than parsed from a
/// JSON submission.
///
/// ```
/// use gstbill::core::*;
/// use rust_decimal_macros::dec;
///
/// let addressee = Addressee::new("Customer Name", "456 Billing St.", "Bengaluru", "Karnataka", "560001", "29");
/// let record = InvoiceRecordBuilder::new("INV123", "2024-01-02")
///     .seller(SellerDetails::new("Example Seller", "123 Seller St.", "Bengaluru", "Karnataka", "560002")
///         .pan("ABCDE1234F")
///         .gst("29ABCDE1234F1Z5"))
///     .billing(addressee.clone())
///     .shipping(addressee)
///     .order("ORD123", "2024-01-01")
///     .places("Karnataka", "Karnataka")
///     .add_item(LineItemBuilder::new("Consulting", dec!(100), 2).discount(dec!(10)).tax_rate(dec!(18)).build())
///     .build()
///     .unwrap();
///
/// assert_eq!(record.items.len(), 1);
/// ```
pub struct InvoiceRecordBuilder {
    invoice_no: String,
    invoice_date: String,
    order_no: String,
    order_date: String,
    logo_url: String,
    signature_url: String,
    seller: Option<SellerDetails>,
    billing: Option<Addressee>,
    shipping: Option<Addressee>,
    reverse_charge: String,
    place_of_supply: String,
    place_of_delivery: String,
    items: Vec<LineItem>,
    policy: ValidationPolicy,
}

impl InvoiceRecordBuilder {
    pub fn new(invoice_no: impl Into<String>, invoice_date: impl Into<String>) -> Self {
        Self {
            invoice_no: invoice_no.into(),
            invoice_date: invoice_date.into(),
            order_no: String::new(),
            order_date: String::new(),
            logo_url: String::new(),
            signature_url: String::new(),
            seller: None,
            billing: None,
            shipping: None,
            reverse_charge: "No".to_string(),
            place_of_supply: String::new(),
            place_of_delivery: String::new(),
            items: Vec::new(),
            policy: ValidationPolicy::default(),
        }
    }

    pub fn order(mut self, order_no: impl Into<String>, order_date: impl Into<String>) -> Self {
        self.order_no = order_no.into();
        self.order_date = order_date.into();
        self
    }

    pub fn logo_url(mut self, url: impl Into<String>) -> Self {
        self.logo_url = url.into();
        self
    }

    pub fn signature_url(mut self, url: impl Into<String>) -> Self {
        self.signature_url = url.into();
        self
    }

    pub fn seller(mut self, seller: SellerDetails) -> Self {
        self.seller = Some(seller);
        self
    }

    pub fn billing(mut self, party: Addressee) -> Self {
        self.billing = Some(party);
        self
    }

    pub fn shipping(mut self, party: Addressee) -> Self {
        self.shipping = Some(party);
        self
    }

    pub fn reverse_charge(mut self, applies: bool) -> Self {
        self.reverse_charge = if applies { "Yes" } else { "No" }.to_string();
        self
    }

    /// Place of supply and place of delivery.
    pub fn places(mut self, supply: impl Into<String>, delivery: impl Into<String>) -> Self {
        self.place_of_supply = supply.into();
        self.place_of_delivery = delivery.into();
        self
    }

    pub fn add_item(mut self, item: LineItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the record and run the validation rules its types leave open.
    pub fn build(self) -> Result<InvoiceRecord, InvoiceError> {
        let policy = self.policy;
        let record = self.build_unchecked()?;
        validation::validate_record(&record, &policy)?;
        Ok(record)
    }

    /// Build without validation, for tests or records imported from elsewhere.
    /// Fails only when a party block was never set.
    pub fn build_unchecked(self) -> Result<InvoiceRecord, InvoiceError> {
        let seller = self.seller.ok_or_else(|| missing("seller_name"))?;
        let billing = self.billing.ok_or_else(|| missing("billing_name"))?;
        let shipping = self.shipping.ok_or_else(|| missing("shipping_name"))?;

        Ok(InvoiceRecord {
            header: InvoiceHeader {
                logo_url: self.logo_url,
                seller_name: seller.name,
                seller_address: seller.address,
                seller_city: seller.city,
                seller_state: seller.state,
                seller_pincode: seller.pincode,
                seller_pan: seller.pan,
                seller_gst: seller.gst,
                billing_name: billing.name,
                billing_address: billing.address,
                billing_city: billing.city,
                billing_state: billing.state,
                billing_pincode: billing.pincode,
                billing_state_code: billing.state_code,
                shipping_name: shipping.name,
                shipping_address: shipping.address,
                shipping_city: shipping.city,
                shipping_state: shipping.state,
                shipping_pincode: shipping.pincode,
                shipping_state_code: shipping.state_code,
                order_no: self.order_no,
                order_date: self.order_date,
                invoice_no: self.invoice_no,
                invoice_date: self.invoice_date,
                reverse_charge: self.reverse_charge,
                place_of_supply: self.place_of_supply,
                place_of_delivery: self.place_of_delivery,
                signature_url: self.signature_url,
            },
            items: self.items,
        })
    }
}

fn missing(field: &str) -> InvoiceError {
    InvoiceError::Validation(super::error::ValidationError::new(
        field,
        format!("Missing required field: {field}"),
        super::error::ValidationRule::RequiredField,
    ))
}

/// Seller identity and address block.
#[derive(Debug, Clone)]
pub struct SellerDetails {
    name: String,
    address: String,
    city: String,
    state: String,
    pincode: String,
    pan: String,
    gst: String,
}

impl SellerDetails {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        pincode: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            city: city.into(),
            state: state.into(),
            pincode: pincode.into(),
            pan: String::new(),
            gst: String::new(),
        }
    }

    pub fn pan(mut self, pan: impl Into<String>) -> Self {
        self.pan = pan.into();
        self
    }

    pub fn gst(mut self, gst: impl Into<String>) -> Self {
        self.gst = gst.into();
        self
    }
}

/// Billing or shipping party block.
#[derive(Debug, Clone)]
pub struct Addressee {
    name: String,
    address: String,
    city: String,
    state: String,
    pincode: String,
    state_code: String,
}

impl Addressee {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        pincode: impl Into<String>,
        state_code: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            city: city.into(),
            state: state.into(),
            pincode: pincode.into(),
            state_code: state_code.into(),
        }
    }
}

/// Builder for LineItem.
pub struct LineItemBuilder {
    description: String,
    unit_price: Decimal,
    quantity: u64,
    discount: Decimal,
    tax_rate: Decimal,
}

impl LineItemBuilder {
    /// New line with no discount and the common 18% GST slab.
    pub fn new(description: impl Into<String>, unit_price: Decimal, quantity: u64) -> Self {
        Self {
            description: description.into(),
            unit_price,
            quantity,
            discount: Decimal::ZERO,
            tax_rate: Decimal::new(18, 0),
        }
    }

    pub fn discount(mut self, discount: Decimal) -> Self {
        self.discount = discount;
        self
    }

    pub fn tax_rate(mut self, rate: Decimal) -> Self {
        self.tax_rate = rate;
        self
    }

    pub fn build(self) -> LineItem {
        LineItem {
            description: self.description,
            unit_price: self.unit_price,
            quantity: self.quantity,
            discount: self.discount,
            tax_rate: self.tax_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ValidationRule;
    use rust_decimal_macros::dec;

    fn addressee() -> Addressee {
        Addressee::new("Customer", "1 Main Rd", "Pune", "Maharashtra", "411001", "27")
    }

    fn builder() -> InvoiceRecordBuilder {
        InvoiceRecordBuilder::new("INV-1", "2024-03-01")
            .seller(SellerDetails::new("Seller", "2 Main Rd", "Pune", "Maharashtra", "411002"))
            .billing(addressee())
            .shipping(addressee())
            .order("ORD-1", "2024-02-28")
            .places("Maharashtra", "Maharashtra")
    }

    #[test]
    fn builds_flat_header() {
        let record = builder()
            .add_item(LineItemBuilder::new("Widget", dec!(10), 3).build())
            .build()
            .unwrap();
        assert_eq!(record.header.billing_state_code, "27");
        assert_eq!(record.header.reverse_charge, "No");
        assert_eq!(record.items[0].tax_rate, dec!(18));
    }

    #[test]
    fn build_requires_items() {
        let err = builder().build().unwrap_err();
        assert_eq!(err.as_validation().map(|e| e.rule), Some(ValidationRule::Items));
        assert!(builder().build_unchecked().is_ok());
    }

    #[test]
    fn build_checks_date_format() {
        let err = builder()
            .order("ORD-1", "28/02/2024")
            .add_item(LineItemBuilder::new("Widget", dec!(10), 3).build())
            .build()
            .unwrap_err();
        assert_eq!(
            err.as_validation().map(|e| e.field.as_str()),
            Some("order_date")
        );
    }

    #[test]
    fn missing_party_block() {
        let err = InvoiceRecordBuilder::new("INV-1", "2024-03-01")
            .build_unchecked()
            .unwrap_err();
        assert_eq!(
            err.as_validation().map(|e| e.field.as_str()),
            Some("seller_name")
        );
    }
}
