use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::InvoiceError;
use super::types::*;
use super::words::{AmountInWords, capitalize_first};

/// Decide the tax split by literal comparison of the place of supply and the
/// place of delivery. No case folding or trimming is applied.
pub fn tax_split(header: &InvoiceHeader) -> TaxSplit {
    if header.place_of_supply == header.place_of_delivery {
        TaxSplit::IntraState
    } else {
        TaxSplit::InterState
    }
}

fn overflow(what: &str) -> InvoiceError {
    InvoiceError::Conversion(format!("{what} is not representable"))
}

/// Derive net, tax and total amounts for one line.
///
/// No rounding is applied; amounts are exact decimals.
pub fn compute_line(item: &LineItem, split: TaxSplit) -> Result<ComputedLineItem, InvoiceError> {
    let net_amount = item
        .unit_price
        .checked_mul(Decimal::from(item.quantity))
        .and_then(|gross| gross.checked_sub(item.discount))
        .ok_or_else(|| overflow("net amount"))?;

    let (cgst_amount, sgst_amount, igst_amount) = match split {
        TaxSplit::IntraState => {
            let half = net_amount
                .checked_mul(item.tax_rate / dec!(2))
                .ok_or_else(|| overflow("tax amount"))?
                / dec!(100);
            (half, half, Decimal::ZERO)
        }
        TaxSplit::InterState => {
            let igst = net_amount
                .checked_mul(item.tax_rate)
                .ok_or_else(|| overflow("tax amount"))?
                / dec!(100);
            (Decimal::ZERO, Decimal::ZERO, igst)
        }
    };

    let total_amount = [cgst_amount, sgst_amount, igst_amount]
        .into_iter()
        .try_fold(net_amount, Decimal::checked_add)
        .ok_or_else(|| overflow("line total"))?;

    Ok(ComputedLineItem {
        item: item.clone(),
        net_amount,
        cgst_amount,
        sgst_amount,
        igst_amount,
        total_amount,
    })
}

/// Sum item totals in item order.
pub fn compute_total(items: &[ComputedLineItem]) -> Result<Decimal, InvoiceError> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line.total_amount))
        .ok_or_else(|| overflow("invoice total"))
}

/// Calculate every derived amount of a validated record.
///
/// Returns a new [`InvoiceDocument`]; the record itself is left untouched.
/// Fails with [`InvoiceError::Conversion`] when the total cannot be put into
/// words (negative total) or the arithmetic overflows.
pub fn compute(
    record: &InvoiceRecord,
    words: &dyn AmountInWords,
) -> Result<InvoiceDocument, InvoiceError> {
    let split = tax_split(&record.header);
    let items = record
        .items
        .iter()
        .map(|item| compute_line(item, split))
        .collect::<Result<Vec<_>, _>>()?;

    let total_amount = compute_total(&items)?;
    let amount_in_words = capitalize_first(&words.to_words(total_amount)?);

    Ok(InvoiceDocument {
        header: record.header.clone(),
        items,
        tax_split: split,
        total_amount,
        amount_in_words,
    })
}
