use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::error::InvoiceError;

/// Converts a non-negative amount into its word form.
pub trait AmountInWords: Send + Sync {
    fn to_words(&self, amount: Decimal) -> Result<String, InvoiceError>;
}

/// British English number words, e.g. 1234.5 →
/// "one thousand, two hundred and thirty-four point five".
///
/// Fractional digits are read one at a time after "point"; trailing zeros
/// are dropped first, so 460.20 reads as "four hundred and sixty point two".
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishWords;

const UNITS: [&str; 20] = [
    "zero",
    "one",
    "two",
    "three",
    "four",
    "five",
    "six",
    "seven",
    "eight",
    "nine",
    "ten",
    "eleven",
    "twelve",
    "thirteen",
    "fourteen",
    "fifteen",
    "sixteen",
    "seventeen",
    "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

// Covers every u128.
const SCALES: [&str; 13] = [
    "",
    "thousand",
    "million",
    "billion",
    "trillion",
    "quadrillion",
    "quintillion",
    "sextillion",
    "septillion",
    "octillion",
    "nonillion",
    "decillion",
    "undecillion",
];

impl AmountInWords for EnglishWords {
    fn to_words(&self, amount: Decimal) -> Result<String, InvoiceError> {
        if amount < Decimal::ZERO {
            return Err(InvoiceError::Conversion(format!(
                "cannot express negative amount {amount} in words"
            )));
        }

        let amount = amount.abs().normalize();
        let integer = amount.trunc().to_u128().ok_or_else(|| {
            InvoiceError::Conversion(format!("amount {amount} is not representable in words"))
        })?;

        let mut words = integer_words(integer);
        let text = amount.to_string();
        if let Some((_, fraction)) = text.split_once('.') {
            words.push_str(" point");
            for digit in fraction.chars().filter_map(|c| c.to_digit(10)) {
                words.push(' ');
                words.push_str(UNITS[digit as usize]);
            }
        }
        Ok(words)
    }
}

fn integer_words(n: u128) -> String {
    if n == 0 {
        return UNITS[0].to_string();
    }

    let mut groups = Vec::new();
    let mut rest = n;
    let mut scale = 0;
    while rest > 0 {
        let value = (rest % 1000) as u16;
        if value > 0 {
            groups.push((value, scale));
        }
        rest /= 1000;
        scale += 1;
    }

    let mut out = String::new();
    for (i, (value, scale)) in groups.iter().rev().enumerate() {
        if i > 0 {
            // "one thousand and five", but "one thousand, two hundred"
            if *scale == 0 && *value < 100 {
                out.push_str(" and ");
            } else {
                out.push_str(", ");
            }
        }
        out.push_str(&hundreds_words(*value));
        if *scale > 0 {
            out.push(' ');
            out.push_str(SCALES[*scale]);
        }
    }
    out
}

fn hundreds_words(n: u16) -> String {
    let hundreds = n / 100;
    let rest = n % 100;
    match (hundreds, rest) {
        (0, r) => tens_words(r),
        (h, 0) => format!("{} hundred", UNITS[h as usize]),
        (h, r) => format!("{} hundred and {}", UNITS[h as usize], tens_words(r)),
    }
}

fn tens_words(n: u16) -> String {
    if n < 20 {
        return UNITS[n as usize].to_string();
    }
    let (tens, units) = (n / 10, n % 10);
    if units == 0 {
        TENS[tens as usize].to_string()
    } else {
        format!("{}-{}", TENS[tens as usize], UNITS[units as usize])
    }
}

/// Uppercase the first character, leaving the rest untouched.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
