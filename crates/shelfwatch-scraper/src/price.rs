//! Display-price parsing and discount derivation.
//!
//! Prices on the storefront use a decimal comma and an optional dot as the
//! thousands separator (`"1.234,50 €"`). Only digits and commas survive
//! cleaning, so the dot is dropped rather than misread as a decimal point.

use shelfwatch_core::{HarvestBatch, ProductRecord};

/// Parses a display price such as `"19,99 €"` into `19.99`.
///
/// Returns `None` for sentinel text, empty input, or anything that does not
/// reduce to a single decimal number.
#[must_use]
pub fn parse_price(display: &str) -> Option<f64> {
    let cleaned: String = display
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Fills the numeric price and discount fields of one record from its
/// display strings. The display strings are left untouched.
pub fn normalize_record(record: &mut ProductRecord) {
    record.price_current = parse_price(&record.price_current_text);
    record.price_original = parse_price(&record.price_original_text);

    record.discount_percent = None;
    record.discount_amount = None;
    if let (Some(current), Some(original)) = (record.price_current, record.price_original) {
        if original > 0.0 && original > current {
            let amount = original - current;
            record.discount_amount = Some(round2(amount));
            record.discount_percent = Some(round2(amount / original * 100.0));
        }
    }
}

pub fn normalize_batch(batch: &mut HarvestBatch) {
    for record in &mut batch.records {
        normalize_record(record);
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
