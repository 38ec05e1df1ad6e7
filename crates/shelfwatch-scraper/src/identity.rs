//! Content-derived product identifiers.
//!
//! MD5 is used as a stable fingerprint, not for security. The identifiers
//! are join keys against history files written by earlier runs, so the
//! hash, the normalization and the prefix lengths must not change.

const CONTENT_ID_LEN: usize = 12;
const DESCRIPTIVE_HASH_LEN: usize = 8;
const BRAND_PREFIX_LEN: usize = 4;

/// Lowercase, trim, and collapse internal whitespace runs to one space.
///
/// This is the single definition of "same product name" used by both the
/// identifier and the walk's uniqueness set.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// First 12 hex characters of the MD5 of the normalized name.
#[must_use]
pub fn identify(name: &str) -> String {
    let mut hex = md5_hex(&normalize_name(name));
    hex.truncate(CONTENT_ID_LEN);
    hex
}

/// `BRAN_hhhhhhhh`: the first four characters of the brand, upper-cased,
/// and 8 hex characters of the MD5 of `brand:name`. Without a brand only
/// the 8 hex characters of the name's hash are returned.
#[must_use]
pub fn identify_descriptive(name: &str, brand: &str) -> String {
    let name = normalize_name(name);
    let brand = brand.trim().to_lowercase();

    let key = if brand.is_empty() {
        name
    } else {
        format!("{brand}:{name}")
    };
    let mut hex = md5_hex(&key);
    hex.truncate(DESCRIPTIVE_HASH_LEN);

    if brand.is_empty() {
        return hex;
    }
    let prefix: String = brand.chars().take(BRAND_PREFIX_LEN).collect();
    format!("{}_{hex}", prefix.to_uppercase())
}

fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}
