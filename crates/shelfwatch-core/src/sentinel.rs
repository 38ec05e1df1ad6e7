//! Placeholder values written instead of failing when a field cannot be
//! extracted. The Spanish wording matches the history files already in the
//! store, so rows stay comparable across runs.

/// Brand when the product name itself is missing.
pub const UNKNOWN_BRAND: &str = "Desconocido";

/// Brand when no vocabulary entry matches the name.
pub const OTHER_BRAND: &str = "Otra marca";

/// Link when no product URL could be resolved.
pub const LINK_NOT_AVAILABLE: &str = "No disponible";

/// Price display text when no currency-marked text was found.
pub const PRICE_NOT_AVAILABLE: &str = "Precio no disponible";
