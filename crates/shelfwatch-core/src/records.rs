use serde::{Deserialize, Serialize};

/// Fields lifted from one product tile before identity, sequencing, and
/// price parsing. Prices are still the display strings found in the DOM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProduct {
    /// Title text, trimmed. Never empty.
    pub name: String,
    pub brand: String,
    /// Discounted or final price as displayed, e.g. `"19,99 €"`.
    pub price_current_text: String,
    /// Strikethrough price as displayed; equals `price_current_text` when
    /// the tile shows no discount.
    pub price_original_text: String,
    /// Absolute product URL, or the link sentinel.
    pub link: String,
}

/// One harvested product observation.
///
/// Built by the catalog walker from a [`RawProduct`] and completed by the
/// price normalizer; not mutated after that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Wall-clock time of the run, shared by every record of the batch
    /// (`"%Y-%m-%d %H:%M:%S"`).
    pub extracted_at: String,
    /// Content-derived identifier; the join key across runs.
    pub id: String,
    /// 1-based harvest order across the whole walk. Display only.
    pub sequence: u32,
    pub name: String,
    pub brand: String,
    pub price_current: Option<f64>,
    pub link: String,
    /// Treated as equal to `price_current` when the tile shows no discount.
    pub price_original: Option<f64>,
    /// Present only when both prices parsed and original > current.
    pub discount_percent: Option<f64>,
    /// `price_original - price_current`, under the same condition.
    pub discount_amount: Option<f64>,
    pub price_current_text: String,
    pub price_original_text: String,
}

impl ProductRecord {
    /// Builds an un-normalized record; numeric price fields stay empty until
    /// the price normalizer runs.
    #[must_use]
    pub fn from_raw(raw: RawProduct, id: String, sequence: u32, extracted_at: &str) -> Self {
        Self {
            extracted_at: extracted_at.to_owned(),
            id,
            sequence,
            name: raw.name,
            brand: raw.brand,
            price_current: None,
            link: raw.link,
            price_original: None,
            discount_percent: None,
            discount_amount: None,
            price_current_text: raw.price_current_text,
            price_original_text: raw.price_original_text,
        }
    }

    #[must_use]
    pub fn has_link(&self) -> bool {
        self.link != crate::sentinel::LINK_NOT_AVAILABLE
    }
}

/// The unique records collected by one walk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarvestBatch {
    pub extracted_at: String,
    pub records: Vec<ProductRecord>,
}

impl HarvestBatch {
    #[must_use]
    pub fn new(extracted_at: impl Into<String>) -> Self {
        Self {
            extracted_at: extracted_at.into(),
            records: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
