pub mod brand;
pub mod dom;
pub mod error;
pub mod extract;
pub mod harvest;
pub mod identity;
pub mod price;
pub mod render;
pub mod site;
pub mod walker;

pub use brand::BrandMatcher;
pub use dom::DomSnapshot;
pub use error::ScraperError;
pub use extract::{FieldExtractor, PricePair};
pub use harvest::PageHarvester;
pub use identity::{identify, identify_descriptive, normalize_name};
pub use price::{normalize_batch, normalize_record, parse_price};
pub use render::{BrowserOptions, BrowserSession, PageRenderer};
pub use site::{ListingSelectors, SiteConfig};
pub use walker::{CatalogWalker, CriterionReport, StopReason, WalkConfig, WalkOutcome, WalkReport};
