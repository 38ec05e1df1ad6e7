//! Page Harvester: turns one rendered listing page into raw products.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};
use shelfwatch_core::{BrandRules, RawProduct};
use tracing::debug;

use crate::dom::{compile, contains_currency, enclosing_anchor, first_text, parent_element, DomSnapshot};
use crate::error::ScraperError;
use crate::extract::FieldExtractor;
use crate::site::SiteConfig;

static LISTING_TOTAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d+)").expect("valid regex"));

#[derive(Debug, Clone)]
pub struct PageHarvester {
    extractor: FieldExtractor,
    listing_total: Selector,
}

impl PageHarvester {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] if any configured selector
    /// does not parse.
    pub fn new(site: &SiteConfig, brands: &BrandRules) -> Result<Self, ScraperError> {
        Ok(Self {
            extractor: FieldExtractor::new(site, brands)?,
            listing_total: compile(&site.selectors.listing_total)?,
        })
    }

    #[must_use]
    pub fn extractor(&self) -> &FieldExtractor {
        &self.extractor
    }

    /// Extracts every product on the page, in the DOM order of the title
    /// nodes. Tiles without a usable title are left out.
    #[must_use]
    pub fn harvest(&self, page: &DomSnapshot) -> Vec<RawProduct> {
        let titles = page.select_all(self.extractor.title_selector());
        let mut products = Vec::with_capacity(titles.len());

        for (position, title) in titles.into_iter().enumerate() {
            let container = self.price_container(title);
            let link_start = enclosing_anchor(title).unwrap_or(container);

            match self.extractor.extract_with_title(title, container, link_start) {
                Some(product) => products.push(product),
                None => debug!(position, "title node yielded no product"),
            }
        }

        products
    }

    /// Reads the listing's article counter, e.g. `"(123 artículos)"`.
    #[must_use]
    pub fn listing_total(&self, page: &DomSnapshot) -> Option<u32> {
        let text = first_text(page.root(), &self.listing_total)?;
        LISTING_TOTAL_RE
            .captures(&text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Nearest ancestor of `title` (at most `container_ascent_depth` levels
    /// up) whose subtree shows a price, or the title itself.
    fn price_container<'a>(&self, title: ElementRef<'a>) -> ElementRef<'a> {
        let symbol = self.extractor.site().currency_symbol;
        let mut current = title;
        for _ in 0..=self.extractor.site().container_ascent_depth {
            if contains_currency(current, symbol) {
                return current;
            }
            match parent_element(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        title
    }
}
