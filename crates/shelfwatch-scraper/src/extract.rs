//! Field Extractor: one product tile in, one [`RawProduct`] out.
//!
//! The storefront offers no stable schema, so every field is resolved by an
//! ordered list of strategies and degrades to a sentinel instead of failing.
//! Only a missing name drops the product.

use scraper::{ElementRef, Selector};
use shelfwatch_core::sentinel::{LINK_NOT_AVAILABLE, PRICE_NOT_AVAILABLE};
use shelfwatch_core::{BrandRules, RawProduct};
use tracing::debug;

use crate::brand::BrandMatcher;
use crate::dom::{
    compile, compile_all, currency_texts, first_text, href_of, is_anchor, parent_element, text_of,
};
use crate::error::ScraperError;
use crate::site::SiteConfig;

/// Display strings for the two price roles of a tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricePair {
    pub current: String,
    pub original: String,
}

impl PricePair {
    fn unavailable() -> Self {
        Self {
            current: PRICE_NOT_AVAILABLE.to_owned(),
            original: PRICE_NOT_AVAILABLE.to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldExtractor {
    site: SiteConfig,
    brands: BrandMatcher,
    title: Selector,
    current_price: Vec<Selector>,
    original_price: Vec<Selector>,
    canonical_link: Selector,
    fallback_links: Vec<Selector>,
}

impl FieldExtractor {
    /// Compiles the site's selectors once for the lifetime of a walk.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] if any configured selector
    /// does not parse.
    pub fn new(site: &SiteConfig, brands: &BrandRules) -> Result<Self, ScraperError> {
        let selectors = &site.selectors;
        Ok(Self {
            site: site.clone(),
            brands: BrandMatcher::from_rules(brands),
            title: compile(&selectors.product_title)?,
            current_price: compile_all(&selectors.current_price)?,
            original_price: compile_all(&selectors.original_price)?,
            canonical_link: compile(&selectors.canonical_link)?,
            fallback_links: compile_all(&selectors.fallback_links)?,
        })
    }

    #[must_use]
    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    #[must_use]
    pub fn title_selector(&self) -> &Selector {
        &self.title
    }

    /// Extracts a product from a tile that contains its title node.
    ///
    /// Returns `None` when the tile has no title text.
    #[must_use]
    pub fn extract(&self, node: ElementRef<'_>) -> Option<RawProduct> {
        let title = if self.title.matches(&node) {
            node
        } else {
            node.select(&self.title).next()?
        };
        self.extract_with_title(title, node, node)
    }

    /// Builds a product from separately resolved nodes: the title, the
    /// container that holds the prices, and the node to start link
    /// resolution from.
    #[must_use]
    pub fn extract_with_title(
        &self,
        title: ElementRef<'_>,
        price_container: ElementRef<'_>,
        link_start: ElementRef<'_>,
    ) -> Option<RawProduct> {
        let name = text_of(title);
        if name.is_empty() {
            debug!("skipping product tile with empty title");
            return None;
        }

        let brand = self.extract_brand(&name);
        let prices = self.extract_prices(price_container);
        let link = self.extract_link(link_start);

        Some(RawProduct {
            name,
            brand,
            price_current_text: prices.current,
            price_original_text: prices.original,
            link,
        })
    }

    #[must_use]
    pub fn extract_brand(&self, name: &str) -> String {
        self.brands.brand_for(name)
    }

    /// Resolves the current and original display prices of a container.
    ///
    /// Structural selectors are tried first. Whichever side they miss is
    /// filled from currency-marked text in document order: the first token
    /// is the current price and the first one differing from it the original.
    /// A missing original means no discount and copies the current price.
    #[must_use]
    pub fn extract_prices(&self, container: ElementRef<'_>) -> PricePair {
        let structural_current = first_priced(container, &self.current_price);
        let structural_original = first_priced(container, &self.original_price);

        let tokens = currency_texts(container, self.site.currency_symbol);
        let current = structural_current.or_else(|| {
            tokens
                .iter()
                .find(|t| Some(*t) != structural_original.as_ref())
                .cloned()
        });
        let original = structural_original.or_else(|| {
            current
                .as_ref()
                .and_then(|c| tokens.iter().find(|t| *t != c).cloned())
        });

        match current {
            Some(current) => {
                let original = original.unwrap_or_else(|| current.clone());
                PricePair { current, original }
            }
            None => {
                debug!("no price found in product container");
                PricePair::unavailable()
            }
        }
    }

    /// Resolves the product URL starting at `node`.
    ///
    /// At each level the canonical link selector is tried, then the looser
    /// ones, keeping only same-site product URLs. Without a hit the search
    /// moves one parent up, at most `link_ascent_depth` times. As a last
    /// resort the href of a visited anchor is accepted as is.
    #[must_use]
    pub fn extract_link(&self, node: ElementRef<'_>) -> String {
        let mut current = Some(node);
        let mut anchor_href: Option<String> = None;

        for _ in 0..=self.site.link_ascent_depth {
            let Some(element) = current else {
                break;
            };
            if let Some(link) = self.link_within(element) {
                return link;
            }
            if anchor_href.is_none() && is_anchor(element) {
                anchor_href = href_of(element).map(|href| self.site.absolutize(href));
            }
            current = parent_element(element);
        }

        anchor_href.unwrap_or_else(|| {
            debug!("no product link resolved");
            LINK_NOT_AVAILABLE.to_owned()
        })
    }

    fn link_within(&self, element: ElementRef<'_>) -> Option<String> {
        let canonical = candidates(element, &self.canonical_link)
            .filter_map(href_of)
            .map(|href| self.site.absolutize(href))
            .find(|url| self.site.is_same_site(url));
        if canonical.is_some() {
            return canonical;
        }

        self.fallback_links.iter().find_map(|selector| {
            candidates(element, selector)
                .filter_map(href_of)
                .map(|href| self.site.absolutize(href))
                .find(|url| self.site.is_same_site(url) && self.site.is_product_path(url))
        })
    }
}

/// `element` itself when it matches, followed by its matching descendants.
fn candidates<'a>(
    element: ElementRef<'a>,
    selector: &'a Selector,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    std::iter::once(element)
        .filter(move |e| selector.matches(e))
        .chain(element.select(selector))
}

/// First selector whose first match has text containing a digit.
fn first_priced(container: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        first_text(container, selector).filter(|text| text.chars().any(|c| c.is_ascii_digit()))
    })
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
