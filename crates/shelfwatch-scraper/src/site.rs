//! Static description of the storefront being walked: origin, link
//! heuristics, currency marker, and the CSS selectors for each field role.
//!
//! The storefront renders class names generated by its CSS-in-JS build
//! (`sc-94eb08bc-0` and friends). They change between deploys, which is why
//! every role carries an ordered list and the extractor falls back to text
//! heuristics when none match.

/// CSS selectors for the product listing, grouped by role.
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    /// One node per product tile; its text is the product name.
    pub product_title: String,
    /// Discounted/final price, most specific first.
    pub current_price: Vec<String>,
    /// Strikethrough (pre-discount) price.
    pub original_price: Vec<String>,
    /// The storefront's own product-link role.
    pub canonical_link: String,
    /// Looser link selectors tried in order when the canonical one misses.
    pub fallback_links: Vec<String>,
    /// Counter showing the listing size, e.g. `"(123 artículos)"`.
    pub listing_total: String,
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Scheme and host, no trailing slash; prefixed to relative hrefs.
    pub origin: String,
    /// Substring an absolute URL must contain to count as same-site.
    pub same_site_marker: String,
    /// Path fragments that identify a product detail page.
    pub product_path_markers: Vec<String>,
    pub currency_symbol: char,
    /// Maximum number of parent hops when resolving a product link.
    pub link_ascent_depth: usize,
    /// Maximum number of parent hops from a title to its priced container.
    pub container_ascent_depth: usize,
    /// Selector of the cookie-consent accept button, clicked once per session.
    pub consent_button: Option<String>,
    pub selectors: ListingSelectors,
}

impl SiteConfig {
    #[must_use]
    pub fn mediamarkt_es() -> Self {
        Self {
            origin: "https://www.mediamarkt.es".to_owned(),
            same_site_marker: "mediamarkt".to_owned(),
            product_path_markers: vec!["/p/".to_owned(), "/product/".to_owned()],
            currency_symbol: '€',
            link_ascent_depth: 3,
            container_ascent_depth: 5,
            consent_button: Some("#pwa-consent-layer-accept-all-button".to_owned()),
            selectors: ListingSelectors {
                product_title: r#"p[data-test="product-title"]"#.to_owned(),
                current_price: vec![
                    "span.sc-94eb08bc-0.dYbTef.sc-a69e154d-2.dJKnju".to_owned(),
                    "span.sc-94eb08bc-0.dYbTef.sc-8a3a8cd8-2.csCDkt".to_owned(),
                    "span.sc-94eb08bc-0.OhHlB.sc-8a3a8cd8-2.csCDkt".to_owned(),
                    r#"span[data-test="product-price"]"#.to_owned(),
                ],
                original_price: vec!["span.sc-94eb08bc-0.iJxYPS".to_owned()],
                canonical_link: r#"a[data-test="mms-router-link-product-list-item-link_mp"]"#
                    .to_owned(),
                fallback_links: vec![
                    r#"a[href*="/p/"]"#.to_owned(),
                    r#"a[href*="/product/"]"#.to_owned(),
                    r#"a[data-test*="product-list-item-link"]"#.to_owned(),
                    r#"a[data-test*="product-link"]"#.to_owned(),
                    r#"a[class*="product-link"]"#.to_owned(),
                    "a".to_owned(),
                ],
                listing_total: "span.sc-94eb08bc-0.AKpzk".to_owned(),
            },
        }
    }

    /// Turns a possibly relative href into an absolute URL on this site.
    #[must_use]
    pub fn absolutize(&self, href: &str) -> String {
        let href = href.trim();
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_owned()
        } else if let Some(rest) = href.strip_prefix("//") {
            format!("https://{rest}")
        } else if href.starts_with('/') {
            format!("{}{href}", self.origin)
        } else {
            format!("{}/{href}", self.origin)
        }
    }

    #[must_use]
    pub fn is_same_site(&self, absolute_url: &str) -> bool {
        absolute_url.contains(&self.same_site_marker)
    }

    #[must_use]
    pub fn is_product_path(&self, url: &str) -> bool {
        self.product_path_markers.iter().any(|m| url.contains(m))
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self::mediamarkt_es()
    }
}
