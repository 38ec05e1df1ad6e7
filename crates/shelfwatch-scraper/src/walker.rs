//! Catalog Walker: paginates a listing under several sort orders and keeps
//! the first sighting of every product.
//!
//! Re-sorting surfaces different slices of a catalog that may be larger
//! than the page cap allows to reach in one ordering. Coverage is best
//! effort; the report says how each ordering ended.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use shelfwatch_core::{BrandRules, HarvestBatch, IdScheme, ProductRecord, RawProduct};
use tracing::{info, warn};

use crate::dom::DomSnapshot;
use crate::error::ScraperError;
use crate::harvest::PageHarvester;
use crate::identity::{identify, identify_descriptive, normalize_name};
use crate::render::PageRenderer;
use crate::site::SiteConfig;

/// Sort orders understood by the listing, in walk order.
pub const DEFAULT_SORT_CRITERIA: [&str; 5] = [
    "currentprice+desc",
    "currentprice+asc",
    "relevance",
    "name+asc",
    "name+desc",
];

#[derive(Debug, Clone)]
pub struct WalkConfig {
    pub sort_criteria: Vec<String>,
    /// Hard cap on page numbers per sort criterion.
    pub max_pages: u32,
    /// Products on a full listing page; fewer means last page.
    pub full_page_size: usize,
    /// How long to wait for the first product title after navigation.
    pub page_load_timeout: Duration,
    /// Pause after navigation before waiting for content.
    pub settle_delay: Duration,
    /// Politeness pause between consecutive pages, jittered by ±25 %.
    pub inter_request_delay: Duration,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            sort_criteria: DEFAULT_SORT_CRITERIA.map(str::to_owned).to_vec(),
            max_pages: 30,
            full_page_size: 12,
            page_load_timeout: Duration::from_secs(10),
            settle_delay: Duration::from_secs(2),
            inter_request_delay: Duration::from_secs(1),
        }
    }
}

impl WalkConfig {
    /// Restricts the walk to the first two sort criteria and two pages.
    #[must_use]
    pub fn smoke(mut self) -> Self {
        self.sort_criteria.truncate(2);
        self.max_pages = self.max_pages.min(2);
        self
    }
}

/// Why pagination ended for one sort criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No product title appeared within the page-load timeout.
    LoadTimeout,
    /// A page returned fewer products than a full page.
    ShortPage,
    /// Every page up to `max_pages` was full.
    PageCap,
    /// Navigation or reading the page source failed.
    RenderFailed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::LoadTimeout => "load timeout",
            Self::ShortPage => "short page",
            Self::PageCap => "page cap",
            Self::RenderFailed => "render failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriterionReport {
    pub criterion: String,
    pub pages_visited: u32,
    pub products_seen: usize,
    pub new_unique: usize,
    pub stop: StopReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WalkReport {
    pub criteria: Vec<CriterionReport>,
    /// Article count advertised by the listing, when it could be read.
    pub listed_total: Option<u32>,
    pub unique_total: usize,
}

impl WalkReport {
    /// Unique products as a percentage of the advertised listing size.
    #[must_use]
    pub fn coverage_percent(&self) -> Option<f64> {
        match self.listed_total {
            Some(total) if total > 0 => {
                #[allow(clippy::cast_precision_loss)]
                let unique = self.unique_total as f64;
                Some(unique / f64::from(total) * 100.0)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WalkOutcome {
    pub batch: HarvestBatch,
    pub report: WalkReport,
}

pub struct CatalogWalker {
    listing_url: String,
    harvester: PageHarvester,
    id_scheme: IdScheme,
    config: WalkConfig,
}

/// Running uniqueness set and accumulator for one walk.
struct WalkState {
    seen: HashSet<String>,
    batch: HarvestBatch,
    listed_total: Option<u32>,
}

impl WalkState {
    /// Adds `raw` unless its normalized name was already recorded.
    fn accept(&mut self, raw: RawProduct, id_scheme: IdScheme) -> bool {
        if !self.seen.insert(normalize_name(&raw.name)) {
            return false;
        }
        let id = match id_scheme {
            IdScheme::Content => identify(&raw.name),
            IdScheme::Descriptive => identify_descriptive(&raw.name, &raw.brand),
        };
        let sequence = u32::try_from(self.batch.len() + 1).unwrap_or(u32::MAX);
        let record = ProductRecord::from_raw(raw, id, sequence, &self.batch.extracted_at);
        self.batch.records.push(record);
        true
    }
}

enum PageLoad {
    Ready(String),
    TimedOut,
    Failed(ScraperError),
}

impl CatalogWalker {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidListingUrl`] if `listing_url` is not an
    /// http(s) URL without a query string, and
    /// [`ScraperError::InvalidSelector`] if a site selector does not parse.
    pub fn new(
        listing_url: &str,
        site: &SiteConfig,
        brands: &BrandRules,
        id_scheme: IdScheme,
        config: WalkConfig,
    ) -> Result<Self, ScraperError> {
        let listing_url = listing_url.trim();
        if !(listing_url.starts_with("http://") || listing_url.starts_with("https://")) {
            return Err(ScraperError::InvalidListingUrl {
                url: listing_url.to_owned(),
                reason: "expected an http(s) URL".to_owned(),
            });
        }
        if listing_url.contains('?') {
            return Err(ScraperError::InvalidListingUrl {
                url: listing_url.to_owned(),
                reason: "query string is added per page and must not be present".to_owned(),
            });
        }

        Ok(Self {
            listing_url: listing_url.to_owned(),
            harvester: PageHarvester::new(site, brands)?,
            id_scheme,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    #[must_use]
    pub fn page_url(&self, criterion: &str, page: u32) -> String {
        format!("{}?sort={criterion}&page={page}", self.listing_url)
    }

    /// Walks every sort criterion and returns the unique products found.
    ///
    /// Never fails: navigation problems end the current criterion and are
    /// recorded in the report. The renderer is left open for the caller.
    pub async fn walk<R>(&self, renderer: &mut R, extracted_at: &str) -> WalkOutcome
    where
        R: PageRenderer + ?Sized,
    {
        let mut state = WalkState {
            seen: HashSet::new(),
            batch: HarvestBatch::new(extracted_at),
            listed_total: None,
        };

        let mut criteria = Vec::with_capacity(self.config.sort_criteria.len());
        for criterion in &self.config.sort_criteria {
            let report = self.walk_criterion(renderer, criterion, &mut state).await;
            info!(
                criterion = %report.criterion,
                pages = report.pages_visited,
                new_unique = report.new_unique,
                unique_total = state.batch.len(),
                stop = %report.stop,
                "sort criterion finished"
            );
            criteria.push(report);
        }

        let report = WalkReport {
            criteria,
            listed_total: state.listed_total,
            unique_total: state.batch.len(),
        };
        WalkOutcome {
            batch: state.batch,
            report,
        }
    }

    async fn walk_criterion<R>(
        &self,
        renderer: &mut R,
        criterion: &str,
        state: &mut WalkState,
    ) -> CriterionReport
    where
        R: PageRenderer + ?Sized,
    {
        let mut report = CriterionReport {
            criterion: criterion.to_owned(),
            pages_visited: 0,
            products_seen: 0,
            new_unique: 0,
            stop: StopReason::PageCap,
        };

        for page in 1..=self.config.max_pages {
            if page > 1 {
                politeness_pause(self.config.inter_request_delay).await;
            }

            let url = self.page_url(criterion, page);
            let source = match self.load_page(renderer, &url).await {
                PageLoad::Ready(source) => source,
                PageLoad::TimedOut => {
                    warn!(criterion, page, url = %url, "no products appeared before timeout");
                    report.stop = StopReason::LoadTimeout;
                    return report;
                }
                PageLoad::Failed(err) => {
                    warn!(criterion, page, url = %url, error = %err, "page render failed");
                    report.stop = StopReason::RenderFailed;
                    return report;
                }
            };
            report.pages_visited += 1;

            let products = {
                let dom = DomSnapshot::parse(&source);
                if state.listed_total.is_none() {
                    state.listed_total = self.harvester.listing_total(&dom);
                    if let Some(total) = state.listed_total {
                        info!(listed_total = total, "listing size advertised");
                    }
                }
                self.harvester.harvest(&dom)
            };

            let count = products.len();
            report.products_seen += count;
            for raw in products {
                if state.accept(raw, self.id_scheme) {
                    report.new_unique += 1;
                }
            }

            info!(
                criterion,
                page,
                products = count,
                unique_total = state.batch.len(),
                "page harvested"
            );

            if count < self.config.full_page_size {
                report.stop = StopReason::ShortPage;
                return report;
            }
        }

        report
    }

    async fn load_page<R>(&self, renderer: &mut R, url: &str) -> PageLoad
    where
        R: PageRenderer + ?Sized,
    {
        if let Err(err) = renderer.open(url).await {
            return PageLoad::Failed(err);
        }
        if !self.config.settle_delay.is_zero() {
            tokio::time::sleep(self.config.settle_delay).await;
        }

        let title_selector = &self.harvester.extractor().site().selectors.product_title;
        match renderer
            .wait_until_present(title_selector, self.config.page_load_timeout)
            .await
        {
            Ok(true) => {}
            Ok(false) => return PageLoad::TimedOut,
            Err(err) => return PageLoad::Failed(err),
        }

        match renderer.page_source().await {
            Ok(source) => PageLoad::Ready(source),
            Err(err) => PageLoad::Failed(err),
        }
    }
}

async fn politeness_pause(base: Duration) {
    if base.is_zero() {
        return;
    }
    let jitter = rand::random::<f64>() * 0.5 + 0.75;
    tokio::time::sleep(base.mul_f64(jitter)).await;
}

#[cfg(test)]
#[path = "walker_test.rs"]
mod tests;
