//! The `run` command: walk one category, write the local snapshot, and
//! merge it into the category's history file.
//!
//! A run only fails outright when no browser session could be opened or
//! the walk harvested nothing. History problems downgrade the run to
//! `partial`; the local snapshot is already on disk by then.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use shelfwatch_core::{AppConfig, CategoryConfig, HistoryBackend};
use shelfwatch_history::{sync_history, DriveStore, HistoryStore, LocalDirStore, Table};
use shelfwatch_scraper::{
    normalize_batch, BrowserOptions, BrowserSession, CatalogWalker, PageRenderer, SiteConfig,
    WalkConfig, WalkReport,
};

use crate::report::Summary;

#[derive(Debug, Clone)]
pub(crate) struct RunOptions {
    pub category: String,
    pub smoke: bool,
    pub no_history: bool,
    pub max_pages: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunStatus {
    Complete,
    /// Products were written locally but the history was not updated.
    Partial,
    Failed,
}

impl RunStatus {
    pub(crate) fn exit_code(self) -> ExitCode {
        match self {
            RunStatus::Complete | RunStatus::Partial => ExitCode::SUCCESS,
            RunStatus::Failed => ExitCode::FAILURE,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Complete => write!(f, "complete"),
            RunStatus::Partial => write!(f, "partial"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Where the history update of a run goes.
pub(crate) enum HistoryTarget {
    /// Disabled by flag or configuration.
    Skip,
    /// Wanted but not possible with the current configuration.
    Unavailable(String),
    Store(Box<dyn HistoryStore>),
}

/// Run the full pipeline for one category.
///
/// # Errors
///
/// Returns an error if the categories file cannot be loaded, the slug is
/// unknown, the listing configuration is invalid, or the local snapshot
/// cannot be written. Browser and history failures are reported through
/// the returned [`RunStatus`] instead.
pub(crate) async fn run_category(
    config: &AppConfig,
    options: &RunOptions,
) -> anyhow::Result<RunStatus> {
    let catalogue = shelfwatch_core::load_categories(&config.categories_path)?;
    let Some(category) = catalogue.find(&options.category) else {
        let known: Vec<&str> = catalogue.categories.iter().map(|c| c.slug.as_str()).collect();
        anyhow::bail!(
            "category '{}' not found; configured categories: [{}]",
            options.category,
            known.join(", ")
        );
    };

    let site = SiteConfig::mediamarkt_es();
    let walker = CatalogWalker::new(
        &category.listing_url,
        &site,
        &category.brands,
        category.id_scheme,
        walk_config(config, options),
    )?;

    let browser = BrowserOptions {
        webdriver_url: config.webdriver_url.clone(),
        headless: config.headless,
        consent_button: site.consent_button.clone(),
        ..BrowserOptions::default()
    };
    let mut session = match BrowserSession::connect(&browser).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(
                webdriver_url = %config.webdriver_url,
                error = %e,
                "could not start browser session"
            );
            return Ok(RunStatus::Failed);
        }
    };

    let history = history_target(config, category, options.no_history);
    run_with(&mut session, &walker, category, config, history).await
}

/// Walk with an already opened `renderer`, then write the snapshot and
/// update `history`. The renderer is closed once the walk ends.
///
/// # Errors
///
/// Returns an error if the local snapshot cannot be written.
pub(crate) async fn run_with<R>(
    renderer: &mut R,
    walker: &CatalogWalker,
    category: &CategoryConfig,
    config: &AppConfig,
    history: HistoryTarget,
) -> anyhow::Result<RunStatus>
where
    R: PageRenderer + ?Sized,
{
    let started = Local::now().naive_local();
    let extracted_at = started.format("%Y-%m-%d %H:%M:%S").to_string();
    tracing::info!(
        category = %category.slug,
        url = %category.listing_url,
        criteria = walker.config().sort_criteria.len(),
        max_pages = walker.config().max_pages,
        "starting walk"
    );

    let outcome = walker.walk(&mut *renderer, &extracted_at).await;
    if let Err(e) = renderer.close().await {
        tracing::warn!(error = %e, "browser session did not close cleanly");
    }

    let mut batch = outcome.batch;
    log_walk_report(&outcome.report);
    if batch.is_empty() {
        tracing::error!(category = %category.slug, "no products harvested");
        return Ok(RunStatus::Failed);
    }

    normalize_batch(&mut batch);
    Summary::from_records(&batch.records).log();

    let table = Table::from_batch(&batch);
    let snapshot = snapshot_path(&config.output_dir, &category.slug, started);
    write_snapshot(&snapshot, &table).await?;
    tracing::info!(path = %snapshot.display(), products = table.len(), "snapshot written");

    let store = match history {
        HistoryTarget::Skip => {
            tracing::info!("history update skipped");
            return Ok(RunStatus::Complete);
        }
        HistoryTarget::Unavailable(reason) => {
            tracing::warn!(category = %category.slug, reason = %reason, "history unavailable");
            return Ok(RunStatus::Partial);
        }
        HistoryTarget::Store(store) => store,
    };

    match sync_history(
        store.as_ref(),
        &category.history_file,
        &table,
        config.schema_drift,
    )
    .await
    {
        Ok(report) => {
            tracing::info!(
                file = %report.file_name,
                file_id = %report.file_id,
                created = report.created,
                existing_rows = report.stats.existing_rows,
                new_rows = report.stats.new_rows,
                duplicates_removed = report.stats.duplicates_removed,
                final_rows = report.stats.final_rows,
                "history updated"
            );
            if !report.stats.dropped_columns.is_empty() {
                tracing::warn!(
                    columns = ?report.stats.dropped_columns,
                    "columns not shared by history and batch were dropped"
                );
            }
            Ok(RunStatus::Complete)
        }
        Err(e) => {
            tracing::error!(
                file = %category.history_file,
                store = %store.describe(),
                error = %e,
                "history update failed; local snapshot kept"
            );
            Ok(RunStatus::Partial)
        }
    }
}

pub(crate) fn walk_config(config: &AppConfig, options: &RunOptions) -> WalkConfig {
    let mut walk = WalkConfig {
        page_load_timeout: Duration::from_secs(config.page_load_timeout_secs),
        settle_delay: Duration::from_millis(config.settle_delay_ms),
        inter_request_delay: Duration::from_millis(config.inter_request_delay_ms),
        ..WalkConfig::default()
    };
    if let Some(max_pages) = options.max_pages {
        walk.max_pages = max_pages.max(1);
    }
    if options.smoke {
        walk = walk.smoke();
    }
    walk
}

pub(crate) fn snapshot_path(output_dir: &Path, slug: &str, started: NaiveDateTime) -> PathBuf {
    output_dir.join(format!(
        "{slug}_mediamarkt_completo_{}.csv",
        started.format("%Y%m%d_%H%M%S")
    ))
}

/// Pick the history backend for `category` from the process configuration.
pub(crate) fn history_target(
    config: &AppConfig,
    category: &CategoryConfig,
    no_history: bool,
) -> HistoryTarget {
    if no_history {
        return HistoryTarget::Skip;
    }

    match config.history_backend {
        HistoryBackend::None => HistoryTarget::Skip,
        HistoryBackend::Local => {
            HistoryTarget::Store(Box::new(LocalDirStore::new(&config.history_dir)))
        }
        HistoryBackend::Drive => {
            let Some(token) = config.drive_access_token.as_deref() else {
                return HistoryTarget::Unavailable(
                    "GOOGLE_DRIVE_ACCESS_TOKEN is not set".to_owned(),
                );
            };
            let Some(folder) = category.drive_folder_id.as_deref() else {
                return HistoryTarget::Unavailable(format!(
                    "category '{}' has no drive_folder_id",
                    category.slug
                ));
            };
            match DriveStore::with_base_url(
                &config.drive_api_base,
                token,
                folder,
                config.drive_max_retries,
                config.drive_backoff_base_ms,
            ) {
                Ok(store) => HistoryTarget::Store(Box::new(store)),
                Err(e) => HistoryTarget::Unavailable(e.to_string()),
            }
        }
    }
}

async fn write_snapshot(path: &Path, table: &Table) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| anyhow::anyhow!("failed to create {}: {e}", dir.display()))?;
    }
    let bytes = table.to_csv_bytes()?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))?;
    Ok(())
}

fn log_walk_report(report: &WalkReport) {
    for criterion in &report.criteria {
        tracing::info!(
            criterion = %criterion.criterion,
            pages = criterion.pages_visited,
            products = criterion.products_seen,
            new_unique = criterion.new_unique,
            stop = %criterion.stop,
            "walk criterion"
        );
    }
    match (report.listed_total, report.coverage_percent()) {
        (Some(total), Some(coverage)) => tracing::info!(
            unique_total = report.unique_total,
            listed_total = total,
            coverage = %format!("{coverage:.1}%"),
            "walk coverage"
        ),
        _ => tracing::info!(
            unique_total = report.unique_total,
            "walk finished; listing total not shown"
        ),
    }
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
