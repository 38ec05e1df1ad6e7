use std::path::PathBuf;

/// Where the cross-run history file lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryBackend {
    /// Google Drive folder, addressed by the category's `drive_folder_id`.
    Drive,
    /// A plain directory on the local filesystem.
    Local,
    /// History sync disabled; runs only write the local snapshot.
    None,
}

impl std::fmt::Display for HistoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryBackend::Drive => write!(f, "drive"),
            HistoryBackend::Local => write!(f, "local"),
            HistoryBackend::None => write!(f, "none"),
        }
    }
}

/// How to merge a history file whose header differs from the current batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaDrift {
    /// Keep only the columns present on both sides.
    #[default]
    Intersection,
    /// Keep every column from either side; missing cells are left empty.
    Union,
}

impl std::fmt::Display for SchemaDrift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaDrift::Intersection => write!(f, "intersection"),
            SchemaDrift::Union => write!(f, "union"),
        }
    }
}

impl std::str::FromStr for SchemaDrift {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "intersection" => Ok(SchemaDrift::Intersection),
            "union" => Ok(SchemaDrift::Union),
            other => Err(format!(
                "unknown schema drift policy '{other}' (expected intersection or union)"
            )),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub categories_path: PathBuf,
    pub webdriver_url: String,
    pub headless: bool,
    pub page_load_timeout_secs: u64,
    pub settle_delay_ms: u64,
    pub inter_request_delay_ms: u64,
    pub output_dir: PathBuf,
    pub history_backend: HistoryBackend,
    pub history_dir: PathBuf,
    pub drive_api_base: String,
    pub drive_access_token: Option<String>,
    pub drive_max_retries: u32,
    pub drive_backoff_base_ms: u64,
    pub schema_drift: SchemaDrift,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("categories_path", &self.categories_path)
            .field("webdriver_url", &self.webdriver_url)
            .field("headless", &self.headless)
            .field("page_load_timeout_secs", &self.page_load_timeout_secs)
            .field("settle_delay_ms", &self.settle_delay_ms)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("output_dir", &self.output_dir)
            .field("history_backend", &self.history_backend)
            .field("history_dir", &self.history_dir)
            .field("drive_api_base", &self.drive_api_base)
            .field(
                "drive_access_token",
                &self.drive_access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("drive_max_retries", &self.drive_max_retries)
            .field("drive_backoff_base_ms", &self.drive_backoff_base_ms)
            .field("schema_drift", &self.schema_drift)
            .finish()
    }
}
