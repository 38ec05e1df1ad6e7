pub mod app_config;
pub mod categories;
pub mod config;
pub mod records;
pub mod sentinel;

pub use app_config::{AppConfig, HistoryBackend, SchemaDrift};
pub use categories::{
    load_categories, parse_categories, BrandRules, CategoriesFile, CategoryConfig, IdScheme, MatchMode, SpecialCase,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use records::{HarvestBatch, ProductRecord, RawProduct};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read categories file {path}: {source}")]
    CategoriesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse categories file: {0}")]
    CategoriesFileParse(#[from] serde_yaml::Error),

    #[error("categories validation failed: {0}")]
    Validation(String),
}
