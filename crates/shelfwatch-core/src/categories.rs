use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// How vocabulary terms are matched against a lower-cased product name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// The term must sit between spaces or at the start of the name.
    #[default]
    WholeWord,
    /// Plain substring containment.
    Substring,
}

/// Which identifier the walk stamps on each record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdScheme {
    /// 12 hex chars of the MD5 of the normalized name.
    #[default]
    Content,
    /// `BRAN_hhhhhhhh`: brand prefix plus 8 hex chars of `brand:name`.
    Descriptive,
}

/// A substring that maps straight to a canonical display brand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialCase {
    pub pattern: String,
    pub canonical: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandRules {
    #[serde(default)]
    pub match_mode: MatchMode,
    /// Checked first, in order, by substring.
    #[serde(default)]
    pub special_cases: Vec<SpecialCase>,
    /// Scanned in order after the special cases; first match wins.
    pub vocabulary: Vec<String>,
    /// Vocabulary terms rendered upper-case instead of title-case.
    #[serde(default)]
    pub acronyms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub slug: String,
    /// Listing URL without query string, e.g.
    /// `"https://www.mediamarkt.es/es/category/ebooks-249.html"`.
    pub listing_url: String,
    /// File name of the cross-run history table in the store.
    pub history_file: String,
    #[serde(default)]
    pub drive_folder_id: Option<String>,
    #[serde(default)]
    pub id_scheme: IdScheme,
    pub brands: BrandRules,
}

#[derive(Debug, Deserialize)]
pub struct CategoriesFile {
    pub categories: Vec<CategoryConfig>,
}

impl CategoriesFile {
    /// Look up a category by slug (case-insensitive).
    #[must_use]
    pub fn find(&self, slug: &str) -> Option<&CategoryConfig> {
        self.categories
            .iter()
            .find(|c| c.slug.eq_ignore_ascii_case(slug))
    }
}

/// Load and validate the category catalogue from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_categories(path: &Path) -> Result<CategoriesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CategoriesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_categories(&content)
}

/// Parse, normalize, and validate catalogue YAML.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_categories(content: &str) -> Result<CategoriesFile, ConfigError> {
    let mut file: CategoriesFile = serde_yaml::from_str(content)?;
    for category in &mut file.categories {
        normalize_rules(&mut category.brands);
    }
    validate_categories(&file)?;
    Ok(file)
}

/// Names are matched lower-cased, so the tables are lower-cased once here.
fn normalize_rules(rules: &mut BrandRules) {
    for term in &mut rules.vocabulary {
        *term = term.trim().to_lowercase();
    }
    for term in &mut rules.acronyms {
        *term = term.trim().to_lowercase();
    }
    for case in &mut rules.special_cases {
        case.pattern = case.pattern.trim().to_lowercase();
    }
}

fn validate_categories(file: &CategoriesFile) -> Result<(), ConfigError> {
    let mut seen_slugs = HashSet::new();

    for category in &file.categories {
        if category.slug.trim().is_empty() {
            return Err(ConfigError::Validation(
                "category slug must be non-empty".to_string(),
            ));
        }

        if !seen_slugs.insert(category.slug.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate category slug: '{}'",
                category.slug
            )));
        }

        if !(category.listing_url.starts_with("http://")
            || category.listing_url.starts_with("https://"))
        {
            return Err(ConfigError::Validation(format!(
                "category '{}' has listing_url '{}' without an http(s) scheme",
                category.slug, category.listing_url
            )));
        }

        if category.listing_url.contains('?') {
            return Err(ConfigError::Validation(format!(
                "category '{}' listing_url must not carry a query string",
                category.slug
            )));
        }

        if category.history_file.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "category '{}' has an empty history_file",
                category.slug
            )));
        }

        if category.brands.vocabulary.iter().all(String::is_empty) {
            return Err(ConfigError::Validation(format!(
                "category '{}' has an empty brand vocabulary",
                category.slug
            )));
        }

        if let Some(case) = category
            .brands
            .special_cases
            .iter()
            .find(|c| c.pattern.is_empty() || c.canonical.trim().is_empty())
        {
            return Err(ConfigError::Validation(format!(
                "category '{}' has an incomplete special case (pattern '{}', canonical '{}')",
                category.slug, case.pattern, case.canonical
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "categories_test.rs"]
mod tests;
