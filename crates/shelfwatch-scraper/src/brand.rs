//! Table-driven brand attribution from a product title.

use shelfwatch_core::sentinel::{OTHER_BRAND, UNKNOWN_BRAND};
use shelfwatch_core::{BrandRules, MatchMode};

/// Maps product names to display brands using one category's [`BrandRules`].
///
/// Matching order is the table order: special cases first, then the
/// vocabulary. The first hit wins, so a term that is a substring of another
/// must be listed after the longer one if the longer one should win.
#[derive(Debug, Clone)]
pub struct BrandMatcher {
    rules: BrandRules,
}

impl BrandMatcher {
    #[must_use]
    pub fn from_rules(rules: &BrandRules) -> Self {
        Self {
            rules: rules.clone(),
        }
    }

    #[must_use]
    pub fn brand_for(&self, name: &str) -> String {
        let lower = name.trim().to_lowercase();
        if lower.is_empty() {
            return UNKNOWN_BRAND.to_owned();
        }

        if let Some(case) = self
            .rules
            .special_cases
            .iter()
            .find(|c| lower.contains(c.pattern.as_str()))
        {
            return case.canonical.clone();
        }

        let padded = format!(" {lower} ");
        let hit = self.rules.vocabulary.iter().find(|term| {
            if term.is_empty() {
                return false;
            }
            match self.rules.match_mode {
                MatchMode::WholeWord => padded.contains(&format!(" {term} ")),
                MatchMode::Substring => lower.contains(term.as_str()),
            }
        });

        match hit {
            Some(term) if self.rules.acronyms.contains(term) => term.to_uppercase(),
            Some(term) => title_case(term),
            None => OTHER_BRAND.to_owned(),
        }
    }
}

/// Upper-cases every letter that follows a non-letter and lower-cases the rest.
fn title_case(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    let mut prev_alpha = false;
    for c in term.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfwatch_core::SpecialCase;

    fn ebook_rules() -> BrandRules {
        BrandRules {
            match_mode: MatchMode::WholeWord,
            special_cases: vec![
                SpecialCase {
                    pattern: "kindle".to_owned(),
                    canonical: "Amazon".to_owned(),
                },
                SpecialCase {
                    pattern: "barnes noble".to_owned(),
                    canonical: "Barnes & Noble".to_owned(),
                },
            ],
            vocabulary: vec![
                "kobo".to_owned(),
                "bq".to_owned(),
                "energy sistem".to_owned(),
                "cube".to_owned(),
            ],
            acronyms: vec!["bq".to_owned()],
        }
    }

    #[test]
    fn special_case_wins_over_vocabulary() {
        let matcher = BrandMatcher::from_rules(&ebook_rules());
        assert_eq!(matcher.brand_for("Amazon Kindle Paperwhite 16GB"), "Amazon");
        assert_eq!(matcher.brand_for("eReader Barnes Noble Glow"), "Barnes & Noble");
    }

    #[test]
    fn vocabulary_is_title_cased_unless_acronym() {
        let matcher = BrandMatcher::from_rules(&ebook_rules());
        assert_eq!(matcher.brand_for("Kobo Libra 2"), "Kobo");
        assert_eq!(matcher.brand_for("BQ Cervantes 4"), "BQ");
        assert_eq!(matcher.brand_for("eBook Energy Sistem Slim HD"), "Energy Sistem");
    }

    #[test]
    fn whole_word_mode_ignores_embedded_terms() {
        let matcher = BrandMatcher::from_rules(&ebook_rules());
        assert_eq!(matcher.brand_for("Funda Rubik Cubesat"), OTHER_BRAND);
        assert_eq!(matcher.brand_for("Tableta Cube iPlay"), "Cube");
    }

    #[test]
    fn substring_mode_matches_inside_words() {
        let rules = BrandRules {
            match_mode: MatchMode::Substring,
            vocabulary: vec!["lg".to_owned(), "samsung".to_owned()],
            acronyms: vec!["lg".to_owned()],
            ..BrandRules::default()
        };
        let matcher = BrandMatcher::from_rules(&rules);
        assert_eq!(matcher.brand_for("Monitor LG UltraGear 27GN800"), "LG");
        assert_eq!(matcher.brand_for("Monitor SAMSUNGOdyssey"), "Samsung");
    }

    #[test]
    fn empty_and_unmatched_names_get_sentinels() {
        let matcher = BrandMatcher::from_rules(&ebook_rules());
        assert_eq!(matcher.brand_for("   "), UNKNOWN_BRAND);
        assert_eq!(matcher.brand_for("Lector genérico 6 pulgadas"), OTHER_BRAND);
    }

    #[test]
    fn title_case_matches_word_starts() {
        assert_eq!(title_case("onyx boox"), "Onyx Boox");
        assert_eq!(title_case("bang & olufsen"), "Bang & Olufsen");
        assert_eq!(title_case("inno3d"), "Inno3D");
    }
}
