//! Thin query layer over a parsed page source.
//!
//! Every primitive returns `Option`/`Vec`; callers decide what a miss means.

use scraper::{ElementRef, Html, Selector};

use crate::error::ScraperError;

/// A parsed, read-only snapshot of one rendered page.
pub struct DomSnapshot {
    html: Html,
}

impl DomSnapshot {
    #[must_use]
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    #[must_use]
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    #[must_use]
    pub fn select_all(&self, selector: &Selector) -> Vec<ElementRef<'_>> {
        self.html.select(selector).collect()
    }

    #[must_use]
    pub fn select_first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.select(selector).next()
    }
}

/// Compiles a CSS selector, keeping the offending text in the error.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidSelector`] if `selector` does not parse.
pub fn compile(selector: &str) -> Result<Selector, ScraperError> {
    Selector::parse(selector).map_err(|e| ScraperError::InvalidSelector {
        selector: selector.to_owned(),
        reason: e.to_string(),
    })
}

/// Compiles an ordered list of selectors.
///
/// # Errors
///
/// Returns the first [`ScraperError::InvalidSelector`] encountered.
pub fn compile_all(selectors: &[String]) -> Result<Vec<Selector>, ScraperError> {
    selectors.iter().map(|s| compile(s)).collect()
}

/// Full text of `node` with whitespace runs collapsed and ends trimmed.
#[must_use]
pub fn text_of(node: ElementRef<'_>) -> String {
    let joined: String = node.text().collect();
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of the first descendant matching `selector`, if non-empty.
#[must_use]
pub fn first_text(node: ElementRef<'_>, selector: &Selector) -> Option<String> {
    node.select(selector)
        .map(text_of)
        .find(|text| !text.is_empty())
}

#[must_use]
pub fn parent_element(node: ElementRef<'_>) -> Option<ElementRef<'_>> {
    node.parent().and_then(ElementRef::wrap)
}

/// `node` itself or its closest ancestor that is an `<a>` element.
#[must_use]
pub fn enclosing_anchor(node: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let mut current = Some(node);
    while let Some(element) = current {
        if is_anchor(element) {
            return Some(element);
        }
        current = parent_element(element);
    }
    None
}

#[must_use]
pub fn is_anchor(node: ElementRef<'_>) -> bool {
    node.value().name().eq_ignore_ascii_case("a")
}

#[must_use]
pub fn href_of(node: ElementRef<'_>) -> Option<&str> {
    node.value()
        .attr("href")
        .map(str::trim)
        .filter(|href| !href.is_empty())
}

/// True if any text node in the subtree carries `symbol` next to a digit.
#[must_use]
pub fn contains_currency(node: ElementRef<'_>, symbol: char) -> bool {
    node.text().any(|t| is_currency_token(t, symbol))
}

/// Currency-marked text fragments in document order, whitespace-collapsed.
///
/// A price split across sibling spans (`<span>19</span><span>,99 €</span>`)
/// is reported as the text of the smallest element holding both the digits
/// and the symbol.
#[must_use]
pub fn currency_texts(node: ElementRef<'_>, symbol: char) -> Vec<String> {
    let mut found = Vec::new();
    for element in node.descendent_elements() {
        let own_symbol = element
            .children()
            .filter_map(|child| child.value().as_text())
            .any(|text| text.contains(symbol));
        if !own_symbol {
            continue;
        }
        let text = text_of(element);
        if is_currency_token(&text, symbol) {
            found.push(text);
        }
    }
    found
}

fn is_currency_token(text: &str, symbol: char) -> bool {
    text.contains(symbol) && text.chars().any(|c| c.is_ascii_digit())
}
