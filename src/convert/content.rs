//! Main-content selection.
//!
//! Tries an explicit override first, then [`DEFAULT_LOCATORS`] in order, then
//! `body`, then the whole document. First match wins.

use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::error::ConvertError;

/// Common documentation-export containers, most specific first.
pub const DEFAULT_LOCATORS: &[&str] = &[
    "#main-content",
    "div#content",
    "div#page",
    "article",
    "div#main",
    "div#content-body",
    "div.content",
];

static DEFAULT_SELECTORS: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    DEFAULT_LOCATORS
        .iter()
        .map(|css| {
            (
                *css,
                Selector::parse(css).expect("hardcoded content locator selector"),
            )
        })
        .collect()
});

static BODY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("hardcoded body selector"));

/// The chosen content subtree, serialized back to HTML.
#[derive(Debug, Clone)]
pub struct ContentNode {
    pub html: String,
    /// Locator that matched (`":root"` for the whole-document fallback).
    pub locator: String,
}

/// Locator chain with an optional explicit override.
pub struct ContentLocator {
    custom: Option<(String, Selector)>,
}

impl ContentLocator {
    /// Build the chain. A blank override is ignored; an unparsable one is an
    /// error so it surfaces before any document is processed.
    pub fn new(main_selector: Option<&str>) -> Result<Self, ConvertError> {
        let custom = match main_selector.map(str::trim).filter(|s| !s.is_empty()) {
            Some(css) => {
                let selector =
                    Selector::parse(css).map_err(|e| ConvertError::InvalidSelector {
                        selector: css.to_string(),
                        reason: e.to_string(),
                    })?;
                Some((css.to_string(), selector))
            }
            None => None,
        };
        Ok(Self { custom })
    }

    pub fn custom(&self) -> Option<&str> {
        self.custom.as_ref().map(|(css, _)| css.as_str())
    }

    /// Select the content subtree of `html`.
    pub fn select(&self, html: &str) -> ContentNode {
        let document = Html::parse_document(html);

        let chain = self
            .custom
            .iter()
            .map(|(css, sel)| (css.as_str(), sel))
            .chain(DEFAULT_SELECTORS.iter().map(|(css, sel)| (*css, sel)))
            .chain(std::iter::once(("body", &*BODY_SELECTOR)));

        for (css, selector) in chain {
            if let Some(node) = document.select(selector).next() {
                return ContentNode {
                    html: node.html(),
                    locator: css.to_string(),
                };
            }
        }

        ContentNode {
            html: document.root_element().html(),
            locator: ":root".to_string(),
        }
    }
}
