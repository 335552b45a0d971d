//! Reference classification.
//!
//! Every hyperlink and image value found in a document's content is sorted
//! into one of the [`Classification`] kinds. Classification is purely
//! syntactic and path-algebraic: nothing here checks whether a target exists.

use std::path::{Path, PathBuf};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use super::relpath::canonicalize_lossy;

/// Schemes whose references are always left byte-identical.
pub const PASSTHROUGH_SCHEMES: &[&str] = &["http", "https", "mailto", "tel", "data"];

/// Extensions (lowercase) of documents this crate converts.
pub const SOURCE_EXTENSIONS: &[&str] = &["html", "htm"];

/// Extension given to converted documents.
pub const MARKDOWN_EXTENSION: &str = "md";

/// Bytes escaped when a relative path is written back into a link destination.
const PATH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'(')
    .add(b')')
    .add(b'[')
    .add(b']');

/// Canonical filesystem target of an internal reference plus the query and
/// fragment it was authored with. Query and fragment are carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub path: PathBuf,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl ResolvedTarget {
    /// Same query and fragment, different path.
    pub fn with_path(&self, path: PathBuf) -> ResolvedTarget {
        ResolvedTarget {
            path,
            query: self.query.clone(),
            fragment: self.fragment.clone(),
        }
    }

    /// Compose the written-back reference value from a relative path.
    ///
    /// The path is percent-encoded for link-breaking ASCII bytes only, so
    /// non-ASCII names are written as they are. Query and fragment are
    /// reattached unchanged, including empty ones (`page.md?` stays so).
    pub fn compose(&self, relative: &str) -> String {
        let mut value = encode_path(relative);
        if let Some(query) = &self.query {
            value.push('?');
            value.push_str(query);
        }
        if let Some(fragment) = &self.fragment {
            value.push('#');
            value.push_str(fragment);
        }
        value
    }
}

fn encode_path(path: &str) -> String {
    let mut encoded = String::with_capacity(path.len());
    let mut buf = [0u8; 4];
    for c in path.chars() {
        if c.is_ascii() {
            encoded.extend(utf8_percent_encode(c.encode_utf8(&mut buf), PATH_ENCODE_SET));
        } else {
            encoded.push(c);
        }
    }
    encoded
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Empty or whitespace-only value. Left untouched.
    Inert,
    /// Remote or non-filesystem target. Left untouched.
    External,
    /// `#section` within the same page. Left untouched.
    SamePageAnchor,
    /// Filesystem target with a source-document extension.
    InternalDocument(ResolvedTarget),
    /// Any other filesystem target.
    InternalOther(ResolvedTarget),
}

impl Classification {
    pub fn kind(&self) -> &'static str {
        match self {
            Classification::Inert => "inert",
            Classification::External => "external",
            Classification::SamePageAnchor => "same-page-anchor",
            Classification::InternalDocument(_) => "internal-document",
            Classification::InternalOther(_) => "internal-other",
        }
    }
}

/// True when `path` carries a source-document extension (case-insensitive).
pub fn is_source_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            SOURCE_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// True when `scheme` is one of [`PASSTHROUGH_SCHEMES`] (case-insensitive).
pub fn is_passthrough_scheme(scheme: &str) -> bool {
    PASSTHROUGH_SCHEMES
        .iter()
        .any(|s| s.eq_ignore_ascii_case(scheme))
}

/// Classify `raw` as authored in the document at `document`.
///
/// `document` should be the canonical absolute location of the referencing
/// source file. The same pair of inputs always yields the same result.
pub fn classify(raw: &str, document: &Path) -> Classification {
    let value = raw.trim_matches(|c: char| c.is_ascii_whitespace());
    if value.is_empty() {
        return Classification::Inert;
    }

    // Network-path reference: a remote host with the scheme omitted.
    if value.starts_with("//") {
        return Classification::External;
    }

    if let Some(scheme) = scheme_of(value) {
        if scheme.eq_ignore_ascii_case("file") {
            return classify_file_url(value);
        }
        // One letter is a Windows drive, not a scheme.
        if scheme.len() > 1 {
            if !is_passthrough_scheme(scheme) {
                tracing::debug!(scheme, value, "Unknown scheme treated as external");
            }
            return Classification::External;
        }
    }

    let (rest, fragment) = match value.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (value, None),
    };
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };

    // A bare `#` also stays put.
    if path.is_empty() && (fragment.is_some_and(|f| !f.is_empty()) || value == "#") {
        return Classification::SamePageAnchor;
    }

    let resolved = if path.is_empty() {
        document.to_path_buf()
    } else {
        let decoded = percent_decode_str(path).decode_utf8_lossy();
        let base = document.parent().unwrap_or_else(|| Path::new(""));
        canonicalize_lossy(&base.join(decoded.as_ref()))
    };

    internal(ResolvedTarget {
        path: resolved,
        query: query.map(str::to_string),
        fragment: fragment.map(str::to_string),
    })
}

fn classify_file_url(value: &str) -> Classification {
    let Ok(url) = url::Url::parse(value) else {
        tracing::debug!(value, "Unparsable file URL left untouched");
        return Classification::External;
    };
    let Ok(path) = url.to_file_path() else {
        tracing::debug!(value, "file URL without a local path left untouched");
        return Classification::External;
    };
    internal(ResolvedTarget {
        path: canonicalize_lossy(&path),
        query: url.query().map(str::to_string),
        fragment: url.fragment().map(str::to_string),
    })
}

fn internal(target: ResolvedTarget) -> Classification {
    if is_source_document(&target.path) {
        Classification::InternalDocument(target)
    } else {
        Classification::InternalOther(target)
    }
}

/// URL scheme of `value`, if it starts with `ALPHA *(ALPHA / DIGIT / + / - / .) ":"`.
fn scheme_of(value: &str) -> Option<&str> {
    let colon = value.find(':')?;
    let scheme = &value[..colon];
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        Some(scheme)
    } else {
        None
    }
}
