//! Reference rewriting over a document's content subtree.
//!
//! Hyperlinks (`a[href]`) and images (`img[src]`) are visited exactly once
//! each by a streaming `lol_html` pass. Values that do not need rewriting are
//! left byte-identical.

use std::cell::RefCell;
use std::error::Error;
use std::path::{Path, PathBuf};

use lol_html::{element, HtmlRewriter, Settings};
use serde::Serialize;

use super::assets::{materialize_image, AssetRecord};
use super::error::ConvertError;
use super::reference::{classify, Classification, ResolvedTarget, MARKDOWN_EXTENSION};
use super::relpath::relativize;

/// The two reference kinds found in content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Hyperlink,
    Image,
}

impl ReferenceKind {
    pub fn selector(self) -> &'static str {
        match self {
            ReferenceKind::Hyperlink => "a[href]",
            ReferenceKind::Image => "img[src]",
        }
    }

    pub fn attribute(self) -> &'static str {
        match self {
            ReferenceKind::Hyperlink => "href",
            ReferenceKind::Image => "src",
        }
    }
}

/// Locations needed to rewrite one document's references.
pub struct RewriteContext<'a> {
    /// Canonical location of the source document.
    pub source: &'a Path,
    /// Location the Markdown output will be written to.
    pub output: &'a Path,
    pub input_root: &'a Path,
    pub output_root: &'a Path,
    pub assets: &'a AssetRecord,
}

impl RewriteContext<'_> {
    /// Output counterpart of a source document target.
    ///
    /// Targets inside the input root are mirrored into the output root;
    /// anything else keeps its location. The extension becomes `.md`.
    pub fn mirrored_markdown(&self, target: &Path) -> PathBuf {
        let mirrored = match target.strip_prefix(self.input_root) {
            Ok(relative) => self.output_root.join(relative),
            Err(_) => target.to_path_buf(),
        };
        mirrored.with_extension(MARKDOWN_EXTENSION)
    }
}

/// Per-document rewrite counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewriteStats {
    pub links_rewritten: usize,
    pub images_copied: usize,
    /// Image targets that were not found on disk.
    pub unresolved_images: Vec<PathBuf>,
}

struct Walker<'c, 'a> {
    ctx: &'c RewriteContext<'a>,
    stats: RefCell<RewriteStats>,
    failure: RefCell<Option<ConvertError>>,
}

impl Walker<'_, '_> {
    /// New value for the reference, or `None` to leave it untouched.
    fn visit(
        &self,
        kind: ReferenceKind,
        raw: &str,
    ) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
        let value = html_escape::decode_html_entities(raw);
        let classification = classify(&value, self.ctx.source);
        tracing::debug!(
            kind = ?kind,
            value = %value,
            class = classification.kind(),
            "Classified reference"
        );

        let target = match classification {
            Classification::Inert
            | Classification::External
            | Classification::SamePageAnchor => return Ok(None),
            Classification::InternalDocument(target) | Classification::InternalOther(target)
                if kind == ReferenceKind::Image =>
            {
                // `src="?v=2"` names the page itself, which is not an image.
                if target.path == self.ctx.source {
                    return Ok(None);
                }
                return self.image(&target);
            }
            Classification::InternalDocument(target) => {
                target.with_path(self.ctx.mirrored_markdown(&target.path))
            }
            Classification::InternalOther(target) => target,
        };

        let relative = relativize(self.ctx.output, &target.path);
        self.stats.borrow_mut().links_rewritten += 1;
        Ok(Some(encode(&target.compose(&relative))))
    }

    fn image(
        &self,
        target: &ResolvedTarget,
    ) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
        match materialize_image(
            &target.path,
            self.ctx.output,
            self.ctx.output_root,
            self.ctx.assets,
        ) {
            Ok(materialized) => {
                let mut stats = self.stats.borrow_mut();
                if materialized.copied_to.is_some() {
                    stats.images_copied += 1;
                } else {
                    stats.unresolved_images.push(target.path.clone());
                }
                Ok(Some(encode(&target.compose(&materialized.relative))))
            }
            Err(e) => {
                let message = e.to_string();
                self.failure.borrow_mut().get_or_insert(e);
                Err(message.into())
            }
        }
    }
}

fn encode(value: &str) -> String {
    html_escape::encode_double_quoted_attribute(value).into_owned()
}

/// Rewrite every hyperlink and image reference in `html`.
///
/// Returns the rewritten HTML and counters. A failed image copy aborts the
/// document with that copy's error.
pub fn rewrite_references(
    html: &str,
    ctx: &RewriteContext<'_>,
) -> Result<(String, RewriteStats), ConvertError> {
    let _span = tracing::info_span!("rewrite_references", source = %ctx.source.display()).entered();

    let walker = Walker {
        ctx,
        stats: RefCell::new(RewriteStats::default()),
        failure: RefCell::new(None),
    };
    let mut output = Vec::with_capacity(html.len());

    let result = {
        let mut rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: vec![
                    element!(ReferenceKind::Hyperlink.selector(), |el| {
                        let kind = ReferenceKind::Hyperlink;
                        if let Some(raw) = el.get_attribute(kind.attribute()) {
                            if let Some(value) = walker.visit(kind, &raw)? {
                                el.set_attribute(kind.attribute(), &value)?;
                            }
                        }
                        Ok(())
                    }),
                    element!(ReferenceKind::Image.selector(), |el| {
                        let kind = ReferenceKind::Image;
                        if let Some(raw) = el.get_attribute(kind.attribute()) {
                            if let Some(value) = walker.visit(kind, &raw)? {
                                el.set_attribute(kind.attribute(), &value)?;
                            }
                        }
                        Ok(())
                    }),
                ],
                ..Settings::default()
            },
            |c: &[u8]| output.extend_from_slice(c),
        );
        match rewriter.write(html.as_bytes()) {
            Ok(()) => rewriter.end(),
            Err(e) => Err(e),
        }
    };

    if let Some(failure) = walker.failure.into_inner() {
        return Err(failure);
    }
    result.map_err(|e| ConvertError::Rewrite {
        path: ctx.source.to_path_buf(),
        reason: e.to_string(),
    })?;

    let rewritten = String::from_utf8(output).map_err(|e| ConvertError::Rewrite {
        path: ctx.source.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok((rewritten, walker.stats.into_inner()))
}
