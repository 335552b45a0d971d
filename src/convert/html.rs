//! Source decoding and HTML to Markdown conversion using `htmd`.

use std::sync::LazyLock;

use htmd::options::{BulletListMarker, HeadingStyle, Options};
use htmd::HtmlToMarkdown;

/// Tags whose content never reaches the Markdown output.
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Decode source bytes as UTF-8, dropping undecodable sequences.
///
/// Returns the text and the number of dropped sequences. A leading byte
/// order mark is removed.
pub fn decode_source(bytes: &[u8]) -> (String, usize) {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut text = String::with_capacity(bytes.len());
    let mut dropped = 0;
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
        if !chunk.invalid().is_empty() {
            dropped += 1;
        }
    }
    (text, dropped)
}

static CONVERTER: LazyLock<HtmlToMarkdown> = LazyLock::new(|| {
    HtmlToMarkdown::builder()
        .options(Options {
            heading_style: HeadingStyle::Atx,
            bullet_list_marker: BulletListMarker::Asterisk,
            ..Default::default()
        })
        .skip_tags(SKIPPED_TAGS.to_vec())
        .build()
});

/// Convert an HTML fragment to raw (uncleaned) Markdown.
pub fn html_to_markdown(html: &str) -> std::io::Result<String> {
    let _span = tracing::info_span!("html_to_markdown").entered();

    let markdown = CONVERTER.convert(html)?;
    tracing::debug!(bytes = markdown.len(), "HTML converted to markdown");
    Ok(markdown)
}
