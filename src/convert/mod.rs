//! HTML documentation pack to Markdown conversion.
//!
//! Converts every `.html`/`.htm` document under an input root into a Markdown
//! document at the mirrored location under an output root, keeping the
//! converted tree navigable.
//!
//! ## Pipeline (per document)
//!
//! 1. Read and decode the source (undecodable bytes are dropped)
//! 2. Select the main content subtree ([`content`])
//! 3. Rewrite hyperlinks and images ([`rewrite`]): internal documents point at
//!    their `.md` counterparts, images are copied into `images/`
//! 4. Convert to Markdown ([`html`]) and apply cleaning rules ([`cleaning`])
//! 5. Write the result, creating parent directories
//!
//! The only state shared between documents is the run's [`AssetRecord`], so
//! documents can be converted in parallel.

pub mod assets;
pub mod cleaning;
pub mod content;
pub mod error;
pub mod html;
pub mod reference;
pub mod relpath;
pub mod rewrite;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::Serialize;

pub use assets::{AssetRecord, IMAGES_DIR};
pub use content::{ContentLocator, DEFAULT_LOCATORS};
pub use error::ConvertError;
pub use reference::{classify, Classification, ResolvedTarget};

use reference::{is_source_document, MARKDOWN_EXTENSION};
use rewrite::{rewrite_references, RewriteContext};

/// Options controlling a batch run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// CSS selector tried before the default locator chain.
    pub main_selector: Option<String>,
    /// Worker threads. `1` converts sequentially in path order.
    pub jobs: usize,
    /// Abort on the first per-document failure instead of recording it.
    pub fail_fast: bool,
}

impl ConvertOptions {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            main_selector: None,
            jobs: 1,
            fail_fast: false,
        }
    }
}

/// Result of converting a single document.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertResult {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Locator that selected the content subtree.
    pub locator: String,
    pub links_rewritten: usize,
    pub images_copied: usize,
    pub unresolved_images: Vec<PathBuf>,
    /// Undecodable byte sequences dropped while reading the source.
    pub dropped_sequences: usize,
}

/// A document that failed to convert.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentFailure {
    pub source: PathBuf,
    pub error: String,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub converted: Vec<ConvertResult>,
    pub failures: Vec<DocumentFailure>,
    /// Names claimed in the output `images/` directory.
    pub images: Vec<String>,
    /// The run stopped early on request.
    pub interrupted: bool,
}

impl BatchReport {
    pub fn converted_count(&self) -> usize {
        self.converted.len()
    }

    pub fn images_copied(&self) -> usize {
        self.images.len()
    }

    pub fn unresolved_count(&self) -> usize {
        self.converted.iter().map(|r| r.unresolved_images.len()).sum()
    }

    /// Nothing was converted and nothing failed.
    pub fn is_empty(&self) -> bool {
        self.converted.is_empty() && self.failures.is_empty()
    }
}

/// Progress and cancellation hooks for [`convert_tree`].
///
/// Called from worker threads when `jobs > 1`.
pub trait BatchObserver: Sync {
    fn on_start(&self, _total: usize) {}

    fn on_document(&self, _source: &Path, _outcome: Result<&ConvertResult, &ConvertError>) {}

    /// Polled before each document. Returning `true` stops the run.
    fn should_stop(&self) -> bool {
        false
    }
}

impl BatchObserver for () {}

/// Check the input root precondition and return its canonical form.
pub fn validate_input(input_dir: &Path) -> Result<PathBuf, ConvertError> {
    let invalid = |reason: String| ConvertError::InvalidInput {
        path: input_dir.to_path_buf(),
        reason,
    };
    match fs::metadata(input_dir) {
        Ok(meta) if meta.is_dir() => dunce::canonicalize(input_dir).map_err(|e| invalid(e.to_string())),
        Ok(_) => Err(invalid("not a directory".to_string())),
        Err(e) => Err(invalid(e.to_string())),
    }
}

/// Source documents under `root`, sorted by path. Symlinks are not followed.
pub fn find_documents(root: &Path) -> Vec<PathBuf> {
    let mut documents: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !e.path_is_symlink())
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_source_document(e.path()))
        .map(|e| e.into_path())
        .collect();
    documents.sort();
    documents
}

/// Converts documents from one input root into one output root.
///
/// Owns the run's [`AssetRecord`]; create one converter per batch.
pub struct Converter {
    input_root: PathBuf,
    output_root: PathBuf,
    locator: ContentLocator,
    assets: AssetRecord,
}

impl Converter {
    /// Validate the input root, create the output root and canonicalize both.
    pub fn new(
        input_dir: &Path,
        output_dir: &Path,
        main_selector: Option<&str>,
    ) -> Result<Self, ConvertError> {
        let input_root = validate_input(input_dir)?;
        let locator = ContentLocator::new(main_selector)?;

        fs::create_dir_all(output_dir).map_err(|e| ConvertError::io(output_dir, e))?;
        let output_root =
            dunce::canonicalize(output_dir).map_err(|e| ConvertError::io(output_dir, e))?;

        let assets = if output_root.join(IMAGES_DIR).starts_with(&input_root) {
            AssetRecord::keeping_existing()
        } else {
            AssetRecord::new()
        };

        Ok(Self {
            input_root,
            output_root,
            locator,
            assets,
        })
    }

    pub fn input_root(&self) -> &Path {
        &self.input_root
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn assets(&self) -> &AssetRecord {
        &self.assets
    }

    /// Mirrored Markdown location for a canonical source path.
    pub fn output_path(&self, source: &Path) -> PathBuf {
        let relative = source
            .strip_prefix(&self.input_root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| source.file_name().map(PathBuf::from).unwrap_or_default());
        self.output_root
            .join(relative)
            .with_extension(MARKDOWN_EXTENSION)
    }

    /// Convert one source document and write its Markdown counterpart.
    pub fn convert_document(&self, source: &Path) -> Result<ConvertResult, ConvertError> {
        let _span = tracing::info_span!("convert_document", source = %source.display()).entered();

        let source = dunce::canonicalize(source).map_err(|e| ConvertError::io(source, e))?;
        let output = self.output_path(&source);

        let bytes = fs::read(&source).map_err(|e| ConvertError::io(&source, e))?;
        let (text, dropped_sequences) = html::decode_source(&bytes);
        if dropped_sequences > 0 {
            tracing::debug!(
                source = %source.display(),
                dropped = dropped_sequences,
                "Dropped undecodable byte sequences"
            );
        }

        let content = self.locator.select(&text);

        let ctx = RewriteContext {
            source: &source,
            output: &output,
            input_root: &self.input_root,
            output_root: &self.output_root,
            assets: &self.assets,
        };
        let (rewritten, stats) = rewrite_references(&content.html, &ctx)?;

        let markdown = html::html_to_markdown(&rewritten).map_err(|e| ConvertError::Serialize {
            path: source.clone(),
            source: e,
        })?;
        let cleaned = cleaning::clean_markdown(&markdown);

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|e| ConvertError::io(parent, e))?;
        }
        fs::write(&output, cleaned).map_err(|e| ConvertError::io(&output, e))?;

        tracing::info!(
            source = %source.display(),
            output = %output.display(),
            locator = %content.locator,
            links = stats.links_rewritten,
            images = stats.images_copied,
            unresolved = stats.unresolved_images.len(),
            "Converted document"
        );

        Ok(ConvertResult {
            source,
            output,
            locator: content.locator,
            links_rewritten: stats.links_rewritten,
            images_copied: stats.images_copied,
            unresolved_images: stats.unresolved_images,
            dropped_sequences,
        })
    }
}

/// Convert every source document under `opts.input_dir`.
///
/// Fails before processing anything when the input root is invalid or the
/// selector override does not parse. Per-document failures are recorded in
/// the report unless `opts.fail_fast` is set, in which case the first one
/// (in path order) is returned.
pub fn convert_tree(
    opts: &ConvertOptions,
    observer: &dyn BatchObserver,
) -> Result<BatchReport, ConvertError> {
    let _span = tracing::info_span!(
        "convert_tree",
        input = %opts.input_dir.display(),
        output = %opts.output_dir.display()
    )
    .entered();

    let converter = Converter::new(
        &opts.input_dir,
        &opts.output_dir,
        opts.main_selector.as_deref(),
    )?;
    let documents = find_documents(converter.input_root());
    tracing::debug!(count = documents.len(), "Found source documents");
    observer.on_start(documents.len());

    let outcomes = if opts.jobs > 1 {
        match rayon::ThreadPoolBuilder::new().num_threads(opts.jobs).build() {
            Ok(pool) => pool.install(|| convert_parallel(&converter, &documents, opts, observer)),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to build worker pool, converting sequentially");
                convert_sequential(&converter, &documents, opts, observer)
            }
        }
    } else {
        convert_sequential(&converter, &documents, opts, observer)
    };

    let mut report = BatchReport {
        input_dir: converter.input_root().to_path_buf(),
        output_dir: converter.output_root().to_path_buf(),
        interrupted: outcomes.len() < documents.len(),
        ..BatchReport::default()
    };

    for (source, outcome) in outcomes {
        match outcome {
            Ok(result) => report.converted.push(result),
            Err(e) if opts.fail_fast => return Err(e),
            Err(e) => {
                tracing::warn!(path = %source.display(), error = %e, "Failed to convert document");
                report.failures.push(DocumentFailure {
                    source,
                    error: e.to_string(),
                });
            }
        }
    }
    report.images = converter.assets().claimed_names();

    if report.interrupted {
        tracing::warn!(
            converted = report.converted.len(),
            remaining = documents.len() - report.converted.len() - report.failures.len(),
            "Conversion interrupted"
        );
    }
    tracing::info!(
        converted = report.converted.len(),
        failed = report.failures.len(),
        images = report.images.len(),
        "Tree conversion complete"
    );
    Ok(report)
}

type Outcome = (PathBuf, Result<ConvertResult, ConvertError>);

fn convert_sequential(
    converter: &Converter,
    documents: &[PathBuf],
    opts: &ConvertOptions,
    observer: &dyn BatchObserver,
) -> Vec<Outcome> {
    let mut outcomes = Vec::with_capacity(documents.len());
    for source in documents {
        if observer.should_stop() {
            break;
        }
        let outcome = converter.convert_document(source);
        observer.on_document(source, outcome.as_ref());
        let failed = outcome.is_err();
        outcomes.push((source.clone(), outcome));
        if failed && opts.fail_fast {
            break;
        }
    }
    outcomes
}

/// Outcomes come back in path order; documents skipped after a stop request
/// or a fail-fast failure are left out.
fn convert_parallel(
    converter: &Converter,
    documents: &[PathBuf],
    opts: &ConvertOptions,
    observer: &dyn BatchObserver,
) -> Vec<Outcome> {
    let aborted = AtomicBool::new(false);
    documents
        .par_iter()
        .map(|source| {
            if aborted.load(Ordering::Relaxed) || observer.should_stop() {
                return None;
            }
            let outcome = converter.convert_document(source);
            observer.on_document(source, outcome.as_ref());
            if outcome.is_err() && opts.fail_fast {
                aborted.store(true, Ordering::Relaxed);
            }
            Some((source.clone(), outcome))
        })
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}
