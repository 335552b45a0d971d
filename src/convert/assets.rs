//! Image materialization into the shared `images/` directory.
//!
//! One [`AssetRecord`] lives for one batch run. It owns the set of claimed
//! destination names and the lock that makes "pick a free name, claim it,
//! copy" a single step when documents are converted in parallel.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::error::ConvertError;
use super::relpath::relativize;

/// Name of the flat asset directory at the output root.
pub const IMAGES_DIR: &str = "images";

#[derive(Default)]
struct Ledger {
    /// Lowercased claimed names, for case-insensitive collision checks.
    keys: HashSet<String>,
    /// Claimed names as written, in claim order.
    names: Vec<String>,
}

/// Collision ledger for one batch run.
#[derive(Default)]
pub struct AssetRecord {
    ledger: Mutex<Ledger>,
    /// Files already in the images directory belong to the input pack.
    keep_existing: bool,
}

impl AssetRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for an images directory that lives inside the input pack.
    ///
    /// Names already present on disk count as claimed, so pack files are
    /// never overwritten by another document's image.
    pub fn keeping_existing() -> Self {
        Self {
            keep_existing: true,
            ..Self::default()
        }
    }

    /// Names claimed so far, in claim order.
    pub fn claimed_names(&self) -> Vec<String> {
        self.lock().names.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic mid-copy leaves the ledger consistent (claims are only recorded
    // after a successful copy), so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.ledger
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Outcome of one materialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    /// Path to write back, relative to the output document's directory.
    pub relative: String,
    /// Location of the image under `images/`, or `None` when the source was
    /// unresolved.
    pub copied_to: Option<PathBuf>,
}

/// `foo.png` for `n == 0`, `foo-n.png` otherwise.
fn candidate_name(file_name: &str, n: usize) -> String {
    if n == 0 {
        return file_name.to_string();
    }
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}-{n}.{ext}"),
        None => format!("{stem}-{n}"),
    }
}

/// Copy `source` into `<output_root>/images/` under a collision-free name.
///
/// A source that is missing or not a regular file is not copied; the returned
/// path then points at the source location so the broken reference stays
/// visible in the output. A source that already is its own destination is
/// claimed without copying.
pub fn materialize_image(
    source: &Path,
    output_document: &Path,
    output_root: &Path,
    record: &AssetRecord,
) -> Result<Materialized, ConvertError> {
    let _span = tracing::info_span!("materialize_image", source = %source.display()).entered();

    let is_file = fs::metadata(source).map(|m| m.is_file()).unwrap_or(false);
    let file_name = source.file_name().and_then(|n| n.to_str());
    let file_name = match (is_file, file_name) {
        (true, Some(name)) => name,
        _ => {
            tracing::warn!(
                source = %source.display(),
                document = %output_document.display(),
                "Image not found, keeping reference to source location"
            );
            return Ok(Materialized {
                relative: relativize(output_document, source),
                copied_to: None,
            });
        }
    };

    let images_dir = output_root.join(IMAGES_DIR);

    let mut ledger = record.lock();
    let is_taken = |candidate: &str| {
        let destination = images_dir.join(candidate);
        destination != source
            && (ledger.keys.contains(&candidate.to_lowercase())
                || (record.keep_existing && destination.exists()))
    };
    let name = (0..)
        .map(|n| candidate_name(file_name, n))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| file_name.to_string());
    let destination = images_dir.join(&name);

    if destination == source {
        tracing::debug!(source = %source.display(), "Image already in place");
    } else {
        fs::create_dir_all(&images_dir).map_err(|e| ConvertError::io(&images_dir, e))?;
        fs::copy(source, &destination).map_err(|e| ConvertError::io(&destination, e))?;
        preserve_mtime(source, &destination);
    }

    if ledger.keys.insert(name.to_lowercase()) {
        ledger.names.push(name.clone());
    }
    drop(ledger);

    tracing::debug!(
        source = %source.display(),
        name = %name,
        "Claimed image name"
    );

    Ok(Materialized {
        relative: relativize(output_document, &destination),
        copied_to: Some(destination),
    })
}

/// `fs::copy` carries permissions; the modification time is copied here.
fn preserve_mtime(source: &Path, destination: &Path) {
    let result = fs::metadata(source)
        .and_then(|m| m.modified())
        .and_then(|mtime| {
            fs::File::options()
                .write(true)
                .open(destination)?
                .set_modified(mtime)
        });
    if let Err(e) = result {
        tracing::debug!(
            destination = %destination.display(),
            error = %e,
            "Could not preserve modification time"
        );
    }
}
