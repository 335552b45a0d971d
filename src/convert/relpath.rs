//! Path algebra for rewritten references.
//!
//! Two operations: [`canonicalize_lossy`] turns a joined reference path into a
//! canonical absolute path even when the target does not exist, and
//! [`relativize`] expresses a target relative to the directory of an output
//! document using forward slashes on every platform.

use std::path::{Component, Path, PathBuf};

/// Canonicalize `path`, tolerating targets that do not exist.
///
/// Symlinks and `..` are resolved by the filesystem for the longest ancestor
/// that exists; the remaining components are normalized lexically. The result
/// is deterministic for a given filesystem state.
pub fn canonicalize_lossy(path: &Path) -> PathBuf {
    let components: Vec<Component<'_>> = path.components().collect();

    for split in (1..=components.len()).rev() {
        let head: PathBuf = components[..split].iter().collect();
        if let Ok(mut resolved) = dunce::canonicalize(&head) {
            push_lexical(&mut resolved, &components[split..]);
            return resolved;
        }
    }

    let mut resolved = PathBuf::new();
    push_lexical(&mut resolved, &components);
    resolved
}

fn push_lexical(base: &mut PathBuf, rest: &[Component<'_>]) {
    for component in rest {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                base.pop();
            }
            other => base.push(other.as_os_str()),
        }
    }
}

/// Relative path from the directory containing `from_document` to `target`.
///
/// Both inputs are expected to be canonical absolute paths. The result uses
/// `/` separators, is `"."` when `target` is that directory itself, and falls
/// back to the absolute target when no relative path exists (different
/// drive prefixes on Windows).
pub fn relativize(from_document: &Path, target: &Path) -> String {
    let base = from_document.parent().unwrap_or_else(|| Path::new(""));
    match pathdiff::diff_paths(target, base) {
        Some(relative) => to_forward_slashes(&relative),
        None => to_forward_slashes(target),
    }
}

/// Render a path with `/` separators regardless of the host separator.
pub fn to_forward_slashes(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push_str(&prefix.as_os_str().to_string_lossy()),
            Component::RootDir => out.push('/'),
            Component::CurDir => push_segment(&mut out, "."),
            Component::ParentDir => push_segment(&mut out, ".."),
            Component::Normal(segment) => push_segment(&mut out, &segment.to_string_lossy()),
        }
    }
    if out.is_empty() {
        ".".to_string()
    } else {
        out
    }
}

fn push_segment(out: &mut String, segment: &str) {
    if !out.is_empty() && !out.ends_with('/') {
        out.push('/');
    }
    out.push_str(segment);
}
