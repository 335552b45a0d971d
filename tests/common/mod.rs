//! Common test fixtures and helpers
//!
//! Usage in test files:
//! ```ignore
//! mod common;
//! use common::TestPack;
//! ```

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// An input pack and an output directory inside one temp dir
///
/// Both paths are canonical so they compare equal to paths in reports.
pub struct TestPack {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Temp directory (kept alive to prevent cleanup)
    _dir: TempDir,
}

impl TestPack {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let base = dunce::canonicalize(dir.path()).expect("Failed to canonicalize temp dir");
        let input = base.join("pack");
        fs::create_dir_all(&input).expect("Failed to create input dir");
        Self {
            input,
            output: base.join("md"),
            _dir: dir,
        }
    }

    /// Write a file under the input root, creating parent directories
    pub fn write(&self, rel: &str, content: impl AsRef<[u8]>) -> &Self {
        let path = self.input.join(rel);
        fs::create_dir_all(path.parent().expect("relative path has a parent"))
            .expect("Failed to create fixture dir");
        fs::write(&path, content).expect("Failed to write fixture");
        self
    }

    /// Read a converted file under the output root
    pub fn read_output(&self, rel: &str) -> String {
        fs::read_to_string(self.output.join(rel))
            .unwrap_or_else(|e| panic!("Failed to read output {rel}: {e}"))
    }

    pub fn output_exists(&self, rel: &str) -> bool {
        self.output.join(rel).exists()
    }
}

/// Wrap body HTML in a page with navigation chrome around the main content
pub fn page(main: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><head><title>t</title><style>p {{ color: red }}</style></head>
<body><div id="header">Site chrome</div><div id="main-content">{main}</div></body></html>"#
    )
}

/// Resolve a Markdown link destination from the document that contains it
pub fn resolve_from(document: &Path, destination: &str) -> PathBuf {
    let path = destination.split(['#', '?']).next().unwrap_or("");
    let mut resolved = document.parent().expect("document has a parent").to_path_buf();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                resolved.pop();
            }
            s => resolved.push(s),
        }
    }
    resolved
}
