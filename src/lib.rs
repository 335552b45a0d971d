//! # packdown - HTML documentation packs to Markdown
//!
//! Converts an exported tree of interlinked HTML pages into a mirrored tree of
//! Markdown documents that stays navigable:
//!
//! - Links to other pages in the pack point at their `.md` counterparts
//! - Images are copied into one flat `images/` directory with collision-free names
//! - Fragments and query strings survive rewriting unchanged
//! - Remote links and same-page anchors are left alone
//!
//! ## Quick Start
//!
//! ```no_run
//! use packdown::convert::{convert_tree, ConvertOptions};
//!
//! # fn main() -> Result<(), packdown::convert::ConvertError> {
//! let opts = ConvertOptions::new("export/", "markdown/");
//! let report = convert_tree(&opts, &())?;
//! println!("Converted {} HTML files to Markdown.", report.converted_count());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod convert;

pub use convert::{convert_tree, BatchReport, ConvertError, ConvertOptions, Converter};
