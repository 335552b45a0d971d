//! Progress bar driven by batch conversion events

use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};

use packdown::convert::{BatchObserver, ConvertError, ConvertResult};

use super::signal::check_interrupted;

pub(super) const PROGRESS_TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}";

/// Reports each converted document and stops the run on Ctrl+C.
pub(super) struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    pub(super) fn new(hidden: bool) -> Self {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(PROGRESS_TEMPLATE)
                    .unwrap_or_else(|e| {
                        tracing::warn!("Progress template error: {}, using default", e);
                        ProgressStyle::default_bar()
                    }),
            );
            pb
        };
        Self { bar }
    }

    pub(super) fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl BatchObserver for ProgressObserver {
    fn on_start(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn on_document(&self, source: &Path, outcome: Result<&ConvertResult, &ConvertError>) {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match outcome {
            Ok(_) => self.bar.set_message(name),
            Err(_) => self.bar.set_message(format!("{name} (failed)")),
        }
        self.bar.inc(1);
    }

    fn should_stop(&self) -> bool {
        check_interrupted()
    }
}
