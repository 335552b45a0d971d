//! Configuration file support for packdown
//!
//! Config files are loaded in order (later overrides earlier):
//! 1. `~/.config/packdown/config.toml` (user defaults)
//! 2. `packdown.toml` in the input root (pack overrides)
//!
//! CLI flags and environment variables override all config file values.

use serde::Deserialize;
use std::path::Path;

/// File name of the per-pack config, looked up in the input root.
pub const PROJECT_CONFIG_FILE: &str = "packdown.toml";

/// Configuration options loaded from config files
///
/// # Example
///
/// ```toml
/// # ~/.config/packdown/config.toml or <input>/packdown.toml
/// main_selector = ".wiki-content"  # Tried before the default locators
/// jobs = 4                         # Parallel document conversion
/// fail_fast = false                # Stop on the first failed document
/// quiet = false                    # Suppress progress output
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Content selector override (overridden by --main-selector)
    pub main_selector: Option<String>,
    /// Worker threads (overridden by -j)
    pub jobs: Option<usize>,
    /// Abort on first per-document failure
    pub fail_fast: Option<bool>,
    /// Enable quiet mode by default
    pub quiet: Option<bool>,
}

impl Config {
    /// Load configuration from the user config and the pack's config file
    pub fn load(input_root: &Path) -> Self {
        let user_config = dirs::config_dir()
            .map(|d| d.join("packdown/config.toml"))
            .and_then(|p| Self::load_file(&p))
            .unwrap_or_default();

        let project_config =
            Self::load_file(&input_root.join(PROJECT_CONFIG_FILE)).unwrap_or_default();

        // Pack overrides user
        let merged = user_config.override_with(project_config);
        tracing::debug!(
            main_selector = ?merged.main_selector,
            jobs = ?merged.jobs,
            fail_fast = ?merged.fail_fast,
            quiet = ?merged.quiet,
            "Effective config after merge"
        );
        merged
    }

    /// Load configuration from a specific file
    fn load_file(path: &Path) -> Option<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read config {}: {}", path.display(), e);
                return None;
            }
        };

        match toml::from_str::<Self>(&content) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "Loaded config");
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Layer another config on top (other overrides self where present)
    fn override_with(self, other: Self) -> Self {
        Config {
            main_selector: other.main_selector.or(self.main_selector),
            jobs: other.jobs.or(self.jobs),
            fail_fast: other.fail_fast.or(self.fail_fast),
            quiet: other.quiet.or(self.quiet),
        }
    }

    // ===== Accessors with defaults =====

    /// Default worker count: sequential, deterministic image naming
    pub const DEFAULT_JOBS: usize = 1;

    /// Get worker count with default fallback (never zero)
    pub fn jobs_or_default(&self) -> usize {
        self.jobs.unwrap_or(Self::DEFAULT_JOBS).max(1)
    }

    pub fn fail_fast_or_default(&self) -> bool {
        self.fail_fast.unwrap_or(false)
    }

    /// Get quiet mode with default fallback (false)
    pub fn quiet_or_default(&self) -> bool {
        self.quiet.unwrap_or(false)
    }
}
