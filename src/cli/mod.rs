//! CLI implementation for packdown

mod config;
mod display;
mod progress;
mod signal;

use config::apply_config_defaults;
use display::display_report;
use progress::ProgressObserver;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use packdown::config::Config;
use packdown::convert::{convert_tree, ConvertOptions};

#[derive(Parser)]
#[command(name = "packdown")]
#[command(about = "Convert an HTML documentation pack into navigable Markdown")]
#[command(version)]
pub struct Cli {
    /// Root directory of the HTML export
    #[arg(short, long, env = "PACKDOWN_INPUT")]
    input: PathBuf,

    /// Output directory for Markdown files (created if absent)
    #[arg(short, long, env = "PACKDOWN_OUTPUT")]
    output: PathBuf,

    /// CSS selector for the main content (default tries common export containers)
    #[arg(long, env = "PACKDOWN_MAIN_SELECTOR")]
    main_selector: Option<String>,

    /// Convert N documents in parallel (image names then follow scheduling order)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Stop at the first document that fails to convert
    #[arg(long)]
    fail_fast: bool,

    /// Output the run report as JSON
    #[arg(long)]
    json: bool,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,

    /// Show debug info (RUST_LOG overrides)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            input_dir: self.input.clone(),
            output_dir: self.output.clone(),
            main_selector: self.main_selector.clone(),
            jobs: self.jobs.unwrap_or(Config::DEFAULT_JOBS).max(1),
            fail_fast: self.fail_fast,
        }
    }
}

/// Run CLI with pre-parsed arguments (main.rs parses first to set up logging)
pub fn run_with(mut cli: Cli) -> Result<()> {
    let _span = tracing::info_span!("run", input = %cli.input.display()).entered();

    // Load config and apply defaults (CLI flags override config)
    let config = Config::load(&cli.input);
    apply_config_defaults(&mut cli, &config);

    signal::setup_signal_handler();

    let opts = cli.convert_options();
    let observer = ProgressObserver::new(cli.quiet || cli.json);
    let report = convert_tree(&opts, &observer);
    observer.finish();
    let report = report?;

    display_report(&report, cli.json)?;

    if report.interrupted {
        std::process::exit(signal::ExitCode::Interrupted as i32);
    }
    if !report.failures.is_empty() {
        std::process::exit(signal::ExitCode::DocumentFailures as i32);
    }
    if report.is_empty() {
        std::process::exit(signal::ExitCode::NoDocuments as i32);
    }
    Ok(())
}
