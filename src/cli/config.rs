//! Config file application

use packdown::config::Config;

use super::Cli;

/// Apply config file defaults to CLI options
/// CLI flags (and their environment variables) always override config values
pub(super) fn apply_config_defaults(cli: &mut Cli, config: &Config) {
    if cli.main_selector.is_none() {
        cli.main_selector = config.main_selector.clone();
    }
    if cli.jobs.is_none() {
        cli.jobs = config.jobs;
    }
    if !cli.fail_fast {
        if let Some(true) = config.fail_fast {
            cli.fail_fast = true;
        }
    }
    if !cli.quiet {
        if let Some(true) = config.quiet {
            cli.quiet = true;
        }
    }
}
