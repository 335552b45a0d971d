//! Output and display functions for CLI results

use std::io::Write;

use anyhow::Result;
use colored::Colorize;

use packdown::convert::BatchReport;

/// Print the run summary to stdout, as text or JSON
pub fn display_report(report: &BatchReport, json: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, report)?;
        writeln!(out)?;
    } else {
        write_summary(&mut out, report)?;
    }
    Ok(())
}

/// Human-readable summary
pub(super) fn write_summary(out: &mut impl Write, report: &BatchReport) -> std::io::Result<()> {
    writeln!(
        out,
        "Converted {} HTML files to Markdown.",
        report.converted_count()
    )?;

    if report.images_copied() > 0 {
        writeln!(
            out,
            "  Images copied: {} (into {})",
            report.images_copied(),
            report.output_dir.join(packdown::convert::IMAGES_DIR).display()
        )?;
    }

    let unresolved = report.unresolved_count();
    if unresolved > 0 {
        writeln!(out, "  {} {}", "Unresolved images:".yellow(), unresolved)?;
        for result in &report.converted {
            for image in &result.unresolved_images {
                writeln!(
                    out,
                    "    {} (in {})",
                    image.display(),
                    result.source.display()
                )?;
            }
        }
    }

    if !report.failures.is_empty() {
        writeln!(
            out,
            "{} {} document(s) failed:",
            "error:".red().bold(),
            report.failures.len()
        )?;
        for failure in &report.failures {
            writeln!(out, "  {}: {}", failure.source.display(), failure.error)?;
        }
    }

    if report.interrupted {
        writeln!(
            out,
            "{} stopped before all documents were converted.",
            "Interrupted:".yellow()
        )?;
    }

    if report.is_empty() && !report.interrupted {
        writeln!(out, "No .html files found. Check your input path.")?;
    }
    Ok(())
}
