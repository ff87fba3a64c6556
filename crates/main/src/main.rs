use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::LevelFilter;

use linode_billing_report::collector::{DEFAULT_PROGRAM, DEFAULT_TIMEOUT};
use linode_billing_report::pipeline::DEFAULT_OUTPUT_DIR;
use linode_billing_report::pricing::format_usd;
use linode_billing_report::{generate_report, ReportConfig, ReportOutcome};

/// Generates a PDF billing and inventory report for the current Linode account.
///
/// Requires a configured `linode-cli` on the `PATH` (or passed with `--cli`).
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Directory receiving `bill.pdf` and the chart images.
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// The `linode-cli` executable to invoke.
    #[arg(long = "cli", default_value = DEFAULT_PROGRAM)]
    program: String,

    /// Seconds to wait for each `linode-cli` call.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,

    /// Directory searched first for a TrueType font family.
    #[arg(long)]
    fonts_dir: Option<PathBuf>,

    /// Log command lines and file paths.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else if self.quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Info
        }
    }

    fn config(&self) -> ReportConfig {
        ReportConfig {
            output_dir: self.output_dir.clone(),
            program: self.program.clone(),
            timeout: Duration::from_secs(self.timeout),
            fonts_dir: self.fonts_dir.clone(),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.level())
        .format_timestamp(None)
        .format_target(false)
        .init();

    match generate_report(&cli.config()) {
        Ok(outcome) => print_summary(&outcome),
        Err(err) => {
            eprintln!("Error generating report: {}", err);
            print_error_sources(&err);
            std::process::exit(1);
        }
    }
}

fn print_summary(outcome: &ReportOutcome) {
    println!();
    println!("Report Generation Complete!");
    println!("PDF Report: {}", outcome.pdf_path.display());
    println!("Output Directory: {}", outcome.output_dir.display());
    println!();
    println!("Account Summary:");
    println!("  Balance: ${}", outcome.balance);
    println!("  Uninvoiced Usage: ${}", outcome.balance_uninvoiced);
    println!("  Total Due: {}", format_usd(outcome.total_due));
    println!("  Compute Instances: {}", outcome.instance_count);
    println!("  Kubernetes Clusters: {}", outcome.cluster_count);
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_map_to_default_config() {
        let cli = Cli::parse_from(["billing-report"]);
        assert_eq!(cli.config(), ReportConfig::default());
        assert_eq!(cli.level(), LevelFilter::Info);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "billing-report",
            "--output-dir",
            "out",
            "--cli",
            "/opt/linode-cli",
            "--timeout",
            "5",
            "-v",
        ]);
        let config = cli.config();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.program, "/opt/linode-cli");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(cli.level(), LevelFilter::Debug);
    }
}
