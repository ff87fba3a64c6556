//! End-to-end report generation: collect, draw, assemble, write.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use log::info;
use rust_decimal::Decimal;

use crate::builder::render_report;
use crate::charts::{render_charts, ChartArtifacts};
use crate::collector::{Collector, CommandRunner, LinodeCli, DEFAULT_PROGRAM, DEFAULT_TIMEOUT};
use crate::error::{ReportError, Result};
use crate::fonts::{FontLocator, ResolvedFonts};
use crate::inventory::Inventory;
use crate::pricing::amount_due;
use crate::report::build_report;

pub const DEFAULT_OUTPUT_DIR: &str = "reports";
pub const PDF_FILE: &str = "bill.pdf";

/// Settings for one run. `Default` reproduces the fixed behaviour:
/// `./reports`, `linode-cli` on the `PATH`, a 30 second timeout per call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub program: String,
    pub timeout: Duration,
    pub fonts_dir: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            program: DEFAULT_PROGRAM.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            fonts_dir: None,
        }
    }
}

impl ReportConfig {
    pub fn runner(&self) -> LinodeCli {
        LinodeCli::new(self.program.clone()).with_timeout(self.timeout)
    }

    pub fn pdf_path(&self) -> PathBuf {
        self.output_dir.join(PDF_FILE)
    }

    fn font_locator(&self) -> FontLocator {
        FontLocator::new().with_directory(self.fonts_dir.clone())
    }
}

/// What a successful run produced.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportOutcome {
    pub pdf_path: PathBuf,
    pub output_dir: PathBuf,
    pub charts: ChartArtifacts,
    pub balance: String,
    pub balance_uninvoiced: String,
    pub total_due: Decimal,
    pub instance_count: usize,
    pub cluster_count: usize,
}

/// Runs the whole pipeline against the configured `linode-cli`.
pub fn generate_report(config: &ReportConfig) -> Result<ReportOutcome> {
    generate_report_with(config, config.runner())
}

/// Runs the whole pipeline with a caller-supplied command runner.
pub fn generate_report_with<R: CommandRunner>(
    config: &ReportConfig,
    runner: R,
) -> Result<ReportOutcome> {
    info!("Starting Linode Billing Report Generation");
    fs::create_dir_all(&config.output_dir)
        .map_err(|err| ReportError::io(&config.output_dir, err))?;

    let fonts = config.font_locator().resolve()?;
    let inventory = Collector::new(runner).collect();

    write_report(
        &inventory,
        &fonts,
        &config.output_dir,
        Local::now().naive_local(),
    )
}

/// Draws the charts and writes `bill.pdf` for an already collected inventory.
pub fn write_report(
    inventory: &Inventory,
    fonts: &ResolvedFonts,
    output_dir: &Path,
    generated_at: NaiveDateTime,
) -> Result<ReportOutcome> {
    info!("Generating PDF report...");
    fs::create_dir_all(output_dir).map_err(|err| ReportError::io(output_dir, err))?;

    let charts = render_charts(inventory, &fonts.raster_fonts()?, output_dir)?;
    let report = build_report(inventory, &charts, generated_at);
    let bytes = render_report(&report, fonts)?;

    let pdf_path = output_dir.join(PDF_FILE);
    write_atomically(&pdf_path, &bytes)?;
    info!("PDF report generated: {}", pdf_path.display());

    Ok(ReportOutcome {
        pdf_path,
        output_dir: output_dir.to_path_buf(),
        charts,
        balance: inventory.account.balance.clone(),
        balance_uninvoiced: inventory.account.balance_uninvoiced.clone(),
        total_due: amount_due(&inventory.account),
        instance_count: inventory.instances.len(),
        cluster_count: inventory.clusters.len(),
    })
}

/// Writes `bytes` next to `path` first and renames it into place, so a failed
/// run never leaves a truncated document behind.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    fs::write(&tmp_path, bytes).map_err(|err| ReportError::io(&tmp_path, err))?;
    fs::rename(&tmp_path, path).map_err(|err| {
        let _ = fs::remove_file(&tmp_path);
        ReportError::io(path, err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_fixed_paths() {
        let config = ReportConfig::default();
        assert_eq!(config.pdf_path(), PathBuf::from("reports/bill.pdf"));
        assert_eq!(config.program, "linode-cli");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.runner().timeout(), Duration::from_secs(30));
    }

    #[test]
    fn atomic_write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PDF_FILE);
        fs::write(&path, b"old").unwrap();

        write_atomically(&path, b"new contents").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"new contents");
        assert!(!dir.path().join("bill.pdf.tmp").exists());
    }

    #[test]
    fn atomic_write_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join(PDF_FILE);

        let err = write_atomically(&path, b"data").unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
    }
}
