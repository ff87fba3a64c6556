use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use image::GenericImageView;
use linode_billing_report::collector::CommandRunner;
use linode_billing_report::error::CollectError;
use linode_billing_report::fonts::default_fonts_available;
use linode_billing_report::pipeline::{generate_report_with, ReportConfig};
use rust_decimal_macros::dec;

const SKIP_NOTICE: &str = "no usable font family found";

/// Answers each argument list with canned JSON; anything else fails.
struct CannedCli {
    responses: HashMap<String, String>,
}

impl CannedCli {
    fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            responses: pairs
                .iter()
                .map(|(args, output)| ((*args).to_owned(), (*output).to_owned()))
                .collect(),
        }
    }
}

impl CommandRunner for CannedCli {
    fn name(&self) -> &str {
        "canned-cli"
    }

    fn run(&self, args: &[String]) -> Result<String, CollectError> {
        self.responses
            .get(&args.join(" "))
            .cloned()
            .ok_or(CollectError::EmptyOutput)
    }
}

const ACCOUNT: &str = r#"[{"email": "ops@example.com", "balance": "10.00", "balance_uninvoiced": "5.5"}]"#;

fn config(dir: &tempfile::TempDir) -> ReportConfig {
    ReportConfig {
        output_dir: dir.path().join("reports"),
        ..ReportConfig::default()
    }
}

#[test]
fn empty_account_skips_distribution_chart() {
    if !default_fonts_available() {
        eprintln!("Skipping empty_account_skips_distribution_chart: {SKIP_NOTICE}");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    fs::create_dir_all(&config.output_dir).unwrap();
    let stale = config.output_dir.join("resource_chart.png");
    fs::write(&stale, b"left over").unwrap();

    let runner = CannedCli::new(&[
        ("account view --json", ACCOUNT),
        ("linodes list --json", "[]"),
        ("lke clusters-list --json", "[]"),
    ]);
    let outcome = generate_report_with(&config, runner).expect("report generation");

    assert_eq!(outcome.pdf_path, config.output_dir.join("bill.pdf"));
    assert!(fs::read(&outcome.pdf_path).unwrap().starts_with(b"%PDF"));
    assert!(config.output_dir.join("cost_structure.png").is_file());
    assert!(!stale.exists());
    assert_eq!(outcome.charts.resource_chart, None);
    assert_eq!(outcome.instance_count, 0);
    assert_eq!(outcome.cluster_count, 0);
    assert_eq!(outcome.total_due, dec!(15.5));
    assert!(!config.output_dir.join("bill.pdf.tmp").exists());
}

#[test]
fn populated_account_writes_both_charts() {
    if !default_fonts_available() {
        eprintln!("Skipping populated_account_writes_both_charts: {SKIP_NOTICE}");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);

    let runner = CannedCli::new(&[
        ("account view --json", ACCOUNT),
        (
            "linodes list --json",
            r#"[{"label": "web", "type": "g6-standard-2", "region": "us-east", "status": "running"},
                {"label": "db", "type": "custom-xyz", "region": "us-east", "status": "offline"}]"#,
        ),
        (
            "lke clusters-list --json",
            r#"[{"id": 11, "label": "prod", "k8s_version": "1.29", "region": "us-east"}]"#,
        ),
        (
            "lke pools-list 11 --json",
            r#"[{"type": "g6-standard-4", "count": 3}]"#,
        ),
    ]);
    let outcome = generate_report_with(&config, runner).expect("report generation");

    let chart: Option<PathBuf> = Some(config.output_dir.join("resource_chart.png"));
    assert_eq!(outcome.charts.resource_chart, chart);
    assert!(config.output_dir.join("resource_chart.png").is_file());
    assert!(config.output_dir.join("cost_structure.png").is_file());
    assert_eq!(outcome.instance_count, 2);
    assert_eq!(outcome.cluster_count, 1);

    let diagram = image::open(config.output_dir.join("cost_structure.png")).unwrap();
    assert_eq!((diagram.width(), diagram.height()), (1800, 1200));
}

#[test]
fn unwritable_output_dir_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("reports");
    fs::write(&blocker, b"a file where the directory should be").unwrap();

    let config = ReportConfig {
        output_dir: blocker,
        ..ReportConfig::default()
    };
    let runner = CannedCli::new(&[]);
    assert!(generate_report_with(&config, runner).is_err());
}
