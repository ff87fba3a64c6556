//! Assembles the logical billing report from the collected inventory.

use chrono::NaiveDateTime;
use genpdf::style::Color;

use crate::charts::ChartArtifacts;
use crate::inventory::Inventory;
use crate::model::{
    Block, Cover, ImageBlock, ReportDocument, RichParagraph, Section, Span, TableBlock, TableStyle,
};
use crate::pricing::{amount_due, compute_cost, format_usd, monthly_cost};

pub const REPORT_TITLE: &str = "Linode Infrastructure Billing Report";
pub const EXECUTIVE_SUMMARY: &str = "Executive Summary";
pub const COST_STRUCTURE: &str = "Cost Structure Analysis";
pub const COMPUTE_RESOURCES: &str = "Active Compute Resources";
pub const KUBERNETES: &str = "Kubernetes Infrastructure";
pub const RESOURCE_DISTRIBUTION: &str = "Resource Distribution";
pub const RECOMMENDATIONS: &str = "Cost Optimization Recommendations";

pub const NO_INSTANCES_NOTICE: &str = "No active compute instances";
pub const NO_CLUSTERS_NOTICE: &str = "No active Kubernetes clusters";

pub const RECOMMENDATION_LINES: [&str; 6] = [
    "• Review instance sizing - ensure resources match actual usage patterns",
    "• Consider shutting down development/testing instances outside business hours",
    "• Implement monitoring and alerting for cost management",
    "• Use Linode's backup service instead of custom solutions for cost efficiency",
    "• Evaluate long-term pricing options for stable workloads",
    "• Regular cleanup of unused volumes, snapshots, and networking resources",
];

pub const REPORT_DATE_FORMAT: &str = "%B %d, %Y at %H:%M";

pub const PRIMARY: Color = Color::Rgb(0x00, 0xA6, 0x51);
pub const SECONDARY: Color = Color::Rgb(0x19, 0x76, 0xD2);
pub const ACCENT: Color = Color::Rgb(0xFF, 0x6B, 0x35);

const LIGHT_GREY: Color = Color::Rgb(0xD3, 0xD3, 0xD3);
const SUMMARY_TINT: Color = Color::Rgb(0xE3, 0xF2, 0xFD);
const COMPUTE_TINT: Color = Color::Rgb(0xF0, 0xF0, 0xF0);
const KUBERNETES_TINT: Color = Color::Rgb(0xE8, 0xF5, 0xE8);

const COST_DIAGRAM_WIDTH_IN: f64 = 6.0;
const RESOURCE_CHART_WIDTH_IN: f64 = 4.0;

fn inches(values: &[f64]) -> Vec<f64> {
    values.iter().map(|inch| inch * 25.4).collect()
}

fn dollars(raw: &str) -> String {
    format!("${raw}")
}

/// Builds the report sections in their fixed order.
///
/// Table sections always appear and fall back to a notice when empty. Chart
/// sections appear only when the chart file was produced.
pub fn build_report(
    inventory: &Inventory,
    charts: &ChartArtifacts,
    generated_at: NaiveDateTime,
) -> ReportDocument {
    let cover = Cover::new(REPORT_TITLE)
        .with_block(Block::Table(account_table(inventory, generated_at)))
        .with_block(Block::Spacer(0.3 * 25.4));

    let mut report = ReportDocument::new(cover).add_section(
        Section::new(EXECUTIVE_SUMMARY)
            .with_block(Block::Table(summary_table(inventory)))
            .with_block(Block::Spacer(0.3 * 25.4)),
    );

    if let Some(path) = &charts.cost_diagram {
        report = report.add_section(
            Section::new(COST_STRUCTURE)
                .with_block(Block::Image(ImageBlock::new(path, COST_DIAGRAM_WIDTH_IN * 25.4)))
                .with_block(Block::Spacer(0.2 * 25.4)),
        );
    }

    report = report
        .add_section(compute_section(inventory))
        .add_section(kubernetes_section(inventory));

    if let Some(path) = &charts.resource_chart {
        report = report.add_section(
            Section::new(RESOURCE_DISTRIBUTION)
                .with_block(Block::Image(ImageBlock::new(path, RESOURCE_CHART_WIDTH_IN * 25.4)))
                .with_block(Block::Spacer(0.2 * 25.4)),
        );
    }

    report.add_section(recommendations_section())
}

fn account_table(inventory: &Inventory, generated_at: NaiveDateTime) -> TableBlock {
    let account = &inventory.account;
    TableBlock::new(
        inches(&[2.0, 3.0]),
        TableStyle::new(PRIMARY, LIGHT_GREY).with_header_font_size(12),
    )
    .with_row(["Account".to_owned(), account.email.clone()])
    .with_row([
        "Report Date".to_owned(),
        generated_at.format(REPORT_DATE_FORMAT).to_string(),
    ])
    .with_row(["Balance".to_owned(), dollars(&account.balance)])
    .with_row(["Uninvoiced Usage".to_owned(), dollars(&account.balance_uninvoiced)])
    .with_row(["Total Due".to_owned(), format_usd(amount_due(account))])
}

fn summary_table(inventory: &Inventory) -> TableBlock {
    let mut table = TableBlock::new(
        inches(&[3.0, 2.0]),
        TableStyle::new(SECONDARY, SUMMARY_TINT).with_header_font_size(12),
    )
    .with_row(["Metric", "Value"])
    .with_row([
        "Active Compute Instances".to_owned(),
        inventory.instances.len().to_string(),
    ])
    .with_row([
        "Active Kubernetes Clusters".to_owned(),
        inventory.clusters.len().to_string(),
    ])
    .with_row([
        "Current Month Usage".to_owned(),
        dollars(&inventory.account.balance_uninvoiced),
    ]);

    if !inventory.instances.is_empty() {
        table.push_row([
            "Est. Monthly Compute Cost".to_owned(),
            format_usd(compute_cost(&inventory.instances)),
        ]);
    }
    table
}

fn compute_section(inventory: &Inventory) -> Section {
    let section = Section::new(COMPUTE_RESOURCES);
    if inventory.instances.is_empty() {
        return section.with_block(Block::text(NO_INSTANCES_NOTICE));
    }

    let mut table = TableBlock::new(
        inches(&[1.5, 1.2, 1.2, 1.0, 1.1]),
        TableStyle::new(ACCENT, COMPUTE_TINT),
    )
    .with_row(["Instance", "Type", "Region", "Status", "Est. Monthly Cost"]);
    for instance in &inventory.instances {
        table.push_row([
            instance.display_label().to_owned(),
            instance.type_label().to_owned(),
            instance.display_region().to_owned(),
            instance.display_status().to_owned(),
            format_usd(monthly_cost(&instance.instance_type)),
        ]);
    }

    section
        .with_block(Block::Table(table))
        .with_block(Block::Spacer(0.3 * 25.4))
}

fn kubernetes_section(inventory: &Inventory) -> Section {
    let section = Section::new(KUBERNETES);
    if inventory.clusters.is_empty() {
        return section.with_block(Block::text(NO_CLUSTERS_NOTICE));
    }

    let mut table = TableBlock::new(
        inches(&[1.5, 1.2, 1.2, 2.1]),
        TableStyle::new(SECONDARY, KUBERNETES_TINT),
    )
    .with_row(["Cluster", "Version", "Region", "Node Pools"]);
    for cluster in &inventory.clusters {
        table.push_row([
            cluster.display_label().to_owned(),
            cluster.display_version().to_owned(),
            cluster.display_region().to_owned(),
            cluster.pool_summary(),
        ]);
    }

    section
        .with_block(Block::Table(table))
        .with_block(Block::Spacer(0.3 * 25.4))
}

fn recommendations_section() -> Section {
    Section::new(RECOMMENDATIONS).with_blocks(RECOMMENDATION_LINES.iter().flat_map(|line| {
        [
            Block::Paragraph(RichParagraph::new(vec![Span::new(*line)])),
            Block::Spacer(0.1 * 25.4),
        ]
    }))
}
