//! Linode account billing report generator.
//!
//! Collects the account, compute and Kubernetes inventory through
//! `linode-cli`, estimates monthly costs from a static price table and writes
//! a paginated PDF with two embedded charts.

pub mod builder;
pub mod charts;
pub mod collector;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod inventory;
pub mod model;
pub mod pipeline;
pub mod pricing;
pub mod report;

pub use error::{ReportError, Result};
pub use pipeline::{generate_report, ReportConfig, ReportOutcome};
