//! In-memory model of the account inventory returned by `linode-cli`.
//!
//! Every record is decoded leniently: fields the tool omits fall back to
//! defaults instead of failing the whole category, and numeric fields that the
//! tool sometimes prints as JSON numbers are kept in their textual form so the
//! report can echo them verbatim.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Placeholder shown for record fields the tool did not report.
pub const UNKNOWN: &str = "Unknown";

/// Account profile as reported by `linode-cli account view`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct AccountInfo {
    #[serde(default = "default_email", deserialize_with = "text_or_default_email")]
    pub email: String,
    #[serde(default = "default_amount", deserialize_with = "amount_text")]
    pub balance: String,
    #[serde(default = "default_amount", deserialize_with = "amount_text")]
    pub balance_uninvoiced: String,
}

impl Default for AccountInfo {
    fn default() -> Self {
        Self {
            email: default_email(),
            balance: default_amount(),
            balance_uninvoiced: default_amount(),
        }
    }
}

/// A provisioned compute instance.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ComputeInstance {
    #[serde(default, deserialize_with = "optional_text")]
    pub label: String,
    #[serde(rename = "type", default, deserialize_with = "optional_text")]
    pub instance_type: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub region: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub status: String,
}

impl ComputeInstance {
    pub fn new(
        label: impl Into<String>,
        instance_type: impl Into<String>,
        region: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            instance_type: instance_type.into(),
            region: region.into(),
            status: status.into(),
        }
    }

    /// Type code as shown in tables and charts.
    pub fn type_label(&self) -> &str {
        display_or(&self.instance_type, UNKNOWN)
    }

    pub fn display_label(&self) -> &str {
        display_or(&self.label, UNKNOWN)
    }

    pub fn display_region(&self) -> &str {
        display_or(&self.region, UNKNOWN)
    }

    pub fn display_status(&self) -> &str {
        display_or(&self.status, UNKNOWN)
    }
}

/// A homogeneous group of worker nodes inside a managed cluster.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct NodePool {
    #[serde(rename = "type", default, deserialize_with = "optional_text")]
    pub pool_type: String,
    #[serde(default)]
    pub count: u32,
}

impl NodePool {
    pub fn new(pool_type: impl Into<String>, count: u32) -> Self {
        Self {
            pool_type: pool_type.into(),
            count,
        }
    }

    pub fn type_label(&self) -> &str {
        display_or(&self.pool_type, "unknown")
    }

    /// `Nx TYPE` summary used in the clusters table.
    pub fn summary(&self) -> String {
        format!("{}x {}", self.count, self.type_label())
    }
}

/// A managed Kubernetes (LKE) cluster together with its node pools.
///
/// The pool list is filled by a separate lookup and is always present, even
/// when that lookup fails.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ManagedCluster {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "optional_text")]
    pub label: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub k8s_version: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub region: String,
    #[serde(skip)]
    pub pools: Vec<NodePool>,
}

impl ManagedCluster {
    pub fn new(
        label: impl Into<String>,
        k8s_version: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            k8s_version: k8s_version.into(),
            region: region.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_pools(mut self, pools: impl Into<Vec<NodePool>>) -> Self {
        self.pools = pools.into();
        self
    }

    pub fn display_label(&self) -> &str {
        display_or(&self.label, UNKNOWN)
    }

    pub fn display_version(&self) -> &str {
        display_or(&self.k8s_version, UNKNOWN)
    }

    pub fn display_region(&self) -> &str {
        display_or(&self.region, UNKNOWN)
    }

    /// Comma separated `Nx TYPE` list, or `No pools` when the cluster has none.
    pub fn pool_summary(&self) -> String {
        if self.pools.is_empty() {
            return "No pools".to_owned();
        }
        self.pools
            .iter()
            .map(NodePool::summary)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Everything collected for a single report run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    pub account: AccountInfo,
    pub instances: Vec<ComputeInstance>,
    pub clusters: Vec<ManagedCluster>,
}

impl Inventory {
    pub fn new(
        account: AccountInfo,
        instances: Vec<ComputeInstance>,
        clusters: Vec<ManagedCluster>,
    ) -> Self {
        Self {
            account,
            instances,
            clusters,
        }
    }

    /// Returns `true` when neither instances nor clusters are active.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty() && self.clusters.is_empty()
    }

    /// Instance counts per type code, in first-seen order.
    pub fn instance_type_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for instance in &self.instances {
            let label = instance.type_label();
            match counts.iter_mut().find(|(existing, _)| existing == label) {
                Some((_, count)) => *count += 1,
                None => counts.push((label.to_owned(), 1)),
            }
        }
        counts
    }
}

fn display_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

fn default_email() -> String {
    "N/A".to_owned()
}

fn default_amount() -> String {
    "0".to_owned()
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        other => Some(other.to_string()),
    }
}

fn optional_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn amount_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_text(Value::deserialize(deserializer)?).unwrap_or_else(default_amount))
}

fn text_or_default_email<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_text(Value::deserialize(deserializer)?).unwrap_or_else(default_email))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn account_defaults_when_fields_missing() {
        let account: AccountInfo = serde_json::from_value(json!({})).unwrap();
        assert_eq!(account, AccountInfo::default());
        assert_eq!(account.email, "N/A");
        assert_eq!(account.balance, "0");
    }

    #[test]
    fn numeric_balances_keep_their_text() {
        let account: AccountInfo = serde_json::from_value(json!({
            "email": "ops@example.com",
            "balance": 12.5,
            "balance_uninvoiced": "3.10"
        }))
        .unwrap();
        assert_eq!(account.balance, "12.5");
        assert_eq!(account.balance_uninvoiced, "3.10");
    }

    #[test]
    fn null_balance_falls_back_to_zero() {
        let account: AccountInfo =
            serde_json::from_value(json!({ "balance": null })).unwrap();
        assert_eq!(account.balance, "0");
    }

    #[test]
    fn instance_decodes_type_field() {
        let instance: ComputeInstance = serde_json::from_value(json!({
            "id": 1,
            "label": "web-1",
            "type": "g6-standard-2",
            "region": "us-east",
            "status": "running",
            "specs": { "disk": 81920 }
        }))
        .unwrap();
        assert_eq!(instance.instance_type, "g6-standard-2");
        assert_eq!(instance.type_label(), "g6-standard-2");
    }

    #[test]
    fn cluster_pools_start_empty() {
        let cluster: ManagedCluster = serde_json::from_value(json!({
            "id": 42,
            "label": "prod",
            "k8s_version": "1.29",
            "region": "eu-west"
        }))
        .unwrap();
        assert_eq!(cluster.id, Some(42));
        assert!(cluster.pools.is_empty());
        assert_eq!(cluster.pool_summary(), "No pools");
    }

    #[test]
    fn pool_summary_joins_pools() {
        let cluster = ManagedCluster::new("prod", "1.29", "eu-west").with_pools(vec![
            NodePool::new("g6-standard-4", 3),
            NodePool::new("", 1),
        ]);
        assert_eq!(cluster.pool_summary(), "3x g6-standard-4, 1x unknown");
    }

    #[test]
    fn type_counts_preserve_first_seen_order() {
        let inventory = Inventory::new(
            AccountInfo::default(),
            vec![
                ComputeInstance::new("a", "g6-standard-4", "us-east", "running"),
                ComputeInstance::new("b", "g6-nanode-1", "us-east", "running"),
                ComputeInstance::new("c", "g6-standard-4", "us-east", "offline"),
            ],
            Vec::new(),
        );
        assert_eq!(
            inventory.instance_type_counts(),
            vec![
                ("g6-standard-4".to_owned(), 2),
                ("g6-nanode-1".to_owned(), 1)
            ]
        );
    }
}
