//! Flat-rate cost model.
//!
//! Prices are a fixed monthly figure per instance type code. They approximate
//! the account's spend; they are not invoiced charges.

use std::str::FromStr;

use log::warn;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::inventory::{AccountInfo, ComputeInstance, ManagedCluster};

/// Price applied to type codes missing from [`PRICE_TABLE`] (the `g6-standard-2` tier).
pub const DEFAULT_MONTHLY_PRICE: Decimal = dec!(24.00);

/// Known instance type codes and their monthly price in USD.
pub const PRICE_TABLE: &[(&str, Decimal)] = &[
    ("g6-nanode-1", dec!(5.00)),
    ("g6-standard-1", dec!(12.00)),
    ("g6-standard-2", dec!(24.00)),
    ("g6-standard-4", dec!(48.00)),
    ("g6-standard-6", dec!(96.00)),
    ("g6-standard-8", dec!(192.00)),
    ("g6-standard-16", dec!(384.00)),
    ("g6-standard-20", dec!(480.00)),
    ("g6-standard-24", dec!(576.00)),
    ("g6-standard-32", dec!(768.00)),
];

/// Monthly price for `type_code`. Never fails: unknown codes resolve to
/// [`DEFAULT_MONTHLY_PRICE`].
pub fn monthly_cost(type_code: &str) -> Decimal {
    PRICE_TABLE
        .iter()
        .find(|(code, _)| *code == type_code)
        .map(|(_, price)| *price)
        .unwrap_or(DEFAULT_MONTHLY_PRICE)
}

pub fn compute_cost(instances: &[ComputeInstance]) -> Decimal {
    instances
        .iter()
        .map(|instance| monthly_cost(&instance.instance_type))
        .sum()
}

/// Sum of worker node costs over every pool of every cluster. The control
/// plane is free.
pub fn worker_cost(clusters: &[ManagedCluster]) -> Decimal {
    clusters
        .iter()
        .flat_map(|cluster| cluster.pools.iter())
        .map(|pool| monthly_cost(&pool.pool_type) * Decimal::from(pool.count))
        .sum()
}

pub fn grand_total(instances: &[ComputeInstance], clusters: &[ManagedCluster]) -> Decimal {
    compute_cost(instances) + worker_cost(clusters)
}

/// Parses an amount reported by the CLI, accepting plain and scientific notation.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

fn amount_or_zero(field: &str, raw: &str) -> Decimal {
    parse_amount(raw).unwrap_or_else(|| {
        warn!("Account field {field} has non-numeric value {raw:?}; treating it as 0");
        Decimal::ZERO
    })
}

/// Balance plus uninvoiced usage. Unparsable fields count as zero, and so
/// does a sum too large for `Decimal`.
pub fn amount_due(account: &AccountInfo) -> Decimal {
    let balance = amount_or_zero("balance", &account.balance);
    let uninvoiced = amount_or_zero("balance_uninvoiced", &account.balance_uninvoiced);
    balance.checked_add(uninvoiced).unwrap_or_else(|| {
        warn!("Total due overflows ({balance} + {uninvoiced}); treating it as 0");
        Decimal::ZERO
    })
}

/// Formats `amount` as dollars with two decimals, e.g. `$144.00`.
pub fn format_usd(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("${:.2}", rounded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::NodePool;

    #[test]
    fn known_codes_use_table_price() {
        for (code, price) in PRICE_TABLE {
            assert_eq!(monthly_cost(code), *price, "{code}");
        }
        assert_eq!(monthly_cost("g6-standard-4"), dec!(48));
    }

    #[test]
    fn unknown_codes_use_default_price() {
        assert_eq!(monthly_cost("custom-xyz"), DEFAULT_MONTHLY_PRICE);
        assert_eq!(monthly_cost(""), DEFAULT_MONTHLY_PRICE);
        assert_eq!(monthly_cost("G6-STANDARD-4"), DEFAULT_MONTHLY_PRICE);
        assert_ne!(monthly_cost("custom-xyz"), Decimal::ZERO);
    }

    #[test]
    fn compute_cost_sums_instances() {
        assert_eq!(compute_cost(&[]), Decimal::ZERO);

        let instances = vec![
            ComputeInstance::new("a", "g6-standard-2", "us-east", "running"),
            ComputeInstance::new("b", "g6-nanode-1", "us-east", "running"),
            ComputeInstance::new("c", "custom-xyz", "us-east", "running"),
        ];
        assert_eq!(compute_cost(&instances), dec!(53.00));
    }

    #[test]
    fn worker_cost_multiplies_pool_counts() {
        let clusters = vec![
            ManagedCluster::new("prod", "1.29", "us-east")
                .with_pools(vec![NodePool::new("g6-standard-4", 3), NodePool::new("g6-nanode-1", 0)]),
            ManagedCluster::new("dev", "1.29", "us-east"),
        ];
        assert_eq!(worker_cost(&clusters), dec!(144.00));
        assert_eq!(worker_cost(&[]), Decimal::ZERO);
    }

    #[test]
    fn grand_total_adds_both_categories() {
        let instances = vec![ComputeInstance::new("a", "g6-standard-2", "us-east", "running")];
        let clusters = vec![ManagedCluster::new("prod", "1.29", "us-east")
            .with_pools(vec![NodePool::new("g6-standard-4", 3)])];
        assert_eq!(grand_total(&instances, &clusters), dec!(168.00));
    }

    #[test]
    fn amount_due_coerces_garbage_to_zero() {
        let account = AccountInfo {
            email: "ops@example.com".into(),
            balance: "not-a-number".into(),
            balance_uninvoiced: "7.25".into(),
        };
        assert_eq!(amount_due(&account), dec!(7.25));
        assert_eq!(amount_due(&AccountInfo::default()), Decimal::ZERO);
    }

    #[test]
    fn amount_due_overflow_counts_as_zero() {
        let account = AccountInfo {
            email: "ops@example.com".into(),
            balance: "79228162514264337593543950335".into(),
            balance_uninvoiced: "1".into(),
        };
        assert_eq!(amount_due(&account), Decimal::ZERO);
    }

    #[test]
    fn parse_amount_accepts_scientific_notation() {
        assert_eq!(parse_amount(" 12.50 "), Some(dec!(12.50)));
        assert_eq!(parse_amount("1e2"), Some(dec!(100)));
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn format_usd_uses_two_decimals() {
        assert_eq!(format_usd(dec!(24)), "$24.00");
        assert_eq!(format_usd(dec!(144.005)), "$144.01");
        assert_eq!(format_usd(Decimal::ZERO), "$0.00");
    }
}
