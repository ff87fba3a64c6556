//! Inventory collection through `linode-cli`.
//!
//! Each category is fetched exactly once. A category that fails for any
//! reason (spawn error, non-zero exit, timeout, malformed or empty output) is
//! logged and replaced by an empty result so the report can still be built.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{describe_chain, CollectError};
use crate::inventory::{AccountInfo, ComputeInstance, Inventory, ManagedCluster, NodePool};

/// Program invoked when no other is configured.
pub const DEFAULT_PROGRAM: &str = "linode-cli";

/// Flag asking the CLI for machine readable output.
pub const JSON_FLAG: &str = "--json";

/// Upper bound on a single CLI invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Executes one CLI invocation and returns its standard output.
pub trait CommandRunner {
    /// Short name used in log messages.
    fn name(&self) -> &str;

    /// Runs the tool with `args` and returns stdout on a successful exit.
    fn run(&self, args: &[String]) -> Result<String, CollectError>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn run(&self, args: &[String]) -> Result<String, CollectError> {
        (**self).run(args)
    }
}

/// [`CommandRunner`] that spawns the real `linode-cli` process.
#[derive(Clone, Debug)]
pub struct LinodeCli {
    program: String,
    leading_args: Vec<String>,
    timeout: Duration,
}

impl Default for LinodeCli {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl LinodeCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Arguments placed before every category specific argument list, for
    /// wrappers such as `uvx linode-cli`.
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            // A read error only truncates what we report.
            let _ = pipe.read_to_end(&mut buffer);
            String::from_utf8_lossy(&buffer).into_owned()
        })
    })
}

fn collect_output(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

impl CommandRunner for LinodeCli {
    fn name(&self) -> &str {
        &self.program
    }

    fn run(&self, args: &[String]) -> Result<String, CollectError> {
        debug!(
            "Running {} {} {}",
            self.program,
            self.leading_args.join(" "),
            args.join(" ")
        );

        let mut child = Command::new(&self.program)
            .args(&self.leading_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CollectError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    // The reader threads are detached: a grandchild may still hold the pipes.
                    return Err(CollectError::Timeout {
                        timeout: self.timeout,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    let _ = child.kill();
                    return Err(CollectError::Wait {
                        program: self.program.clone(),
                        source,
                    });
                }
            }
        };

        let stdout = collect_output(stdout);
        let stderr = collect_output(stderr);

        if !status.success() {
            return Err(CollectError::Exit {
                status: status.to_string(),
                stderr: stderr.trim().to_owned(),
            });
        }

        Ok(stdout)
    }
}

/// Parses CLI output into records, requiring a non-empty JSON array.
pub fn parse_records<T: DeserializeOwned>(output: &str) -> Result<Vec<T>, CollectError> {
    if output.trim().is_empty() {
        return Err(CollectError::EmptyOutput);
    }

    let items = match serde_json::from_str::<Value>(output)? {
        Value::Array(items) if !items.is_empty() => items,
        Value::Array(_) => return Err(CollectError::NotAList("an empty list")),
        Value::Object(_) => return Err(CollectError::NotAList("an object")),
        _ => return Err(CollectError::NotAList("a scalar")),
    };

    items
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<T>, _>>()
        .map_err(CollectError::from)
}

/// Gathers the account inventory category by category.
pub struct Collector<R> {
    runner: R,
}

impl<R: CommandRunner> Collector<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    fn fetch<T: DeserializeOwned>(&self, args: &[&str]) -> Result<Vec<T>, CollectError> {
        let mut full_args: Vec<String> = args.iter().map(|arg| (*arg).to_owned()).collect();
        full_args.push(JSON_FLAG.to_owned());
        let output = self.runner.run(&full_args)?;
        parse_records(&output)
    }

    fn fetch_or_empty<T: DeserializeOwned>(&self, args: &[&str]) -> Vec<T> {
        self.fetch(args).unwrap_or_else(|err| {
            warn!(
                "Failed to run {} {}: {}",
                self.runner.name(),
                args.join(" "),
                describe_chain(&err)
            );
            Vec::new()
        })
    }

    pub fn account(&self) -> AccountInfo {
        self.fetch_or_empty::<AccountInfo>(&["account", "view"])
            .into_iter()
            .next()
            .unwrap_or_default()
    }

    pub fn instances(&self) -> Vec<ComputeInstance> {
        self.fetch_or_empty(&["linodes", "list"])
    }

    /// Lists clusters and then looks up the pools of each one in turn.
    pub fn clusters(&self) -> Vec<ManagedCluster> {
        self.fetch_or_empty::<ManagedCluster>(&["lke", "clusters-list"])
            .into_iter()
            .map(|cluster| match cluster.id {
                Some(id) => {
                    let pools = self.pools(id);
                    cluster.with_pools(pools)
                }
                None => cluster,
            })
            .collect()
    }

    pub fn pools(&self, cluster_id: u64) -> Vec<NodePool> {
        let id = cluster_id.to_string();
        self.fetch_or_empty(&["lke", "pools-list", id.as_str()])
    }

    pub fn collect(&self) -> Inventory {
        info!("Collecting account information...");
        let account = self.account();

        info!("Collecting compute resources...");
        let instances = self.instances();

        info!("Collecting Kubernetes clusters...");
        let clusters = self.clusters();

        Inventory::new(account, instances, clusters)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;

    #[derive(Default)]
    struct FakeCli {
        responses: HashMap<String, Result<String, ()>>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeCli {
        fn respond(mut self, args: &str, output: &str) -> Self {
            self.responses
                .insert(format!("{args} --json"), Ok(output.to_owned()));
            self
        }

        fn fail(mut self, args: &str) -> Self {
            self.responses.insert(format!("{args} --json"), Err(()));
            self
        }
    }

    impl CommandRunner for FakeCli {
        fn name(&self) -> &str {
            "fake-cli"
        }

        fn run(&self, args: &[String]) -> Result<String, CollectError> {
            let key = args.join(" ");
            self.calls.borrow_mut().push(key.clone());
            match self.responses.get(&key) {
                Some(Ok(output)) => Ok(output.clone()),
                Some(Err(())) => Err(CollectError::Exit {
                    status: "exit status: 1".into(),
                    stderr: "boom".into(),
                }),
                None => Err(CollectError::EmptyOutput),
            }
        }
    }

    #[test]
    fn parse_records_rejects_empty_and_non_list_output() {
        assert!(matches!(
            parse_records::<NodePool>("   "),
            Err(CollectError::EmptyOutput)
        ));
        assert!(matches!(
            parse_records::<NodePool>("[]"),
            Err(CollectError::NotAList(_))
        ));
        assert!(matches!(
            parse_records::<NodePool>("{\"type\": \"g6-standard-2\"}"),
            Err(CollectError::NotAList(_))
        ));
        assert!(matches!(
            parse_records::<NodePool>("[{"),
            Err(CollectError::Json { .. })
        ));
    }

    #[test]
    fn parse_records_keeps_tool_order() {
        let pools: Vec<NodePool> = parse_records(
            r#"[{"type": "g6-standard-4", "count": 3}, {"type": "g6-nanode-1", "count": 1}]"#,
        )
        .unwrap();
        assert_eq!(
            pools,
            vec![NodePool::new("g6-standard-4", 3), NodePool::new("g6-nanode-1", 1)]
        );
    }

    #[test]
    fn collects_every_category_and_fans_out_pools() {
        let cli = FakeCli::default()
            .respond(
                "account view",
                r#"[{"email": "ops@example.com", "balance": "10.00", "balance_uninvoiced": "2.50"}]"#,
            )
            .respond(
                "linodes list",
                r#"[{"label": "web-1", "type": "g6-standard-2", "region": "us-east", "status": "running"}]"#,
            )
            .respond(
                "lke clusters-list",
                r#"[{"id": 7, "label": "prod", "k8s_version": "1.29", "region": "us-east"},
                    {"id": 8, "label": "dev", "k8s_version": "1.28", "region": "us-west"}]"#,
            )
            .respond("lke pools-list 7", r#"[{"type": "g6-standard-4", "count": 3}]"#)
            .fail("lke pools-list 8");

        let inventory = Collector::new(&cli).collect();

        assert_eq!(inventory.account.email, "ops@example.com");
        assert_eq!(inventory.instances.len(), 1);
        assert_eq!(inventory.clusters.len(), 2);
        assert_eq!(inventory.clusters[0].pools, vec![NodePool::new("g6-standard-4", 3)]);
        assert!(inventory.clusters[1].pools.is_empty());
        assert_eq!(
            cli.calls.borrow().as_slice(),
            [
                "account view --json",
                "linodes list --json",
                "lke clusters-list --json",
                "lke pools-list 7 --json",
                "lke pools-list 8 --json",
            ]
        );
    }

    #[test]
    fn failed_categories_degrade_to_empty() {
        let cli = FakeCli::default()
            .fail("account view")
            .respond("linodes list", "not json")
            .respond("lke clusters-list", "[]");

        let inventory = Collector::new(&cli).collect();

        assert_eq!(inventory.account, AccountInfo::default());
        assert!(inventory.instances.is_empty());
        assert!(inventory.clusters.is_empty());
        assert_eq!(cli.calls.borrow().len(), 3);
    }

    #[test]
    fn clusters_without_id_skip_pool_lookup() {
        let cli = FakeCli::default().respond(
            "lke clusters-list",
            r#"[{"label": "orphan", "k8s_version": "1.29", "region": "us-east"}]"#,
        );

        let clusters = Collector::new(&cli).clusters();

        assert_eq!(clusters.len(), 1);
        assert!(clusters[0].pools.is_empty());
        assert_eq!(cli.calls.borrow().len(), 1);
    }
}
