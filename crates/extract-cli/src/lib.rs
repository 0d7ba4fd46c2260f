//! Helpers shared by the `extract` binary

use anyhow::{bail, Context};
use extract_core::{ObjectLocator, StorageBackend};
use extract_pipeline::Dag;
use serde::Serialize;
use serde_json::{json, Value};

/// Print a value as pretty JSON on stdout.
pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// Summary of a graph: its metadata, tasks in run order with their upstreams, and the
/// retry policy an orchestrator would apply.
pub fn describe_dag(dag: &Dag) -> anyhow::Result<Value> {
    let mut tasks = Vec::new();
    for task_id in dag.topological_order()? {
        let upstream = dag.upstream_of(&task_id)?;
        tasks.push(json!({ "task_id": task_id, "upstream": upstream }));
    }

    Ok(json!({
        "dag_id": dag.dag_id(),
        "description": dag.description(),
        "start_date": dag.start_date(),
        "schedule": dag.schedule(),
        "params": dag.params(),
        "default_args": {
            "retries": dag.default_args().retries,
            "retry_delay_secs": dag.default_args().retry_delay_secs,
        },
        "tasks": tasks,
    }))
}

/// Parse a locator and check it addresses the configured backend.
pub fn parse_locator_for(locator: &str, backend: StorageBackend) -> anyhow::Result<ObjectLocator> {
    let parsed: ObjectLocator = locator.parse()?;
    if parsed.scheme() != backend.scheme() {
        bail!(
            "Locator scheme '{}' does not match the configured {} backend (expected '{}')",
            parsed.scheme(),
            backend,
            backend.scheme()
        );
    }
    Ok(parsed)
}
