//! Task graph
//!
//! Tasks are nodes of a petgraph `DiGraph`; an edge `a -> b` means `b` runs after `a`.
//! Edges that would close a cycle are refused when they are added, so a built graph
//! always has a topological order.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use extract_core::{PipelineParams, RetryPolicy};
use indexmap::IndexMap;
use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::dot::{Config as DotConfig, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::error::DagError;
use crate::task::Task;

/// Node weight: the task id, rendered as the node label.
#[derive(Debug, Clone)]
struct TaskNode(String);

impl fmt::Display for TaskNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Edge weight: `upstream >> downstream`. Rendered without a label.
#[derive(Debug, Clone, Copy)]
struct Dependency;

impl fmt::Display for Dependency {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ok(())
    }
}

/// A directed acyclic graph of tasks plus the metadata an orchestrator needs to run it.
pub struct Dag {
    dag_id: String,
    description: Option<String>,
    start_date: DateTime<Utc>,
    /// `None` means the graph is only triggered manually.
    schedule: Option<String>,
    params: PipelineParams,
    default_args: RetryPolicy,
    tasks: IndexMap<String, Arc<dyn Task>>,
    graph: DiGraph<TaskNode, Dependency>,
    nodes: HashMap<String, NodeIndex>,
}

impl Dag {
    pub fn new(dag_id: impl Into<String>, start_date: DateTime<Utc>) -> Self {
        Self {
            dag_id: dag_id.into(),
            description: None,
            start_date,
            schedule: None,
            params: PipelineParams::default(),
            default_args: RetryPolicy::default(),
            tasks: IndexMap::new(),
            graph: DiGraph::new(),
            nodes: HashMap::new(),
        }
    }

    /// Markdown documentation shown next to the graph.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_schedule(mut self, schedule: Option<String>) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_params(mut self, params: PipelineParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_default_args(mut self, default_args: RetryPolicy) -> Self {
        self.default_args = default_args;
        self
    }

    pub fn dag_id(&self) -> &str {
        &self.dag_id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    pub fn schedule(&self) -> Option<&str> {
        self.schedule.as_deref()
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    pub fn default_args(&self) -> RetryPolicy {
        self.default_args
    }

    /// Add a task. Task ids must be unique within the graph.
    pub fn add_task(&mut self, task: Arc<dyn Task>) -> Result<(), DagError> {
        let task_id = task.task_id().to_string();
        if self.tasks.contains_key(&task_id) {
            return Err(DagError::DuplicateTask(task_id));
        }

        let index = self.graph.add_node(TaskNode(task_id.clone()));
        self.nodes.insert(task_id.clone(), index);
        self.tasks.insert(task_id, task);
        Ok(())
    }

    /// Make `downstream` run after `upstream` (`upstream >> downstream`).
    ///
    /// Adding an edge that already exists is a no-op.
    pub fn set_downstream(&mut self, upstream: &str, downstream: &str) -> Result<(), DagError> {
        let from = self.index_of(upstream)?;
        let to = self.index_of(downstream)?;

        if from == to {
            return Err(DagError::SelfDependency(upstream.to_string()));
        }

        if self.graph.find_edge(from, to).is_some() {
            return Ok(());
        }

        let edge = self.graph.add_edge(from, to, Dependency);
        if is_cyclic_directed(&self.graph) {
            self.graph.remove_edge(edge);
            return Err(DagError::Cycle {
                upstream: upstream.to_string(),
                downstream: downstream.to_string(),
            });
        }

        Ok(())
    }

    pub fn task(&self, task_id: &str) -> Option<&Arc<dyn Task>> {
        self.tasks.get(task_id)
    }

    /// Task ids in insertion order.
    pub fn task_ids(&self) -> Vec<String> {
        self.tasks.keys().cloned().collect()
    }

    /// Direct upstream tasks of `task_id`, in insertion order.
    pub fn upstream_of(&self, task_id: &str) -> Result<Vec<String>, DagError> {
        self.neighbors(task_id, Direction::Incoming)
    }

    /// Direct downstream tasks of `task_id`, in insertion order.
    pub fn downstream_of(&self, task_id: &str) -> Result<Vec<String>, DagError> {
        self.neighbors(task_id, Direction::Outgoing)
    }

    /// Task ids ordered so every task comes after all of its upstream tasks.
    pub fn topological_order(&self) -> Result<Vec<String>, DagError> {
        let order = toposort(&self.graph, None)
            .map_err(|cycle| DagError::CycleDetected(self.graph[cycle.node_id()].0.clone()))?;

        Ok(order
            .into_iter()
            .map(|index| self.graph[index].0.clone())
            .collect())
    }

    /// Check that the graph can be run.
    pub fn validate(&self) -> Result<(), DagError> {
        self.topological_order().map(|_| ())
    }

    /// Render the graph as a Graphviz DOT string.
    pub fn to_dot(&self) -> String {
        format!(
            "{}",
            Dot::with_config(&self.graph, &[DotConfig::EdgeNoLabel])
        )
    }

    fn index_of(&self, task_id: &str) -> Result<NodeIndex, DagError> {
        self.nodes
            .get(task_id)
            .copied()
            .ok_or_else(|| DagError::UnknownTask(task_id.to_string()))
    }

    fn neighbors(&self, task_id: &str, direction: Direction) -> Result<Vec<String>, DagError> {
        let index = self.index_of(task_id)?;
        let mut neighbors: Vec<NodeIndex> =
            self.graph.neighbors_directed(index, direction).collect();
        neighbors.sort();
        neighbors.dedup();

        Ok(neighbors
            .into_iter()
            .map(|n| self.graph[n].0.clone())
            .collect())
    }
}

impl fmt::Debug for Dag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dag")
            .field("dag_id", &self.dag_id)
            .field("start_date", &self.start_date)
            .field("schedule", &self.schedule)
            .field("params", &self.params)
            .field("default_args", &self.default_args)
            .field("tasks", &self.task_ids())
            .finish()
    }
}
