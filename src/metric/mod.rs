//! Positional metrics.
//!
//! A [`Metric`] is a named record of three functions: a per-graph
//! pre-computation, a per-occurrence calculation and an optional
//! post-processing step that turns the raw values of all occurrences into one
//! or more scalar evaluation metrics.

pub mod anchor_distance;
pub mod community;
pub mod external_degree;
pub mod module_participation;
pub mod registry;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::MetricError;
use crate::graph::{GraphInstance, NodeId};

pub use registry::MetricRegistry;

/// Per-graph values shared by all occurrence calculations of one metric.
pub type PreComputation = IndexMap<String, Value>;

/// Raw per-occurrence value; must serialize to JSON.
pub type RawMetric = Value;

/// Evaluation metric name to per-occurrence scalar values.
pub type EvaluatedMetrics = IndexMap<String, Vec<f64>>;

pub type PreComputeFn =
    Arc<dyn Fn(&GraphInstance) -> Result<PreComputation, MetricError> + Send + Sync>;
pub type CalculateFn = Arc<
    dyn Fn(&GraphInstance, &[NodeId], &PreComputation) -> Result<RawMetric, MetricError>
        + Send
        + Sync,
>;
pub type PostProcessFn =
    Arc<dyn Fn(&[RawMetric], &PreComputation) -> Result<EvaluatedMetrics, MetricError> + Send + Sync>;

#[derive(Clone)]
pub struct Metric {
    name: String,
    pre_compute: PreComputeFn,
    calculate: CalculateFn,
    post_process: Option<PostProcessFn>,
}

impl Metric {
    pub fn new<P, C>(name: impl Into<String>, pre_compute: P, calculate: C) -> Self
    where
        P: Fn(&GraphInstance) -> Result<PreComputation, MetricError> + Send + Sync + 'static,
        C: Fn(&GraphInstance, &[NodeId], &PreComputation) -> Result<RawMetric, MetricError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            pre_compute: Arc::new(pre_compute),
            calculate: Arc::new(calculate),
            post_process: None,
        }
    }

    pub fn with_post_process<F>(mut self, post_process: F) -> Self
    where
        F: Fn(&[RawMetric], &PreComputation) -> Result<EvaluatedMetrics, MetricError>
            + Send
            + Sync
            + 'static,
    {
        self.post_process = Some(Arc::new(post_process));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_post_process(&self) -> bool {
        self.post_process.is_some()
    }

    pub fn pre_compute(&self, graph: &GraphInstance) -> Result<PreComputation, MetricError> {
        (self.pre_compute)(graph)
    }

    pub fn calculate(
        &self,
        graph: &GraphInstance,
        nodes: &[NodeId],
        pre_compute: &PreComputation,
    ) -> Result<RawMetric, MetricError> {
        (self.calculate)(graph, nodes, pre_compute)
    }

    /// Turn raw values into evaluation metrics.
    ///
    /// Without a post-processing function the raw values must be numbers and are
    /// reported verbatim under the metric's own name.
    pub fn post_process(
        &self,
        raw_values: &[RawMetric],
        pre_compute: &PreComputation,
    ) -> Result<EvaluatedMetrics, MetricError> {
        if let Some(post_process) = &self.post_process {
            return post_process(raw_values, pre_compute);
        }
        let values = raw_values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                value.as_f64().ok_or_else(|| MetricError::RawValue {
                    index,
                    reason: format!("{value} is not a number"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut evaluated = EvaluatedMetrics::new();
        evaluated.insert(self.name.clone(), values);
        Ok(evaluated)
    }
}

impl fmt::Debug for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metric")
            .field("name", &self.name)
            .field("post_process", &self.post_process.is_some())
            .finish()
    }
}

/// Raw results of one metric over one graph.
///
/// `graphlet_metrics[i]` belongs to the i-th decoded occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricResult {
    pub metric_name: String,
    pub pre_compute: PreComputation,
    pub graphlet_metrics: Vec<RawMetric>,
}

impl MetricResult {
    pub fn evaluate(&self, metric: &Metric) -> Result<EvaluatedMetrics, MetricError> {
        metric.post_process(&self.graphlet_metrics, &self.pre_compute)
    }
}

/// The metrics shipped with the crate, in evaluation order.
pub fn default_metrics() -> Vec<Metric> {
    vec![
        external_degree::metric(),
        anchor_distance::metric(),
        module_participation::metric(),
    ]
}

pub(crate) fn pre_compute_value<'a>(
    pre_compute: &'a PreComputation,
    key: &str,
) -> Result<&'a Value, MetricError> {
    pre_compute.get(key).ok_or_else(|| MetricError::PreCompute {
        key: key.to_string(),
        reason: "missing".to_string(),
    })
}

pub(crate) fn invalid_pre_compute(key: &str, reason: impl Into<String>) -> MetricError {
    MetricError::PreCompute {
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Node ids stored as a JSON array of integers.
pub(crate) fn node_list(pre_compute: &PreComputation, key: &str) -> Result<Vec<NodeId>, MetricError> {
    pre_compute_value(pre_compute, key)?
        .as_array()
        .ok_or_else(|| invalid_pre_compute(key, "expected an array"))?
        .iter()
        .map(|value| {
            value
                .as_u64()
                .ok_or_else(|| invalid_pre_compute(key, format!("{value} is not a node id")))
        })
        .collect()
}
