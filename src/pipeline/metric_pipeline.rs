use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, warn};
use rayon::prelude::*;

use crate::error::MetricError;
use crate::graph::GraphInstance;
use crate::graphlet::GraphletOccurrence;
use crate::metric::{EvaluatedMetrics, Metric, MetricRegistry, MetricResult, PreComputation, RawMetric};

pub const DEFAULT_CHUNK_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricStage {
    PreComputation,
    Calculation,
    PostProcessing,
}

impl fmt::Display for MetricStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            MetricStage::PreComputation => "pre-computation",
            MetricStage::Calculation => "calculation",
            MetricStage::PostProcessing => "post-processing",
        };
        f.write_str(stage)
    }
}

/// A metric that could not be completed for one graph.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFailure {
    pub metric_name: String,
    pub stage: MetricStage,
    pub error: MetricError,
}

/// Raw and evaluated values of one metric that ran to completion.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricOutcome {
    pub result: MetricResult,
    pub evaluated: EvaluatedMetrics,
}

#[derive(Debug, Default, Clone)]
pub struct PipelineStats {
    pub occurrences: usize,
    pub chunks: usize,
    pub calculations: usize,
    pub failed_calculations: usize,
}

#[derive(Debug)]
pub struct PipelineReport {
    pub outcomes: Vec<MetricOutcome>,
    pub failures: Vec<MetricFailure>,
    pub stats: PipelineStats,
    pub calculation_duration: Duration,
}

impl PipelineReport {
    pub fn outcome(&self, metric_name: &str) -> Option<&MetricOutcome> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.result.metric_name == metric_name)
    }

    pub fn failure(&self, metric_name: &str) -> Option<&MetricFailure> {
        self.failures
            .iter()
            .find(|failure| failure.metric_name == metric_name)
    }

    /// Evaluation metrics of all completed metrics, merged in registry order.
    pub fn evaluated(&self) -> EvaluatedMetrics {
        let mut merged = EvaluatedMetrics::new();
        for outcome in &self.outcomes {
            for (name, values) in &outcome.evaluated {
                merged.insert(name.clone(), values.clone());
            }
        }
        merged
    }
}

struct Prepared<'a> {
    metric: &'a Metric,
    pre_compute: PreComputation,
}

/// Per-chunk raw values, `values[metric][occurrence in chunk]`.
struct ChunkEvaluation {
    values: Vec<Vec<RawMetric>>,
    errors: Vec<Option<MetricError>>,
    calculations: usize,
    failed: usize,
}

/// Runs every registered metric over the occurrences of one graph.
pub struct MetricPipeline {
    registry: MetricRegistry,
    chunk_size: usize,
}

impl MetricPipeline {
    pub fn new(registry: MetricRegistry, chunk_size: usize) -> Self {
        Self {
            registry,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    /// Pre-compute once per metric, calculate per occurrence in parallel chunks,
    /// then post-process. A failing metric is reported and skipped; the other
    /// metrics still complete.
    pub fn execute(&self, graph: &GraphInstance, occurrences: &[GraphletOccurrence]) -> PipelineReport {
        let mut failures = Vec::new();

        let pre_computed: Vec<(&Metric, Result<PreComputation, MetricError>)> = self
            .registry
            .iter()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|metric| (metric, metric.pre_compute(graph)))
            .collect();
        let mut prepared = Vec::with_capacity(pre_computed.len());
        for (metric, pre_compute) in pre_computed {
            match pre_compute {
                Ok(pre_compute) => prepared.push(Prepared {
                    metric,
                    pre_compute,
                }),
                Err(error) => failures.push(record_failure(
                    graph,
                    metric.name(),
                    MetricStage::PreComputation,
                    error,
                )),
            }
        }

        let calculation_start = Instant::now();
        let chunks: Vec<ChunkEvaluation> = occurrences
            .par_chunks(self.chunk_size)
            .map(|chunk| evaluate_chunk(graph, &prepared, chunk))
            .collect();
        let calculation_duration = calculation_start.elapsed();

        let mut stats = PipelineStats {
            occurrences: occurrences.len(),
            chunks: chunks.len(),
            ..PipelineStats::default()
        };
        let mut raw_values: Vec<Vec<RawMetric>> = prepared
            .iter()
            .map(|_| Vec::with_capacity(occurrences.len()))
            .collect();
        let mut first_errors: Vec<Option<MetricError>> = vec![None; prepared.len()];
        for chunk in chunks {
            stats.calculations += chunk.calculations;
            stats.failed_calculations += chunk.failed;
            for (idx, (values, error)) in chunk.values.into_iter().zip(chunk.errors).enumerate() {
                raw_values[idx].extend(values);
                if first_errors[idx].is_none() {
                    first_errors[idx] = error;
                }
            }
        }

        let mut outcomes = Vec::with_capacity(prepared.len());
        for ((entry, values), error) in prepared.into_iter().zip(raw_values).zip(first_errors) {
            let name = entry.metric.name();
            if let Some(error) = error {
                failures.push(record_failure(graph, name, MetricStage::Calculation, error));
                continue;
            }
            match entry.metric.post_process(&values, &entry.pre_compute) {
                Ok(evaluated) => outcomes.push(MetricOutcome {
                    result: MetricResult {
                        metric_name: name.to_string(),
                        pre_compute: entry.pre_compute,
                        graphlet_metrics: values,
                    },
                    evaluated,
                }),
                Err(error) => failures.push(record_failure(
                    graph,
                    name,
                    MetricStage::PostProcessing,
                    error,
                )),
            }
        }

        debug!(
            "Metrics on {}: {} occurrences in {} chunks, {} completed, {} failed, {:?}",
            graph.name,
            stats.occurrences,
            stats.chunks,
            outcomes.len(),
            failures.len(),
            calculation_duration
        );
        PipelineReport {
            outcomes,
            failures,
            stats,
            calculation_duration,
        }
    }
}

fn evaluate_chunk(
    graph: &GraphInstance,
    prepared: &[Prepared<'_>],
    chunk: &[GraphletOccurrence],
) -> ChunkEvaluation {
    let mut evaluation = ChunkEvaluation {
        values: prepared
            .iter()
            .map(|_| Vec::with_capacity(chunk.len()))
            .collect(),
        errors: vec![None; prepared.len()],
        calculations: 0,
        failed: 0,
    };
    for occurrence in chunk {
        for (idx, entry) in prepared.iter().enumerate() {
            // Once a metric has failed its remaining values are discarded anyway.
            if evaluation.errors[idx].is_some() {
                continue;
            }
            evaluation.calculations += 1;
            match entry
                .metric
                .calculate(graph, &occurrence.nodes, &entry.pre_compute)
            {
                Ok(value) => evaluation.values[idx].push(value),
                Err(error) => {
                    evaluation.failed += 1;
                    evaluation.errors[idx] = Some(error);
                }
            }
        }
    }
    evaluation
}

fn record_failure(
    graph: &GraphInstance,
    metric_name: &str,
    stage: MetricStage,
    error: MetricError,
) -> MetricFailure {
    warn!(
        "Metric {} failed during {} on {}: {}",
        metric_name, stage, graph.name, error
    );
    MetricFailure {
        metric_name: metric_name.to_string(),
        stage,
        error,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::graph::GraphLoader;
    use crate::graphlet::GraphletClass;

    fn path_occurrences() -> Vec<GraphletOccurrence> {
        let dash = GraphletClass::from_name("3-Dash").expect("dash");
        (1..=6)
            .map(|start| GraphletOccurrence::new(dash.clone(), vec![start, start + 1, start + 2]))
            .collect()
    }

    #[test]
    fn small_chunks_keep_occurrence_order() {
        let graph = GraphLoader::from_edges("path", (1..=8).map(|node| (node, node + 1)))
            .expect("path");
        let mut registry = MetricRegistry::new();
        registry
            .register(Metric::new(
                "first node",
                |_| Ok(PreComputation::new()),
                |_, nodes, _| Ok(json!(nodes[0])),
            ))
            .expect("register");
        let report = MetricPipeline::new(registry, 2).execute(&graph, &path_occurrences());
        let outcome = report.outcome("first node").expect("completed");
        assert_eq!(outcome.evaluated["first node"], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(report.stats.chunks, 3);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn calculation_failure_is_scoped_to_its_metric() {
        let graph = GraphLoader::from_edges("path", (1..=8).map(|node| (node, node + 1)))
            .expect("path");
        let mut registry = MetricRegistry::new();
        registry
            .register(Metric::new(
                "fails on 4",
                |_| Ok(PreComputation::new()),
                |_, nodes, _| {
                    if nodes.contains(&4) {
                        Err(MetricError::Degenerate("node 4".to_string()))
                    } else {
                        Ok(json!(1))
                    }
                },
            ))
            .expect("register");
        registry
            .register(crate::metric::external_degree::metric())
            .expect("register");

        let report = MetricPipeline::new(registry, 4).execute(&graph, &path_occurrences());
        let failure = report.failure("fails on 4").expect("failed");
        assert_eq!(failure.stage, MetricStage::Calculation);
        let degree = report.outcome("pDegree").expect("completed");
        assert_eq!(degree.result.graphlet_metrics.len(), 6);
        assert_eq!(degree.evaluated["degree"], vec![1.0, 2.0, 2.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn empty_occurrence_list() {
        let graph = GraphLoader::from_edges("edge", [(1, 2), (2, 3)]).expect("graph");
        let registry = MetricRegistry::with_default_metrics().expect("defaults");
        let pipeline = MetricPipeline::new(registry, 16);
        let report = pipeline.execute(&graph, &[]);
        let degree = report.outcome("pDegree").expect("completed");
        assert!(degree.result.graphlet_metrics.is_empty());
        assert_eq!(report.stats.chunks, 0);
    }
}
