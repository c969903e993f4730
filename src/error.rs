//! Error types for pmotifs.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures of a detection run.
#[derive(Debug, Error)]
pub enum PmotifError {
    /// The graph is not a simple graph with node ids >= 1.
    #[error("graph {graph} violates precondition: {reason}")]
    Precondition { graph: String, reason: String },

    /// Text produced by the motif scanner could not be parsed.
    #[error("malformed {source_name} at line {line}: {reason}")]
    Format {
        source_name: String,
        line: usize,
        reason: String,
    },

    /// The motif scanner did not produce the promised output.
    #[error("external motif scanner failed: {0}")]
    ExternalProcess(String),

    /// A result directory was requested that was never published.
    #[error("no complete result at {0:?}")]
    IncompleteResult(PathBuf),

    /// Two metrics share a name within one registry.
    #[error("metric with name {0} already exists")]
    DuplicateMetric(String),

    /// Configuration values outside their valid range.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PmotifError {
    pub fn precondition(graph: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Precondition {
            graph: graph.into(),
            reason: reason.into(),
        }
    }

    pub fn format(source_name: impl Into<String>, line: usize, reason: impl Into<String>) -> Self {
        Self::Format {
            source_name: source_name.into(),
            line,
            reason: reason.into(),
        }
    }
}

/// Failure scoped to a single positional metric.
///
/// The pipeline records these per metric and keeps computing the others.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricError {
    /// A statistic needed by the metric is undefined for this graph.
    #[error("degenerate graph for metric: {0}")]
    Degenerate(String),

    /// The pre-computation lacks a key or holds a value of the wrong shape.
    #[error("invalid pre-computation `{key}`: {reason}")]
    PreCompute { key: String, reason: String },

    /// A raw metric value cannot be turned into an evaluation metric.
    #[error("invalid raw metric at occurrence {index}: {reason}")]
    RawValue { index: usize, reason: String },
}
