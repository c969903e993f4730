pub mod config;
pub mod error;
pub mod graph;
pub mod graphlet;
pub mod metric;
pub mod pipeline;
pub mod randomization;
pub mod scanner;
pub mod significance;
pub mod store;

pub use config::DetectionConfig;
pub use error::{MetricError, PmotifError};
pub use graph::{EdgeListFormat, GraphInstance, GraphLoader, GraphWriter, NodeId};
pub use graphlet::{GraphletClass, GraphletOccurrence};
pub use metric::{EvaluatedMetrics, Metric, MetricRegistry, MetricResult, PreComputation, RawMetric};
pub use pipeline::{
    DetectionSummary, DetectionWorkflow, GraphAnalysis, MetricPipeline, PipelineReport,
    WorkflowStats,
};
pub use randomization::{randomize, EnsembleGenerator, EnsembleMember, RandomizationConfig};
pub use scanner::MotifScanner;
pub use store::{GraphDirectory, MetricStore};
