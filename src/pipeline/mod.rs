pub mod metric_pipeline;
pub mod workflow;

pub use metric_pipeline::{
    MetricFailure, MetricOutcome, MetricPipeline, MetricStage, PipelineReport, PipelineStats,
};
pub use workflow::{DetectionSummary, DetectionWorkflow, GraphAnalysis, WorkflowStats};
