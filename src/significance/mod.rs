pub mod frequency;
pub mod positional;
pub mod stats;

pub use frequency::{ensemble_frequencies, frequency_significance, FrequencySignificance, FrequencyTable};
pub use positional::{
    class_metrics, local_analysis, memberwise_tests, pooled_tests, ClassMetrics, LocalAnalysis,
    MemberwiseTest, PooledTest,
};
pub use stats::{mann_whitney_u, mean, sample_std, z_score, MannWhitney, UNDEFINED_Z_SCORE};
