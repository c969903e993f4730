//! Name-keyed collection of the metrics of one pipeline run.

use indexmap::IndexMap;

use crate::error::PmotifError;
use crate::metric::{default_metrics, Metric};

#[derive(Debug, Clone, Default)]
pub struct MetricRegistry {
    metrics: IndexMap<String, Metric>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the external degree, anchor distance and module
    /// participation metrics.
    pub fn with_default_metrics() -> Result<Self, PmotifError> {
        Self::from_metrics(default_metrics())
    }

    /// Register every metric in order, failing on the first duplicate name.
    pub fn from_metrics<I>(metrics: I) -> Result<Self, PmotifError>
    where
        I: IntoIterator<Item = Metric>,
    {
        let mut registry = Self::new();
        for metric in metrics {
            registry.register(metric)?;
        }
        Ok(registry)
    }

    /// Add a metric; names must be unique within the registry.
    pub fn register(&mut self, metric: Metric) -> Result<(), PmotifError> {
        if self.metrics.contains_key(metric.name()) {
            return Err(PmotifError::DuplicateMetric(metric.name().to_string()));
        }
        self.metrics.insert(metric.name().to_string(), metric);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Metric> {
        self.metrics.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.metrics.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.metrics.keys().map(String::as_str).collect()
    }

    /// Metrics in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Metric> {
        self.metrics.values()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}
