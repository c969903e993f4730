//! Mann-Whitney comparison of per-occurrence evaluation metrics.

use indexmap::IndexMap;
use serde::Serialize;

use crate::graphlet::{group_by_class, GraphletClass, GraphletOccurrence};
use crate::metric::EvaluatedMetrics;
use crate::significance::stats::{mann_whitney_u, MannWhitney};

/// Evaluation metric values of one graph split by graphlet class.
pub type ClassMetrics = IndexMap<GraphletClass, EvaluatedMetrics>;

/// Group index-aligned evaluation metrics by the class of their occurrence.
pub fn class_metrics(occurrences: &[GraphletOccurrence], evaluated: &EvaluatedMetrics) -> ClassMetrics {
    group_by_class(occurrences)
        .into_iter()
        .map(|(class, indices)| {
            let metrics = evaluated
                .iter()
                .map(|(name, values)| {
                    let selected = indices
                        .iter()
                        .filter_map(|&idx| values.get(idx).copied())
                        .collect();
                    (name.clone(), selected)
                })
                .collect();
            (class, metrics)
        })
        .collect()
}

/// Original against the pooled ensemble values of one class and metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PooledTest {
    pub graphlet_class: GraphletClass,
    pub metric: String,
    /// `None` when either sample is empty.
    pub outcome: Option<MannWhitney>,
    pub significant: bool,
}

/// Original against every ensemble member separately, Bonferroni corrected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberwiseTest {
    pub graphlet_class: GraphletClass,
    pub metric: String,
    pub threshold: f64,
    pub tested_members: usize,
    pub significant_members: usize,
}

/// Pairwise tests between the classes of one graph for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalAnalysis {
    pub metric: String,
    pub classes: Vec<GraphletClass>,
    /// `p_values[i][j]` compares `classes[i]` with `classes[j]`.
    pub p_values: Vec<Vec<Option<f64>>>,
}

impl LocalAnalysis {
    pub fn significant_pairs(&self, alpha: f64) -> Vec<(&GraphletClass, &GraphletClass)> {
        let mut pairs = Vec::new();
        for (i, row) in self.p_values.iter().enumerate() {
            for (j, p_value) in row.iter().enumerate().skip(i + 1) {
                if matches!(p_value, Some(p) if *p < alpha) {
                    pairs.push((&self.classes[i], &self.classes[j]));
                }
            }
        }
        pairs
    }
}

fn values<'a>(metrics: &'a ClassMetrics, class: &GraphletClass, metric: &str) -> &'a [f64] {
    metrics
        .get(class)
        .and_then(|evaluated| evaluated.get(metric))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub fn pooled_tests(original: &ClassMetrics, ensemble: &[ClassMetrics], alpha: f64) -> Vec<PooledTest> {
    let mut tests = Vec::new();
    for (class, evaluated) in original {
        for (metric, original_values) in evaluated {
            let pooled: Vec<f64> = ensemble
                .iter()
                .flat_map(|member| values(member, class, metric).iter().copied())
                .collect();
            let outcome = mann_whitney_u(original_values, &pooled);
            tests.push(PooledTest {
                graphlet_class: class.clone(),
                metric: metric.clone(),
                significant: outcome.map_or(false, |result| result.p_value < alpha),
                outcome,
            });
        }
    }
    tests
}

pub fn memberwise_tests(
    original: &ClassMetrics,
    ensemble: &[ClassMetrics],
    alpha: f64,
) -> Vec<MemberwiseTest> {
    let threshold = if ensemble.is_empty() {
        alpha
    } else {
        alpha / ensemble.len() as f64
    };
    let mut tests = Vec::new();
    for (class, evaluated) in original {
        for (metric, original_values) in evaluated {
            let mut tested_members = 0;
            let mut significant_members = 0;
            for member in ensemble {
                if let Some(result) = mann_whitney_u(original_values, values(member, class, metric)) {
                    tested_members += 1;
                    if result.p_value < threshold {
                        significant_members += 1;
                    }
                }
            }
            tests.push(MemberwiseTest {
                graphlet_class: class.clone(),
                metric: metric.clone(),
                threshold,
                tested_members,
                significant_members,
            });
        }
    }
    tests
}

pub fn local_analysis(metrics: &ClassMetrics, metric: &str) -> LocalAnalysis {
    let classes: Vec<GraphletClass> = metrics.keys().cloned().collect();
    let p_values = classes
        .iter()
        .map(|left| {
            classes
                .iter()
                .map(|right| {
                    mann_whitney_u(values(metrics, left, metric), values(metrics, right, metric))
                        .map(|result| result.p_value)
                })
                .collect()
        })
        .collect();
    LocalAnalysis {
        metric: metric.to_string(),
        classes,
        p_values,
    }
}
