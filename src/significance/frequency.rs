use indexmap::IndexMap;
use serde::Serialize;

use crate::graphlet::GraphletClass;
use crate::significance::stats::z_score;

pub type FrequencyTable = IndexMap<GraphletClass, u64>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencySignificance {
    pub graphlet_class: GraphletClass,
    pub original: u64,
    /// Frequency in every ensemble member, in member order; absent classes count 0.
    pub ensemble: Vec<u64>,
    pub z_score: f64,
}

/// Frequencies of `class` across the ensemble, one entry per member.
pub fn ensemble_frequencies(class: &GraphletClass, ensemble: &[FrequencyTable]) -> Vec<u64> {
    ensemble
        .iter()
        .map(|table| table.get(class).copied().unwrap_or(0))
        .collect()
}

/// Z-score of every class of the original frequency table against the ensemble.
pub fn frequency_significance(
    original: &FrequencyTable,
    ensemble: &[FrequencyTable],
) -> Vec<FrequencySignificance> {
    original
        .iter()
        .map(|(class, &count)| {
            let frequencies = ensemble_frequencies(class, ensemble);
            let values: Vec<f64> = frequencies.iter().map(|&f| f as f64).collect();
            FrequencySignificance {
                graphlet_class: class.clone(),
                original: count,
                z_score: z_score(count as f64, &values),
                ensemble: frequencies,
            }
        })
        .collect()
}
