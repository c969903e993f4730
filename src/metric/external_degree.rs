use std::collections::HashSet;

use serde_json::json;

use crate::error::MetricError;
use crate::graph::{GraphInstance, NodeId};
use crate::metric::{EvaluatedMetrics, Metric, PreComputation, RawMetric};

pub const NAME: &str = "pDegree";
pub const DEGREE: &str = "degree";

pub fn metric() -> Metric {
    Metric::new(NAME, |_| Ok(PreComputation::new()), calculate).with_post_process(post_process)
}

/// Edges with exactly one endpoint among `nodes`.
pub fn external_degree(graph: &GraphInstance, nodes: &[NodeId]) -> usize {
    let members: HashSet<NodeId> = nodes.iter().copied().collect();
    members
        .iter()
        .filter(|node| graph.contains_node(**node))
        .map(|node| {
            graph
                .neighbors(*node)
                .filter(|neighbor| !members.contains(neighbor))
                .count()
        })
        .sum()
}

fn calculate(
    graph: &GraphInstance,
    nodes: &[NodeId],
    _pre_compute: &PreComputation,
) -> Result<RawMetric, MetricError> {
    Ok(json!(external_degree(graph, nodes)))
}

fn post_process(
    raw_values: &[RawMetric],
    _pre_compute: &PreComputation,
) -> Result<EvaluatedMetrics, MetricError> {
    let degrees = raw_values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            value.as_f64().ok_or_else(|| MetricError::RawValue {
                index,
                reason: format!("external degree {value} is not a number"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(EvaluatedMetrics::from([(DEGREE.to_string(), degrees)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphLoader;

    #[test]
    fn counts_edges_leaving_the_occurrence() {
        // Triangle 1-2-3 with pendant 4 on node 3 and 5 on node 1.
        let graph = GraphLoader::from_edge_list_str("g", "1 2\n2 3\n3 1\n3 4\n1 5\n4 5\n")
            .expect("graph");
        assert_eq!(external_degree(&graph, &[1, 2, 3]), 2);
        assert_eq!(external_degree(&graph, &[3, 4, 5]), 2);
        assert_eq!(external_degree(&graph, &[1, 2, 3, 4, 5]), 0);
    }

    #[test]
    fn evaluation_metric_is_named_degree() {
        let metric = metric();
        let graph = GraphLoader::from_edge_list_str("g", "1 2\n2 3\n").expect("graph");
        let pre = metric.pre_compute(&graph).expect("no pre-compute");
        assert!(pre.is_empty());
        let raw = metric.calculate(&graph, &[1, 2], &pre).expect("raw");
        let evaluated = metric.post_process(&[raw], &pre).expect("evaluated");
        assert_eq!(evaluated[DEGREE], vec![1.0]);
    }
}
