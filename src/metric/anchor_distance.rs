//! Hop distance between an occurrence and the graph's hub ("anchor") nodes.
//!
//! Hubs are nodes whose degree exceeds the mean degree by more than one sample
//! standard deviation. Distances are normalized by the hub's closeness, the
//! mean distance from the hub to every other node it reaches.

use petgraph::algo::dijkstra;
use serde_json::{json, Map, Value};

use crate::error::MetricError;
use crate::graph::{GraphInstance, NodeId};
use crate::metric::{
    invalid_pre_compute, node_list, pre_compute_value, EvaluatedMetrics, Metric, PreComputation,
    RawMetric,
};
use crate::significance::stats::{mean, sample_std};

pub const NAME: &str = "pAnchorNodeDistance";

pub const ANCHOR_NODES: &str = "anchor_nodes";
pub const SHORTEST_PATH_LOOKUP: &str = "nodes_shortest_path_lookup";
pub const CLOSENESS_CENTRALITY: &str = "closeness_centrality";

pub const MAX_DISTANCE: &str = "max normalized anchor hop distance";
pub const MIN_DISTANCE: &str = "min normalized anchor hop distance";
pub const MEAN_DISTANCE: &str = "mean normalized anchor hop distance";

/// Raw distance for a hub none of the occurrence nodes can reach.
pub const UNREACHABLE: i64 = -1;
/// Evaluation value when the graph has no hubs.
pub const NO_ANCHOR: f64 = -1.0;

pub fn metric() -> Metric {
    Metric::new(NAME, pre_compute, calculate).with_post_process(post_process)
}

/// Nodes with degree above mean + sample standard deviation, in node order.
pub fn hubs(graph: &GraphInstance) -> Result<Vec<NodeId>, MetricError> {
    let degrees: Vec<(NodeId, f64)> = graph
        .nodes()
        .map(|node| (node, graph.degree(node) as f64))
        .collect();
    let values: Vec<f64> = degrees.iter().map(|(_, degree)| *degree).collect();
    let (mean, std) = match (mean(&values), sample_std(&values)) {
        (Some(mean), Some(std)) => (mean, std),
        _ => {
            return Err(MetricError::Degenerate(format!(
                "graph {} has {} nodes, the degree spread needs at least two",
                graph.name,
                values.len()
            )))
        }
    };
    if std == 0.0 {
        return Err(MetricError::Degenerate(format!(
            "every node of graph {} has degree {mean}, hubs are undefined",
            graph.name
        )));
    }
    let threshold = mean + std;
    Ok(degrees
        .into_iter()
        .filter(|(_, degree)| *degree > threshold)
        .map(|(node, _)| node)
        .collect())
}

fn pre_compute(graph: &GraphInstance) -> Result<PreComputation, MetricError> {
    let anchors = hubs(graph)?;
    log::debug!("graph {}: {} anchor nodes", graph.name, anchors.len());

    let mut lookup = Map::new();
    let mut closeness = Map::new();
    for &hub in &anchors {
        let distances = dijkstra(&graph.graph, hub, None, |_| 1u64);
        let mut table = Map::new();
        let mut total = 0u64;
        let mut reached = 0u64;
        for node in graph.nodes() {
            if let Some(&distance) = distances.get(&node) {
                table.insert(node.to_string(), json!(distance));
                if node != hub {
                    total += distance;
                    reached += 1;
                }
            }
        }
        let centrality = if reached == 0 {
            0.0
        } else {
            total as f64 / reached as f64
        };
        lookup.insert(hub.to_string(), Value::Object(table));
        closeness.insert(hub.to_string(), json!(centrality));
    }

    let mut pre = PreComputation::new();
    pre.insert(ANCHOR_NODES.to_string(), json!(anchors));
    pre.insert(SHORTEST_PATH_LOOKUP.to_string(), Value::Object(lookup));
    pre.insert(CLOSENESS_CENTRALITY.to_string(), Value::Object(closeness));
    Ok(pre)
}

fn hub_entry<'a>(
    pre_compute: &'a PreComputation,
    key: &str,
    hub: NodeId,
) -> Result<&'a Value, MetricError> {
    pre_compute_value(pre_compute, key)?
        .get(hub.to_string())
        .ok_or_else(|| invalid_pre_compute(key, format!("no entry for anchor {hub}")))
}

/// Per hub, 0 if the hub is part of the occurrence, else the shortest distance
/// from any reachable occurrence node, else [`UNREACHABLE`].
fn calculate(
    _graph: &GraphInstance,
    nodes: &[NodeId],
    pre_compute: &PreComputation,
) -> Result<RawMetric, MetricError> {
    let anchors = node_list(pre_compute, ANCHOR_NODES)?;
    let mut distances = Vec::with_capacity(anchors.len());
    for hub in anchors {
        if nodes.contains(&hub) {
            distances.push(0);
            continue;
        }
        let table = hub_entry(pre_compute, SHORTEST_PATH_LOOKUP, hub)?;
        let nearest = nodes
            .iter()
            .filter_map(|node| table.get(node.to_string()).and_then(Value::as_i64))
            .min()
            .unwrap_or(UNREACHABLE);
        distances.push(nearest);
    }
    Ok(json!(distances))
}

fn post_process(
    raw_values: &[RawMetric],
    pre_compute: &PreComputation,
) -> Result<EvaluatedMetrics, MetricError> {
    let anchors = node_list(pre_compute, ANCHOR_NODES)?;
    let closeness = anchors
        .iter()
        .map(|&hub| {
            let value = hub_entry(pre_compute, CLOSENESS_CENTRALITY, hub)?;
            match value.as_f64() {
                Some(centrality) if centrality > 0.0 => Ok(centrality),
                _ => Err(invalid_pre_compute(
                    CLOSENESS_CENTRALITY,
                    format!("anchor {hub} has closeness {value}"),
                )),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut max_values = Vec::with_capacity(raw_values.len());
    let mut min_values = Vec::with_capacity(raw_values.len());
    let mut mean_values = Vec::with_capacity(raw_values.len());
    for (index, raw) in raw_values.iter().enumerate() {
        let distances = raw
            .as_array()
            .filter(|distances| distances.len() == anchors.len())
            .ok_or_else(|| MetricError::RawValue {
                index,
                reason: format!("expected {} anchor distances, got {raw}", anchors.len()),
            })?;
        if anchors.is_empty() {
            max_values.push(NO_ANCHOR);
            min_values.push(NO_ANCHOR);
            mean_values.push(NO_ANCHOR);
            continue;
        }
        let normalized = distances
            .iter()
            .zip(&closeness)
            .map(|(distance, centrality)| {
                distance
                    .as_f64()
                    .map(|distance| distance / centrality)
                    .ok_or_else(|| MetricError::RawValue {
                        index,
                        reason: format!("distance {distance} is not a number"),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        max_values.push(normalized.iter().copied().fold(f64::NEG_INFINITY, f64::max));
        min_values.push(normalized.iter().copied().fold(f64::INFINITY, f64::min));
        mean_values.push(mean(&normalized).unwrap_or(NO_ANCHOR));
    }

    let mut evaluated = EvaluatedMetrics::new();
    evaluated.insert(MAX_DISTANCE.to_string(), max_values);
    evaluated.insert(MIN_DISTANCE.to_string(), min_values);
    evaluated.insert(MEAN_DISTANCE.to_string(), mean_values);
    Ok(evaluated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphLoader;

    /// Star centred on 1 with leaves 2..=6, plus a tail 6-7-8.
    fn star_with_tail() -> GraphInstance {
        GraphLoader::from_edge_list_str("star", "1 2\n1 3\n1 4\n1 5\n1 6\n6 7\n7 8\n")
            .expect("graph")
    }

    #[test]
    fn hub_is_the_star_centre() {
        assert_eq!(hubs(&star_with_tail()).expect("hubs"), vec![1]);
    }

    #[test]
    fn regular_graphs_are_degenerate() {
        let cycle = GraphLoader::from_edge_list_str("c6", "1 2\n2 3\n3 4\n4 5\n5 6\n6 1\n")
            .expect("cycle");
        assert!(matches!(hubs(&cycle), Err(MetricError::Degenerate(_))));

        let single = GraphLoader::from_edges("single", [(1, 2)]).expect("edge");
        assert!(matches!(
            metric().pre_compute(&single),
            Err(MetricError::Degenerate(_))
        ));
    }

    #[test]
    fn distances_and_normalization() {
        let graph = star_with_tail();
        let metric = metric();
        let pre = metric.pre_compute(&graph).expect("pre-compute");
        // Distances from 1: five nodes at 1, one at 2, one at 3.
        let closeness = pre[CLOSENESS_CENTRALITY]["1"].as_f64().expect("closeness");
        assert!((closeness - 10.0 / 7.0).abs() < 1e-12);

        let inside = metric.calculate(&graph, &[1, 2, 3], &pre).expect("raw");
        let tail = metric.calculate(&graph, &[7, 8], &pre).expect("raw");
        assert_eq!(inside, json!([0]));
        assert_eq!(tail, json!([2]));

        let evaluated = metric.post_process(&[inside, tail], &pre).expect("evaluated");
        assert_eq!(evaluated[MAX_DISTANCE][0], 0.0);
        assert!((evaluated[MEAN_DISTANCE][1] - 2.0 / closeness).abs() < 1e-12);
        assert_eq!(evaluated[MIN_DISTANCE][1], evaluated[MAX_DISTANCE][1]);
    }

    #[test]
    fn unreachable_hub_yields_negative_distance() {
        let mut graph = star_with_tail();
        graph.graph.add_edge(20, 21, ());
        let metric = metric();
        let pre = metric.pre_compute(&graph).expect("pre-compute");
        let raw = metric.calculate(&graph, &[20, 21], &pre).expect("raw");
        assert_eq!(raw, json!([UNREACHABLE]));
    }

    #[test]
    fn no_hubs_give_sentinels() {
        let mut pre = PreComputation::new();
        pre.insert(ANCHOR_NODES.to_string(), json!([]));
        pre.insert(SHORTEST_PATH_LOOKUP.to_string(), json!({}));
        pre.insert(CLOSENESS_CENTRALITY.to_string(), json!({}));
        let evaluated = post_process(&[json!([]), json!([])], &pre).expect("evaluated");
        for name in [MAX_DISTANCE, MIN_DISTANCE, MEAN_DISTANCE] {
            assert_eq!(evaluated[name], vec![NO_ANCHOR, NO_ANCHOR]);
        }
    }
}
