use std::collections::BTreeSet;

use serde_json::{json, Map, Value};

use crate::error::MetricError;
use crate::graph::{GraphInstance, NodeId};
use crate::metric::community::greedy_modularity_communities;
use crate::metric::{
    invalid_pre_compute, pre_compute_value, EvaluatedMetrics, Metric, PreComputation, RawMetric,
};

pub const NAME: &str = "pGraphModuleParticipation";

pub const GRAPH_MODULES: &str = "graph_modules";
pub const NODE_MODULE_LOOKUP: &str = "node_module_lookup";

pub const PARTICIPATION_RATIO: &str = "graph module participation ratio";

/// Evaluation value when the graph has no modules.
pub const NO_MODULES: f64 = -1.0;

pub fn metric() -> Metric {
    Metric::new(NAME, pre_compute, calculate).with_post_process(post_process)
}

fn pre_compute(graph: &GraphInstance) -> Result<PreComputation, MetricError> {
    let modules = greedy_modularity_communities(graph);
    log::debug!("graph {}: {} graph modules", graph.name, modules.len());

    let mut lookup = Map::new();
    for (module_idx, module) in modules.iter().enumerate() {
        for node in module {
            lookup.insert(node.to_string(), json!(module_idx));
        }
    }

    let mut pre = PreComputation::new();
    pre.insert(GRAPH_MODULES.to_string(), json!(modules));
    pre.insert(NODE_MODULE_LOOKUP.to_string(), Value::Object(lookup));
    Ok(pre)
}

/// Ascending indices of the modules holding at least one occurrence node.
fn calculate(
    _graph: &GraphInstance,
    nodes: &[NodeId],
    pre_compute: &PreComputation,
) -> Result<RawMetric, MetricError> {
    let lookup = pre_compute_value(pre_compute, NODE_MODULE_LOOKUP)?;
    let mut participated = BTreeSet::new();
    for node in nodes {
        let module = lookup
            .get(node.to_string())
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                invalid_pre_compute(NODE_MODULE_LOOKUP, format!("node {node} has no module"))
            })?;
        participated.insert(module);
    }
    Ok(json!(participated))
}

fn post_process(
    raw_values: &[RawMetric],
    pre_compute: &PreComputation,
) -> Result<EvaluatedMetrics, MetricError> {
    let total = pre_compute_value(pre_compute, GRAPH_MODULES)?
        .as_array()
        .map(Vec::len)
        .ok_or_else(|| invalid_pre_compute(GRAPH_MODULES, "expected an array of modules"))?;

    let ratios = raw_values
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let participated = raw.as_array().ok_or_else(|| MetricError::RawValue {
                index,
                reason: format!("expected a list of module indices, got {raw}"),
            })?;
            if total == 0 {
                return Ok(NO_MODULES);
            }
            Ok(participated.len() as f64 / total as f64)
        })
        .collect::<Result<Vec<_>, MetricError>>()?;
    Ok(EvaluatedMetrics::from([(PARTICIPATION_RATIO.to_string(), ratios)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphLoader;

    fn bridged_triangles() -> GraphInstance {
        GraphLoader::from_edge_list_str("bridge", "1 2\n2 3\n3 1\n3 4\n4 5\n5 6\n6 4\n")
            .expect("graph")
    }

    #[test]
    fn participation_lists_touched_modules() {
        let graph = bridged_triangles();
        let metric = metric();
        let pre = metric.pre_compute(&graph).expect("pre-compute");
        assert_eq!(pre[GRAPH_MODULES], json!([[1, 2, 3], [4, 5, 6]]));

        let inside = metric.calculate(&graph, &[1, 2, 3], &pre).expect("raw");
        let across = metric.calculate(&graph, &[5, 4, 3], &pre).expect("raw");
        assert_eq!(inside, json!([0]));
        assert_eq!(across, json!([0, 1]));

        let evaluated = metric.post_process(&[inside, across], &pre).expect("evaluated");
        assert_eq!(evaluated[PARTICIPATION_RATIO], vec![0.5, 1.0]);
    }

    #[test]
    fn no_modules_give_sentinel() {
        let mut pre = PreComputation::new();
        pre.insert(GRAPH_MODULES.to_string(), json!([]));
        pre.insert(NODE_MODULE_LOOKUP.to_string(), json!({}));
        let evaluated = post_process(&[json!([])], &pre).expect("evaluated");
        assert_eq!(evaluated[PARTICIPATION_RATIO], vec![NO_MODULES]);
    }

    #[test]
    fn unknown_node_is_a_metric_error() {
        let graph = bridged_triangles();
        let metric = metric();
        let pre = metric.pre_compute(&graph).expect("pre-compute");
        let err = metric.calculate(&graph, &[1, 99], &pre).expect_err("unknown");
        assert!(matches!(err, MetricError::PreCompute { .. }));
    }
}
