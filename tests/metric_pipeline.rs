use anyhow::Result;
use pmotifs::error::MetricError;
use pmotifs::graphlet::decode_occurrences;
use pmotifs::metric::{anchor_distance, external_degree, module_participation};
use pmotifs::pipeline::MetricStage;
use pmotifs::{GraphLoader, MetricPipeline, MetricRegistry};

/// Two triangles joined through node 3-4, with a hub (1) carrying four leaves.
const HUB_GRAPH: &str = "\
1 2
2 3
3 1
3 4
4 5
5 6
6 4
1 7
1 8
1 9
1 10
";

const OCCURRENCES: &str = "\
011101110: 1 2 3
011101110: 4 5 6
001001110: 7 1 2
001001110: 3 4 5
001001110: 8 1 9
";

#[test]
fn every_metric_is_index_aligned_with_the_occurrences() -> Result<()> {
    let graph = GraphLoader::from_edge_list_str("hub", HUB_GRAPH)?;
    let occurrences = decode_occurrences(OCCURRENCES)?;
    let pipeline = MetricPipeline::new(MetricRegistry::with_default_metrics()?, 2);
    let report = pipeline.execute(&graph, &occurrences);

    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.outcomes.len(), 3);
    for outcome in &report.outcomes {
        assert_eq!(outcome.result.graphlet_metrics.len(), occurrences.len());
        for values in outcome.evaluated.values() {
            assert_eq!(values.len(), occurrences.len());
        }
    }

    let evaluated = report.evaluated();
    assert_eq!(evaluated[external_degree::DEGREE], vec![5.0, 1.0, 5.0, 4.0, 4.0]);
    // The hub is node 1: inside occurrences 0, 2 and 4.
    let min_distance = &evaluated[anchor_distance::MIN_DISTANCE];
    assert_eq!(min_distance[0], 0.0);
    assert!(min_distance[1] > 0.0);
    assert_eq!(min_distance[4], 0.0);
    for ratio in &evaluated[module_participation::PARTICIPATION_RATIO] {
        assert!(*ratio > 0.0 && *ratio <= 1.0);
    }
    Ok(())
}

#[test]
fn regular_graph_fails_only_the_anchor_metric() -> Result<()> {
    let cycle = GraphLoader::from_edge_list_str("c6", "1 2\n2 3\n3 4\n4 5\n5 6\n6 1\n")?;
    let occurrences = decode_occurrences("001001110: 1 2 3\n001001110: 4 5 6\n")?;
    let report = MetricPipeline::new(MetricRegistry::with_default_metrics()?, 1)
        .execute(&cycle, &occurrences);

    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.metric_name, anchor_distance::NAME);
    assert_eq!(failure.stage, MetricStage::PreComputation);
    assert!(matches!(failure.error, MetricError::Degenerate(_)));

    let degree = report.outcome(external_degree::NAME).expect("degree completes");
    assert_eq!(degree.evaluated[external_degree::DEGREE], vec![2.0, 2.0]);
    assert!(report.outcome(module_participation::NAME).is_some());
    Ok(())
}
