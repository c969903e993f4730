use indexmap::IndexMap;
use pmotifs::significance::{
    ensemble_frequencies, frequency_significance, mann_whitney_u, z_score, UNDEFINED_Z_SCORE,
};
use pmotifs::GraphletClass;

#[test]
fn z_score_fixtures() {
    assert_eq!(z_score(10.0, &[5.0, 5.0, 5.0, 5.0]), UNDEFINED_Z_SCORE);
    let std = (20.0f64 / 3.0).sqrt();
    assert!((z_score(10.0, &[2.0, 4.0, 6.0, 8.0]) - 5.0 / std).abs() < 1e-12);
}

#[test]
fn sparse_class_is_padded_to_ensemble_size() {
    let triangle = GraphletClass::parse("011 101 110").expect("triangle");
    let dash = GraphletClass::parse("011 100 100").expect("dash");

    let mut ensemble: Vec<IndexMap<GraphletClass, u64>> = (0..10)
        .map(|_| IndexMap::from([(dash.clone(), 3)]))
        .collect();
    for (member, count) in [(2, 2), (5, 5), (9, 1)] {
        ensemble[member].insert(triangle.clone(), count);
    }

    let frequencies = ensemble_frequencies(&triangle, &ensemble);
    assert_eq!(frequencies.len(), 10);
    assert_eq!(frequencies.iter().filter(|&&count| count == 0).count(), 7);
    assert_eq!(frequencies[2], 2);
    assert_eq!(frequencies[5], 5);
    assert_eq!(frequencies[9], 1);

    let original = IndexMap::from([(triangle.clone(), 12), (dash.clone(), 3)]);
    let results = frequency_significance(&original, &ensemble);
    assert!(results[0].z_score > 3.0);
    assert_eq!(results[1].z_score, UNDEFINED_Z_SCORE);
}

#[test]
fn mann_whitney_detects_shifted_samples() {
    let low: Vec<f64> = (0..30).map(f64::from).collect();
    let high: Vec<f64> = (25..55).map(f64::from).collect();
    let shifted = mann_whitney_u(&low, &high).expect("testable");
    assert!(shifted.p_value < 0.001);

    let same = mann_whitney_u(&low, &low).expect("testable");
    assert!(same.p_value > 0.9);
}
