//! Integration test: run the nine-point reference chain through both
//! strategies, the staged pipeline, and an interactive session.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use polychain_pipeline::{
    AdmissibilityKind, ChainState, Pipeline, Point, ShortestPath, SimplifyConfig, SimplifyError,
    SimplifyResult,
};

fn reference_chain() -> Vec<Point> {
    [
        (30.0, 70.0),
        (20.0, 55.0),
        (19.0, 37.0),
        (25.0, 41.0),
        (40.0, 45.0),
        (50.0, 41.0),
        (60.0, 45.0),
        (80.0, 40.0),
        (70.0, 80.0),
    ]
    .iter()
    .map(|&(x, y)| Point::new(x, y))
    .collect()
}

fn config(epsilon: f64, strategy: AdmissibilityKind) -> SimplifyConfig {
    SimplifyConfig {
        epsilon,
        strategy,
        ..SimplifyConfig::default()
    }
}

fn admitted_pairs(result: &SimplifyResult) -> Vec<(usize, usize)> {
    result
        .admissible_edges
        .iter()
        .map(|e| (e.source, e.target))
        .collect()
}

const REFERENCE_ADMITTED: [(usize, usize); 13] = [
    (0, 2),
    (0, 3),
    (1, 3),
    (2, 4),
    (2, 5),
    (2, 6),
    (2, 7),
    (3, 5),
    (3, 6),
    (3, 7),
    (4, 6),
    (4, 7),
    (5, 7),
];

#[test]
fn iri_imai_reference_scenario() {
    let result = polychain_pipeline::simplify(
        &reference_chain(),
        &config(10.0, AdmissibilityKind::IriImai),
    )
    .expect("simplification should succeed");

    assert_eq!(admitted_pairs(&result), REFERENCE_ADMITTED.to_vec());
    assert_eq!(result.path, ShortestPath::Found(vec![0, 2, 7, 8]));
    assert_eq!(
        result.simplified.points(),
        &[
            Point::new(30.0, 70.0),
            Point::new(19.0, 37.0),
            Point::new(80.0, 40.0),
            Point::new(70.0, 80.0),
        ]
    );
}

#[test]
fn cone_method_agrees_at_reference_epsilon() {
    let iri_imai = polychain_pipeline::simplify(
        &reference_chain(),
        &config(10.0, AdmissibilityKind::IriImai),
    )
    .unwrap();
    let cone =
        polychain_pipeline::simplify(&reference_chain(), &config(10.0, AdmissibilityKind::Cone))
            .unwrap();

    assert_eq!(admitted_pairs(&cone), admitted_pairs(&iri_imai));
    assert_eq!(cone.indices(), iri_imai.indices());
}

#[test]
fn cone_method_at_smaller_epsilon() {
    let result =
        polychain_pipeline::simplify(&reference_chain(), &config(5.0, AdmissibilityKind::Cone))
            .unwrap();
    assert_eq!(
        admitted_pairs(&result),
        vec![
            (0, 2),
            (2, 4),
            (3, 5),
            (3, 6),
            (3, 7),
            (4, 6),
            (4, 7),
            (5, 7)
        ]
    );
    assert_eq!(result.indices(), &[0, 2, 3, 7, 8]);
}

#[test]
fn zero_epsilon_keeps_the_full_chain() {
    for strategy in [AdmissibilityKind::IriImai, AdmissibilityKind::Cone] {
        let result =
            polychain_pipeline::simplify(&reference_chain(), &config(0.0, strategy)).unwrap();
        assert!(result.admissible_edges.is_empty());
        assert_eq!(result.indices(), &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
    }
}

#[test]
fn staged_pipeline_matches_one_shot() {
    let points = reference_chain();
    let cfg = config(10.0, AdmissibilityKind::Cone);

    let tested = Pipeline::new(points.clone(), cfg)
        .build_dag()
        .unwrap()
        .test_admissibility()
        .unwrap();
    assert_eq!(tested.report().admitted, 13);
    assert_eq!(tested.report().rejected, 15);
    let staged = tested.extract_path().unwrap().into_result();

    assert_eq!(staged, polychain_pipeline::simplify(&points, &cfg).unwrap());
}

#[test]
fn interactive_session() {
    let cfg = config(10.0, AdmissibilityKind::IriImai);
    let mut chain = ChainState::new(&cfg).unwrap();
    for p in reference_chain() {
        chain.push_point(p).unwrap();
    }
    assert_eq!(chain.len(), 9);
    assert_eq!(chain.dag().edge_count(), 36);
    assert_eq!(
        chain.compute_shortest_path().unwrap(),
        ShortestPath::Found(vec![0, 2, 7, 8])
    );

    // Tightening the tolerance falls back to the original chain.
    chain.set_epsilon(0.0).unwrap();
    assert_eq!(chain.compute_shortest_path().unwrap().edge_count(), 8);

    // Restoring it brings the shortcuts back.
    chain.set_epsilon(10.0).unwrap();
    assert_eq!(chain.compute_shortest_path().unwrap().edge_count(), 3);

    chain.set_strip(2, 7, true).unwrap();
    assert!(chain.edge(2, 7).unwrap().strip);
    let strip = chain.strip_for(2, 7).unwrap();
    assert!(strip.contains(Point::new(50.0, 41.0)));

    assert!(matches!(
        chain.set_strip(7, 2, true),
        Err(SimplifyError::EdgeNotFound { from: 7, to: 2 })
    ));

    chain.reset();
    assert!(chain.is_empty());
    assert_eq!(chain.dag().edge_count(), 0);
}

#[test]
fn result_crosses_a_json_boundary() {
    let outcome: Result<SimplifyResult, SimplifyError> = polychain_pipeline::simplify(
        &reference_chain(),
        &config(10.0, AdmissibilityKind::Cone),
    );
    let json = serde_json::to_string(&outcome).unwrap();
    let back: Result<SimplifyResult, SimplifyError> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, outcome);

    let failure: Result<SimplifyResult, SimplifyError> =
        polychain_pipeline::simplify(&reference_chain(), &config(-1.0, AdmissibilityKind::Cone));
    let json = serde_json::to_string(&failure).unwrap();
    let back: Result<SimplifyResult, SimplifyError> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, failure);
}
