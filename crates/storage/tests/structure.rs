#![forbid(unsafe_code)]

use lf_core::ids::{ActivityId, BeneficiaryId, FrameworkId, IndicatorId};
use lf_core::period::Period;
use lf_storage::{
    BatchLinkRequest, CreateFrameworkRequest, CreateIndicatorRequest, CreateObjectiveRequest,
    CreateOutcomeRequest, CreateOutputRequest, EnrollmentRequest, RegisterActivityRequest,
    RegisterBeneficiaryRequest, SqliteStore, StoreError,
};
use std::collections::{BTreeMap, BTreeSet};

const ACTIVITIES: usize = 5;
const BENEFICIARIES: usize = 10;

/// Beneficiaries enrolled in activity `k`: {2k, 2k+1, 2k+2 mod 10}.
fn enrolled(k: usize) -> [usize; 3] {
    [2 * k, 2 * k + 1, (2 * k + 2) % BENEFICIARIES]
}

/// Activities linked to the `j`-th indicator.
fn linked(j: usize) -> [usize; 2] {
    [j % ACTIVITIES, (j + 2) % ACTIVITIES]
}

struct Tree {
    store: SqliteStore,
    framework_id: FrameworkId,
    indicators: Vec<IndicatorId>,
    activities: Vec<ActivityId>,
    beneficiaries: Vec<BeneficiaryId>,
}

fn build(outcomes: usize, outputs_per_outcome: usize, indicators_per_output: usize) -> Tree {
    let mut store = SqliteStore::open_in_memory().expect("open store");
    let framework_id = store
        .create_framework(CreateFrameworkRequest {
            name: "Country plan".to_string(),
            period: Period::parse("2024-01-01", "2026-12-31").expect("period"),
        })
        .expect("create framework")
        .id;
    let objective_id = store
        .create_objective(CreateObjectiveRequest {
            framework_id,
            name: "Food security".to_string(),
        })
        .expect("create objective")
        .id;

    let beneficiaries = (0..BENEFICIARIES)
        .map(|n| {
            store
                .register_beneficiary(RegisterBeneficiaryRequest {
                    name: format!("Person {n}"),
                })
                .expect("register beneficiary")
                .id
        })
        .collect::<Vec<_>>();
    let activities = (0..ACTIVITIES)
        .map(|k| {
            let activity_id = store
                .register_activity(RegisterActivityRequest {
                    name: format!("Session {k}"),
                })
                .expect("register activity")
                .id;
            for b in enrolled(k) {
                store
                    .enroll_beneficiary(EnrollmentRequest {
                        activity_id,
                        beneficiary_id: beneficiaries[b],
                    })
                    .expect("enroll");
            }
            activity_id
        })
        .collect::<Vec<_>>();

    let mut indicators = Vec::new();
    for o in 0..outcomes {
        let outcome_id = store
            .create_outcome(CreateOutcomeRequest {
                objective_id,
                name: format!("Outcome {o}"),
                code: format!("OC{o}"),
            })
            .expect("create outcome")
            .id;
        for p in 0..outputs_per_outcome {
            let output_id = store
                .create_output(CreateOutputRequest {
                    outcome_id,
                    name: format!("Output {o}.{p}"),
                    code: format!("OP{o}.{p}"),
                })
                .expect("create output")
                .id;
            for i in 0..indicators_per_output {
                let indicator_id = store
                    .create_indicator(CreateIndicatorRequest {
                        name: format!("Indicator {o}.{p}.{i}"),
                        code: format!("IN{o}.{p}.{i}"),
                        target_value: 4,
                        outcome_id: None,
                        output_id: Some(output_id),
                    })
                    .expect("create indicator")
                    .id;
                let j = indicators.len();
                store
                    .batch_link_activities_to_indicator(BatchLinkRequest {
                        indicator_id,
                        activity_ids: linked(j).iter().map(|k| activities[*k]).collect(),
                    })
                    .expect("batch link");
                indicators.push(indicator_id);
            }
        }
    }

    Tree {
        store,
        framework_id,
        indicators,
        activities,
        beneficiaries,
    }
}

fn manual_union(tree: &Tree, positions: impl IntoIterator<Item = usize>) -> u64 {
    let mut reached = BTreeSet::new();
    for j in positions {
        for k in linked(j) {
            reached.extend(enrolled(k).iter().map(|b| tree.beneficiaries[*b]));
        }
    }
    reached.len() as u64
}

#[test]
fn structure_matches_manual_unions() {
    let tree = build(3, 2, 2);
    assert_eq!(tree.indicators.len(), 12);
    assert_eq!(tree.activities.len(), ACTIVITIES);

    let structure = tree.store.get_structure(tree.framework_id).expect("structure");
    assert_eq!(structure.framework.id, tree.framework_id);
    assert_eq!(structure.objectives.len(), 1);
    assert_eq!(structure.objectives[0].outcomes.len(), 3);

    let position = tree
        .indicators
        .iter()
        .enumerate()
        .map(|(j, id)| (*id, j))
        .collect::<BTreeMap<_, _>>();

    let mut seen = 0;
    for (o, outcome) in structure.objectives[0].outcomes.iter().enumerate() {
        assert_eq!(outcome.outputs.len(), 2);
        assert!(outcome.indicators.is_empty());
        assert_eq!(
            outcome.reached_beneficiaries,
            manual_union(&tree, o * 4..o * 4 + 4)
        );
        for output in &outcome.outputs {
            assert_eq!(output.indicators.len(), 2);
            let positions = output
                .indicators
                .iter()
                .map(|node| position[&node.indicator.id])
                .collect::<Vec<_>>();
            assert_eq!(
                output.reached_beneficiaries,
                manual_union(&tree, positions.iter().copied())
            );
            for node in &output.indicators {
                let j = position[&node.indicator.id];
                assert_eq!(node.actual_value, manual_union(&tree, [j]));
                assert_eq!(node.target_value(), 4);
                seen += 1;
            }
        }
    }
    assert_eq!(seen, 12);
    assert_eq!(
        structure.reached_beneficiaries,
        manual_union(&tree, 0..tree.indicators.len())
    );
    assert_eq!(structure.indicators().count(), 12);
}

#[test]
fn structure_statement_count_does_not_grow_with_the_tree() {
    let small = build(1, 1, 1);
    small.store.reset_statement_count();
    small
        .store
        .get_structure(small.framework_id)
        .expect("small structure");
    let small_count = small.store.statements_issued();

    let large = build(3, 2, 2);
    large.store.reset_statement_count();
    large
        .store
        .get_structure(large.framework_id)
        .expect("large structure");
    let large_count = large.store.statements_issued();

    assert_eq!(small_count, large_count);
    assert_eq!(large_count, 7);
}

#[test]
fn outcome_level_indicators_render_under_the_outcome() {
    let mut tree = build(1, 1, 1);
    let outcome_id = tree
        .store
        .get_structure(tree.framework_id)
        .expect("structure")
        .objectives[0]
        .outcomes[0]
        .outcome
        .id;
    let direct = tree
        .store
        .create_indicator(CreateIndicatorRequest {
            name: "Direct".to_string(),
            code: "DIRECT".to_string(),
            target_value: 0,
            outcome_id: Some(outcome_id),
            output_id: None,
        })
        .expect("create indicator")
        .id;
    let orphan = tree
        .store
        .create_indicator(CreateIndicatorRequest {
            name: "Orphan".to_string(),
            code: "ORPHAN".to_string(),
            target_value: 1,
            outcome_id: None,
            output_id: None,
        })
        .expect("create indicator")
        .id;
    tree.store
        .batch_link_activities_to_indicator(BatchLinkRequest {
            indicator_id: orphan,
            activity_ids: tree.activities.iter().copied().collect(),
        })
        .expect("link orphan");

    let structure = tree.store.get_structure(tree.framework_id).expect("structure");
    let outcome = &structure.objectives[0].outcomes[0];
    assert_eq!(outcome.indicators.len(), 1);
    assert_eq!(outcome.indicators[0].indicator.id, direct);
    assert_eq!(outcome.indicators[0].actual_value, 0);
    assert_eq!(outcome.indicators[0].achievement_percent(), None);
    assert!(
        structure
            .indicators()
            .all(|node| node.indicator.id != orphan)
    );
    assert_eq!(structure.reached_beneficiaries, manual_union(&tree, [0]));
}

#[test]
fn structure_of_a_missing_framework_is_not_found() {
    let store = SqliteStore::open_in_memory().expect("open store");
    let err = store
        .get_structure(FrameworkId::try_new(3).expect("id"))
        .expect_err("missing framework");
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn empty_framework_has_an_empty_tree() {
    let mut store = SqliteStore::open_in_memory().expect("open store");
    let framework_id = store
        .create_framework(CreateFrameworkRequest {
            name: "Empty".to_string(),
            period: Period::parse("2030-01-01", "2030-12-31").expect("period"),
        })
        .expect("create framework")
        .id;

    let structure = store.get_structure(framework_id).expect("structure");
    assert!(structure.objectives.is_empty());
    assert_eq!(structure.reached_beneficiaries, 0);
}
