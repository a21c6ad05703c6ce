#![forbid(unsafe_code)]

use lf_core::ids::{ActivityId, BeneficiaryId, FrameworkId, IndicatorId, OutcomeId};
use lf_core::period::Period;
use lf_storage::{
    BatchLinkRequest, CreateFrameworkRequest, CreateIndicatorRequest, CreateObjectiveRequest,
    CreateOutcomeRequest, EnrollmentRequest, RegisterActivityRequest, RegisterBeneficiaryRequest,
    SqliteStore, StoreError,
};

struct Fixture {
    store: SqliteStore,
    framework_id: FrameworkId,
    outcome_id: OutcomeId,
}

impl Fixture {
    fn new() -> Self {
        let mut store = SqliteStore::open_in_memory().expect("open store");
        let framework = store
            .create_framework(CreateFrameworkRequest {
                name: "Plan".to_string(),
                period: Period::parse("2024-01-01", "2024-12-31").expect("period"),
            })
            .expect("create framework");
        let objective = store
            .create_objective(CreateObjectiveRequest {
                framework_id: framework.id,
                name: "Objective".to_string(),
            })
            .expect("create objective");
        let outcome = store
            .create_outcome(CreateOutcomeRequest {
                objective_id: objective.id,
                name: "Outcome".to_string(),
                code: "OC1".to_string(),
            })
            .expect("create outcome");
        Self {
            store,
            framework_id: framework.id,
            outcome_id: outcome.id,
        }
    }

    fn indicator(&mut self, code: &str, outcome_id: Option<OutcomeId>) -> IndicatorId {
        self.store
            .create_indicator(CreateIndicatorRequest {
                name: format!("Indicator {code}"),
                code: code.to_string(),
                target_value: 10,
                outcome_id,
                output_id: None,
            })
            .expect("create indicator")
            .id
    }

    fn beneficiaries(&mut self, count: usize) -> Vec<BeneficiaryId> {
        (0..count)
            .map(|n| {
                self.store
                    .register_beneficiary(RegisterBeneficiaryRequest {
                        name: format!("Beneficiary {n}"),
                    })
                    .expect("register beneficiary")
                    .id
            })
            .collect()
    }

    fn activity_with(&mut self, beneficiaries: &[BeneficiaryId]) -> ActivityId {
        let activity = self
            .store
            .register_activity(RegisterActivityRequest {
                name: "Activity".to_string(),
            })
            .expect("register activity");
        for beneficiary_id in beneficiaries {
            self.store
                .enroll_beneficiary(EnrollmentRequest {
                    activity_id: activity.id,
                    beneficiary_id: *beneficiary_id,
                })
                .expect("enroll");
        }
        activity.id
    }

    fn link(&mut self, indicator_id: IndicatorId, activity_ids: &[ActivityId]) {
        self.store
            .batch_link_activities_to_indicator(BatchLinkRequest {
                indicator_id,
                activity_ids: activity_ids.iter().copied().collect(),
            })
            .expect("batch link");
    }
}

#[test]
fn overlapping_activities_count_beneficiaries_once() {
    let mut fx = Fixture::new();
    let b = fx.beneficiaries(4);
    let a1 = fx.activity_with(&[b[0], b[1], b[2]]);
    let a2 = fx.activity_with(&[b[2], b[3]]);
    let x = fx.indicator("X", Some(fx.outcome_id));
    fx.link(x, &[a1, a2]);

    assert_eq!(fx.store.indicator_actual_value(x).expect("actual value"), 4);
    assert_eq!(
        fx.store
            .framework_actual_values(fx.framework_id)
            .expect("framework values")
            .get(&x),
        Some(&4)
    );
}

#[test]
fn indicator_without_links_is_zero() {
    let mut fx = Fixture::new();
    let idle = fx.indicator("IDLE", Some(fx.outcome_id));

    assert_eq!(fx.store.indicator_actual_value(idle).expect("actual"), 0);
    let values = fx
        .store
        .framework_actual_values(fx.framework_id)
        .expect("framework values");
    assert_eq!(values.get(&idle), Some(&0));
}

#[test]
fn missing_targets_are_not_found_rather_than_zero() {
    let fx = Fixture::new();

    assert!(matches!(
        fx.store
            .indicator_actual_value(IndicatorId::try_new(31).expect("id")),
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        fx.store
            .framework_actual_values(FrameworkId::try_new(31).expect("id")),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn orphaned_indicator_aggregates_alone_but_not_in_framework() {
    let mut fx = Fixture::new();
    let b = fx.beneficiaries(2);
    let activity = fx.activity_with(&b);
    let orphan = fx.indicator("ORPHAN", None);
    fx.link(orphan, &[activity]);

    assert_eq!(fx.store.indicator_actual_value(orphan).expect("actual"), 2);
    let values = fx
        .store
        .framework_actual_values(fx.framework_id)
        .expect("framework values");
    assert!(!values.contains_key(&orphan));
}

#[test]
fn framework_values_use_a_fixed_number_of_statements() {
    let mut fx = Fixture::new();
    let b = fx.beneficiaries(6);
    let a1 = fx.activity_with(&b[..3]);
    let a2 = fx.activity_with(&b[2..]);

    let first = fx.indicator("I1", Some(fx.outcome_id));
    fx.link(first, &[a1]);
    fx.store.reset_statement_count();
    fx.store
        .framework_actual_values(fx.framework_id)
        .expect("framework values");
    let with_one = fx.store.statements_issued();

    for n in 0..20 {
        let indicator_id = fx.indicator(&format!("I{}", n + 2), Some(fx.outcome_id));
        fx.link(indicator_id, &[a1, a2]);
    }
    fx.store.reset_statement_count();
    let values = fx
        .store
        .framework_actual_values(fx.framework_id)
        .expect("framework values");
    let with_many = fx.store.statements_issued();

    assert_eq!(values.len(), 21);
    assert_eq!(values.get(&first), Some(&3));
    assert!(values.values().filter(|value| **value == 6).count() == 20);
    assert_eq!(with_one, with_many);
    assert_eq!(with_many, 4);
}
