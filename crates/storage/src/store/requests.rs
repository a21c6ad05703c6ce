#![forbid(unsafe_code)]

use lf_core::ids::{
    ActivityId, BeneficiaryId, FrameworkId, IndicatorId, ObjectiveId, OutcomeId, OutputId,
};
use lf_core::period::Period;
use std::collections::BTreeSet;
use time::Date;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateFrameworkRequest {
    pub name: String,
    pub period: Period,
}

/// `None` keeps the stored value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateFrameworkRequest {
    pub framework_id: FrameworkId,
    pub name: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateObjectiveRequest {
    pub framework_id: FrameworkId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateObjectiveRequest {
    pub objective_id: ObjectiveId,
    pub framework_id: Option<FrameworkId>,
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateOutcomeRequest {
    pub objective_id: ObjectiveId,
    pub name: String,
    pub code: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateOutcomeRequest {
    pub outcome_id: OutcomeId,
    pub objective_id: Option<ObjectiveId>,
    pub name: Option<String>,
    pub code: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateOutputRequest {
    pub outcome_id: OutcomeId,
    pub name: String,
    pub code: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateOutputRequest {
    pub output_id: OutputId,
    pub outcome_id: Option<OutcomeId>,
    pub name: Option<String>,
    pub code: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateIndicatorRequest {
    pub name: String,
    pub code: String,
    pub target_value: u64,
    pub outcome_id: Option<OutcomeId>,
    pub output_id: Option<OutputId>,
}

/// Outer `None` keeps the stored value. For the parents, `Some(None)`
/// detaches the indicator from that level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateIndicatorRequest {
    pub indicator_id: IndicatorId,
    pub name: Option<String>,
    pub code: Option<String>,
    pub target_value: Option<u64>,
    pub outcome_id: Option<Option<OutcomeId>>,
    pub output_id: Option<Option<OutputId>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchLinkRequest {
    pub indicator_id: IndicatorId,
    pub activity_ids: BTreeSet<ActivityId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterActivityRequest {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterBeneficiaryRequest {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnrollmentRequest {
    pub activity_id: ActivityId,
    pub beneficiary_id: BeneficiaryId,
}
