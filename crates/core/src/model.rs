#![forbid(unsafe_code)]

use crate::ids::{
    ActivityId, BeneficiaryId, FrameworkId, IndicatorId, ObjectiveId, OutcomeId, OutputId,
};
use crate::period::Period;

const MAX_NAME_LEN: usize = 255;
const MAX_CODE_LEN: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Framework {
    pub id: FrameworkId,
    pub name: String,
    pub period: Period,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Objective {
    pub id: ObjectiveId,
    pub framework_id: FrameworkId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub id: OutcomeId,
    pub objective_id: ObjectiveId,
    pub name: String,
    pub code: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Output {
    pub id: OutputId,
    pub outcome_id: OutcomeId,
    pub name: String,
    pub code: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Indicator {
    pub id: IndicatorId,
    pub name: String,
    pub code: String,
    pub target_value: u64,
    pub outcome_id: Option<OutcomeId>,
    pub output_id: Option<OutputId>,
}

impl Indicator {
    /// Orphaned indicators stay individually queryable but never appear in a structure.
    pub fn is_attached(&self) -> bool {
        self.outcome_id.is_some() || self.output_id.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Beneficiary {
    pub id: BeneficiaryId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldError {
    Empty { field: &'static str },
    TooLong { field: &'static str, max: usize },
    ContainsControl { field: &'static str },
    ContainsWhitespace { field: &'static str },
}

impl FieldError {
    pub fn message(&self) -> String {
        match self {
            Self::Empty { field } => format!("{field} must not be empty"),
            Self::TooLong { field, max } => format!("{field} must be at most {max} characters"),
            Self::ContainsControl { field } => format!("{field} contains control characters"),
            Self::ContainsWhitespace { field } => format!("{field} must not contain whitespace"),
        }
    }
}

pub fn normalize_name(field: &'static str, value: &str) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Empty { field });
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(FieldError::TooLong {
            field,
            max: MAX_NAME_LEN,
        });
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(FieldError::ContainsControl { field });
    }
    Ok(trimmed.to_string())
}

pub fn normalize_code(field: &'static str, value: &str) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Empty { field });
    }
    if trimmed.chars().count() > MAX_CODE_LEN {
        return Err(FieldError::TooLong {
            field,
            max: MAX_CODE_LEN,
        });
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(FieldError::ContainsControl { field });
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(FieldError::ContainsWhitespace { field });
    }
    Ok(trimmed.to_string())
}
