#![forbid(unsafe_code)]

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityIdError {
    NotPositive { kind: &'static str, value: i64 },
}

impl EntityIdError {
    pub fn message(&self) -> String {
        match self {
            Self::NotPositive { kind, value } => {
                format!("{kind} must be a positive integer (got {value})")
            }
        }
    }
}

macro_rules! define_entity_id {
    ($($name:ident => $kind:literal),* $(,)?) => {
        $(
            #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
            pub struct $name(i64);

            impl $name {
                pub const KIND: &'static str = $kind;

                pub fn try_new(value: i64) -> Result<Self, EntityIdError> {
                    if value <= 0 {
                        return Err(EntityIdError::NotPositive { kind: $kind, value });
                    }
                    Ok(Self(value))
                }

                pub fn get(self) -> i64 {
                    self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

define_entity_id! {
    FrameworkId => "framework_id",
    ObjectiveId => "objective_id",
    OutcomeId => "outcome_id",
    OutputId => "output_id",
    IndicatorId => "indicator_id",
    ActivityId => "activity_id",
    BeneficiaryId => "beneficiary_id",
}
