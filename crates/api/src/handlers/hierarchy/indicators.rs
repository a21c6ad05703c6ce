#![forbid(unsafe_code)]

use super::super::render::{indicator_json, structure_json};
use crate::*;
use lf_core::ids::{FrameworkId, IndicatorId, OutcomeId, OutputId};
use lf_core::model::Indicator;
use lf_core::structure::achievement_percent;
use lf_storage::{CreateIndicatorRequest, UpdateIndicatorRequest};
use serde_json::{Value, json};

fn orphan_warning(indicator: &Indicator) -> Vec<Value> {
    if indicator.is_attached() {
        return Vec::new();
    }
    vec![warning(
        "ORPHANED_INDICATOR",
        "indicator has no outcome or output and stays out of every framework",
    )]
}

impl LogframeServer {
    pub(crate) fn tool_indicator_create(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let name = require_string(args, "name")?;
        let code = require_string(args, "code")?;
        let target_value = require_u64(args, "target_value")?;
        let outcome_id = optional_id(args, "outcome_id", OutcomeId::try_new)?;
        let output_id = optional_id(args, "output_id", OutputId::try_new)?;

        let indicator = self
            .store
            .create_indicator(CreateIndicatorRequest {
                name,
                code,
                target_value,
                outcome_id,
                output_id,
            })
            .map_err(store_error)?;

        Ok(ai_ok_with_warnings(
            "indicator_create",
            json!({ "indicator": indicator_json(&indicator) }),
            orphan_warning(&indicator),
        ))
    }

    /// `outcome_id` / `output_id`: absent keeps, `null` detaches.
    pub(crate) fn tool_indicator_update(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let indicator_id = require_id(args, "indicator_id", IndicatorId::try_new)?;
        let name = optional_string(args, "name")?;
        let code = optional_string(args, "code")?;
        let target_value = optional_u64(args, "target_value")?;
        let outcome_id = patch_id(args, "outcome_id", OutcomeId::try_new)?;
        let output_id = patch_id(args, "output_id", OutputId::try_new)?;
        let indicator = self
            .store
            .update_indicator(UpdateIndicatorRequest {
                indicator_id,
                name,
                code,
                target_value,
                outcome_id,
                output_id,
            })
            .map_err(store_error)?;
        Ok(ai_ok_with_warnings(
            "indicator_update",
            json!({ "indicator": indicator_json(&indicator) }),
            orphan_warning(&indicator),
        ))
    }

    pub(crate) fn tool_indicator_delete(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let indicator_id = require_id(args, "indicator_id", IndicatorId::try_new)?;
        let removed_links = self
            .store
            .delete_indicator(indicator_id)
            .map_err(store_error)?;
        Ok(ai_ok(
            "indicator_delete",
            json!({ "indicator_id": indicator_id.get(), "removed_links": removed_links }),
        ))
    }

    pub(crate) fn tool_indicator_get(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let indicator_id = require_id(args, "indicator_id", IndicatorId::try_new)?;
        let indicator = self
            .store
            .get_indicator(indicator_id)
            .map_err(store_error)?;
        Ok(ai_ok(
            "indicator_get",
            json!({ "indicator": indicator_json(&indicator) }),
        ))
    }

    /// Exactly one of `outcome_id`, `output_id` or `orphans: true`.
    pub(crate) fn tool_indicator_list(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let outcome_id = optional_id(args, "outcome_id", OutcomeId::try_new)?;
        let output_id = optional_id(args, "output_id", OutputId::try_new)?;
        let orphans = match args.get("orphans") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(v)) => *v,
            Some(_) => return Err(ai_error("VALIDATION_ERROR", "orphans must be a boolean")),
        };

        let indicators = match (outcome_id, output_id, orphans) {
            (Some(outcome_id), None, false) => self.store.list_indicators_for_outcome(outcome_id),
            (None, Some(output_id), false) => self.store.list_indicators_for_output(output_id),
            (None, None, true) => self.store.list_orphan_indicators(),
            _ => {
                return Err(ai_error(
                    "VALIDATION_ERROR",
                    "provide exactly one of outcome_id, output_id or orphans=true",
                ));
            }
        }
        .map_err(store_error)?;
        Ok(ai_ok(
            "indicator_list",
            json!({ "indicators": indicators.iter().map(indicator_json).collect::<Vec<_>>() }),
        ))
    }

    pub(crate) fn tool_indicator_actual(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let indicator_id = require_id(args, "indicator_id", IndicatorId::try_new)?;
        let indicator = self
            .store
            .get_indicator(indicator_id)
            .map_err(store_error)?;
        let actual_value = self
            .store
            .indicator_actual_value(indicator_id)
            .map_err(store_error)?;
        Ok(ai_ok(
            "indicator_actual",
            json!({
                "indicator_id": indicator_id.get(),
                "target_value": indicator.target_value,
                "actual_value": actual_value,
                "achievement_percent": achievement_percent(actual_value, indicator.target_value)
            }),
        ))
    }

    pub(crate) fn tool_framework_actuals(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let framework_id = require_id(args, "framework_id", FrameworkId::try_new)?;
        let values = self
            .store
            .framework_actual_values(framework_id)
            .map_err(store_error)?;
        Ok(ai_ok(
            "framework_actuals",
            json!({
                "framework_id": framework_id.get(),
                "indicators": values
                    .iter()
                    .map(|(id, actual)| json!({ "indicator_id": id.get(), "actual_value": actual }))
                    .collect::<Vec<_>>()
            }),
        ))
    }

    pub(crate) fn tool_structure_get(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let framework_id = require_id(args, "framework_id", FrameworkId::try_new)?;
        let structure = self
            .store
            .get_structure(framework_id)
            .map_err(store_error)?;
        Ok(ai_ok("structure_get", structure_json(&structure)))
    }
}
