#![forbid(unsafe_code)]

use super::super::render::{cascade_json, objective_json, outcome_json, output_json};
use crate::*;
use lf_core::ids::{FrameworkId, ObjectiveId, OutcomeId, OutputId};
use lf_storage::{
    CreateObjectiveRequest, CreateOutcomeRequest, CreateOutputRequest, UpdateObjectiveRequest,
    UpdateOutcomeRequest, UpdateOutputRequest,
};
use serde_json::{Value, json};

impl LogframeServer {
    pub(crate) fn tool_objective_create(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let framework_id = require_id(args, "framework_id", FrameworkId::try_new)?;
        let name = require_string(args, "name")?;
        let objective = self
            .store
            .create_objective(CreateObjectiveRequest { framework_id, name })
            .map_err(store_error)?;
        Ok(ai_ok(
            "objective_create",
            json!({ "objective": objective_json(&objective) }),
        ))
    }

    /// Omitted fields keep their stored values; `framework_id` moves the objective.
    pub(crate) fn tool_objective_update(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let objective_id = require_id(args, "objective_id", ObjectiveId::try_new)?;
        let framework_id = optional_id(args, "framework_id", FrameworkId::try_new)?;
        let name = optional_string(args, "name")?;
        let objective = self
            .store
            .update_objective(UpdateObjectiveRequest {
                objective_id,
                framework_id,
                name,
            })
            .map_err(store_error)?;
        Ok(ai_ok(
            "objective_update",
            json!({ "objective": objective_json(&objective) }),
        ))
    }

    pub(crate) fn tool_objective_delete(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let objective_id = require_id(args, "objective_id", ObjectiveId::try_new)?;
        let summary = self
            .store
            .delete_objective(objective_id)
            .map_err(store_error)?;
        Ok(ai_ok(
            "objective_delete",
            json!({ "objective_id": objective_id.get(), "removed": cascade_json(&summary) }),
        ))
    }

    pub(crate) fn tool_objective_get(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let objective_id = require_id(args, "objective_id", ObjectiveId::try_new)?;
        let objective = self
            .store
            .get_objective(objective_id)
            .map_err(store_error)?;
        Ok(ai_ok(
            "objective_get",
            json!({ "objective": objective_json(&objective) }),
        ))
    }

    pub(crate) fn tool_objective_list(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let framework_id = require_id(args, "framework_id", FrameworkId::try_new)?;
        let objectives = self
            .store
            .list_objectives(framework_id)
            .map_err(store_error)?;
        Ok(ai_ok(
            "objective_list",
            json!({
                "framework_id": framework_id.get(),
                "objectives": objectives.iter().map(objective_json).collect::<Vec<_>>()
            }),
        ))
    }

    pub(crate) fn tool_outcome_create(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let objective_id = require_id(args, "objective_id", ObjectiveId::try_new)?;
        let name = require_string(args, "name")?;
        let code = require_string(args, "code")?;
        let outcome = self
            .store
            .create_outcome(CreateOutcomeRequest {
                objective_id,
                name,
                code,
            })
            .map_err(store_error)?;
        Ok(ai_ok(
            "outcome_create",
            json!({ "outcome": outcome_json(&outcome) }),
        ))
    }

    pub(crate) fn tool_outcome_update(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let outcome_id = require_id(args, "outcome_id", OutcomeId::try_new)?;
        let objective_id = optional_id(args, "objective_id", ObjectiveId::try_new)?;
        let name = optional_string(args, "name")?;
        let code = optional_string(args, "code")?;
        let outcome = self
            .store
            .update_outcome(UpdateOutcomeRequest {
                outcome_id,
                objective_id,
                name,
                code,
            })
            .map_err(store_error)?;
        Ok(ai_ok(
            "outcome_update",
            json!({ "outcome": outcome_json(&outcome) }),
        ))
    }

    pub(crate) fn tool_outcome_delete(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let outcome_id = require_id(args, "outcome_id", OutcomeId::try_new)?;
        let summary = self
            .store
            .delete_outcome(outcome_id)
            .map_err(store_error)?;
        Ok(ai_ok(
            "outcome_delete",
            json!({ "outcome_id": outcome_id.get(), "removed": cascade_json(&summary) }),
        ))
    }

    pub(crate) fn tool_outcome_get(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let outcome_id = require_id(args, "outcome_id", OutcomeId::try_new)?;
        let outcome = self.store.get_outcome(outcome_id).map_err(store_error)?;
        Ok(ai_ok(
            "outcome_get",
            json!({ "outcome": outcome_json(&outcome) }),
        ))
    }

    pub(crate) fn tool_outcome_list(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let objective_id = require_id(args, "objective_id", ObjectiveId::try_new)?;
        let outcomes = self
            .store
            .list_outcomes(objective_id)
            .map_err(store_error)?;
        Ok(ai_ok(
            "outcome_list",
            json!({
                "objective_id": objective_id.get(),
                "outcomes": outcomes.iter().map(outcome_json).collect::<Vec<_>>()
            }),
        ))
    }

    pub(crate) fn tool_output_create(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let outcome_id = require_id(args, "outcome_id", OutcomeId::try_new)?;
        let name = require_string(args, "name")?;
        let code = require_string(args, "code")?;
        let output = self
            .store
            .create_output(CreateOutputRequest {
                outcome_id,
                name,
                code,
            })
            .map_err(store_error)?;
        Ok(ai_ok(
            "output_create",
            json!({ "output": output_json(&output) }),
        ))
    }

    pub(crate) fn tool_output_update(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let output_id = require_id(args, "output_id", OutputId::try_new)?;
        let outcome_id = optional_id(args, "outcome_id", OutcomeId::try_new)?;
        let name = optional_string(args, "name")?;
        let code = optional_string(args, "code")?;
        let output = self
            .store
            .update_output(UpdateOutputRequest {
                output_id,
                outcome_id,
                name,
                code,
            })
            .map_err(store_error)?;
        Ok(ai_ok(
            "output_update",
            json!({ "output": output_json(&output) }),
        ))
    }

    pub(crate) fn tool_output_delete(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let output_id = require_id(args, "output_id", OutputId::try_new)?;
        let summary = self.store.delete_output(output_id).map_err(store_error)?;
        Ok(ai_ok(
            "output_delete",
            json!({ "output_id": output_id.get(), "removed": cascade_json(&summary) }),
        ))
    }

    pub(crate) fn tool_output_get(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let output_id = require_id(args, "output_id", OutputId::try_new)?;
        let output = self.store.get_output(output_id).map_err(store_error)?;
        Ok(ai_ok(
            "output_get",
            json!({ "output": output_json(&output) }),
        ))
    }

    pub(crate) fn tool_output_list(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let outcome_id = require_id(args, "outcome_id", OutcomeId::try_new)?;
        let outputs = self.store.list_outputs(outcome_id).map_err(store_error)?;
        Ok(ai_ok(
            "output_list",
            json!({
                "outcome_id": outcome_id.get(),
                "outputs": outputs.iter().map(output_json).collect::<Vec<_>>()
            }),
        ))
    }
}
