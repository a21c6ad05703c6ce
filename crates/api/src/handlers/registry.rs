#![forbid(unsafe_code)]

use super::render::{activity_json, beneficiary_json};
use crate::*;
use lf_core::ids::{ActivityId, BeneficiaryId};
use lf_storage::{EnrollmentRequest, RegisterActivityRequest, RegisterBeneficiaryRequest};
use serde_json::{Map, Value, json};

fn enrollment(args: &Map<String, Value>) -> Result<EnrollmentRequest, Value> {
    Ok(EnrollmentRequest {
        activity_id: require_id(args, "activity_id", ActivityId::try_new)?,
        beneficiary_id: require_id(args, "beneficiary_id", BeneficiaryId::try_new)?,
    })
}

impl LogframeServer {
    pub(crate) fn tool_activity_register(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let name = require_string(args, "name")?;
        let activity = self
            .store
            .register_activity(RegisterActivityRequest { name })
            .map_err(store_error)?;
        Ok(ai_ok(
            "activity_register",
            json!({ "activity": activity_json(&activity) }),
        ))
    }

    pub(crate) fn tool_activity_delete(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let activity_id = require_id(args, "activity_id", ActivityId::try_new)?;
        self.store
            .delete_activity(activity_id)
            .map_err(store_error)?;
        Ok(ai_ok(
            "activity_delete",
            json!({ "activity_id": activity_id.get() }),
        ))
    }

    pub(crate) fn tool_activity_get(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let activity_id = require_id(args, "activity_id", ActivityId::try_new)?;
        let activity = self.store.get_activity(activity_id).map_err(store_error)?;
        let beneficiary_ids = self
            .store
            .list_beneficiary_ids_for_activity(activity_id)
            .map_err(store_error)?;
        Ok(ai_ok(
            "activity_get",
            json!({
                "activity": activity_json(&activity),
                "beneficiary_ids": beneficiary_ids.iter().map(|id| id.get()).collect::<Vec<_>>()
            }),
        ))
    }

    pub(crate) fn tool_beneficiary_register(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let name = require_string(args, "name")?;
        let beneficiary = self
            .store
            .register_beneficiary(RegisterBeneficiaryRequest { name })
            .map_err(store_error)?;
        Ok(ai_ok(
            "beneficiary_register",
            json!({ "beneficiary": beneficiary_json(&beneficiary) }),
        ))
    }

    pub(crate) fn tool_beneficiary_delete(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let beneficiary_id = require_id(args, "beneficiary_id", BeneficiaryId::try_new)?;
        self.store
            .delete_beneficiary(beneficiary_id)
            .map_err(store_error)?;
        Ok(ai_ok(
            "beneficiary_delete",
            json!({ "beneficiary_id": beneficiary_id.get() }),
        ))
    }

    pub(crate) fn tool_beneficiary_get(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let beneficiary_id = require_id(args, "beneficiary_id", BeneficiaryId::try_new)?;
        let beneficiary = self
            .store
            .get_beneficiary(beneficiary_id)
            .map_err(store_error)?;
        Ok(ai_ok(
            "beneficiary_get",
            json!({ "beneficiary": beneficiary_json(&beneficiary) }),
        ))
    }

    pub(crate) fn tool_enrollment_add(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let request = enrollment(args)?;
        let (activity_id, beneficiary_id) = (request.activity_id, request.beneficiary_id);
        let enrolled = self
            .store
            .enroll_beneficiary(request)
            .map_err(store_error)?;
        Ok(ai_ok(
            "enrollment_add",
            json!({
                "activity_id": activity_id.get(),
                "beneficiary_id": beneficiary_id.get(),
                "already_enrolled": !enrolled
            }),
        ))
    }

    pub(crate) fn tool_enrollment_remove(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let request = enrollment(args)?;
        let (activity_id, beneficiary_id) = (request.activity_id, request.beneficiary_id);
        self.store
            .withdraw_beneficiary(request)
            .map_err(store_error)?;
        Ok(ai_ok(
            "enrollment_remove",
            json!({ "activity_id": activity_id.get(), "beneficiary_id": beneficiary_id.get() }),
        ))
    }
}
