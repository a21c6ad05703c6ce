#![forbid(unsafe_code)]

use super::super::render::{cascade_json, framework_json};
use crate::*;
use lf_core::ids::FrameworkId;
use lf_core::period::{Period, format_date};
use lf_storage::{CreateFrameworkRequest, UpdateFrameworkRequest};
use serde_json::{Value, json};
use time::OffsetDateTime;

fn period_error(err: lf_core::period::PeriodError) -> Value {
    ai_error("VALIDATION_ERROR", &err.message())
}

impl LogframeServer {
    pub(crate) fn tool_framework_create(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let name = require_string(args, "name")?;
        let start = require_date(args, "start_date")?;
        let end = require_date(args, "end_date")?;
        let period = Period::try_new(start, end).map_err(period_error)?;

        let framework = self
            .store
            .create_framework(CreateFrameworkRequest { name, period })
            .map_err(store_error)?;
        Ok(ai_ok(
            "framework_create",
            json!({ "framework": framework_json(&framework) }),
        ))
    }

    /// Omitted fields keep their stored values.
    pub(crate) fn tool_framework_update(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let framework_id = require_id(args, "framework_id", FrameworkId::try_new)?;
        let name = optional_string(args, "name")?;
        let start_date = optional_date(args, "start_date")?;
        let end_date = optional_date(args, "end_date")?;

        let framework = self
            .store
            .update_framework(UpdateFrameworkRequest {
                framework_id,
                name,
                start_date,
                end_date,
            })
            .map_err(store_error)?;
        Ok(ai_ok(
            "framework_update",
            json!({ "framework": framework_json(&framework) }),
        ))
    }

    pub(crate) fn tool_framework_delete(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let framework_id = require_id(args, "framework_id", FrameworkId::try_new)?;
        let summary = self
            .store
            .delete_framework(framework_id)
            .map_err(store_error)?;
        Ok(ai_ok(
            "framework_delete",
            json!({ "framework_id": framework_id.get(), "removed": cascade_json(&summary) }),
        ))
    }

    pub(crate) fn tool_framework_get(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let framework_id = require_id(args, "framework_id", FrameworkId::try_new)?;
        let framework = self
            .store
            .get_framework(framework_id)
            .map_err(store_error)?;
        Ok(ai_ok(
            "framework_get",
            json!({ "framework": framework_json(&framework) }),
        ))
    }

    pub(crate) fn tool_framework_list(&mut self, _args: Value) -> Result<Value, Value> {
        let frameworks = self.store.list_frameworks().map_err(store_error)?;
        Ok(ai_ok(
            "framework_list",
            json!({
                "count": frameworks.len(),
                "frameworks": frameworks.iter().map(framework_json).collect::<Vec<_>>()
            }),
        ))
    }

    /// `date` defaults to today (UTC).
    pub(crate) fn tool_framework_active(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let date = optional_date(args, "date")?.unwrap_or_else(|| OffsetDateTime::now_utc().date());
        let framework = self
            .store
            .framework_active_on(date)
            .map_err(store_error)?;

        let mut warnings = Vec::new();
        if framework.is_none() {
            warnings.push(warning(
                "NO_ACTIVE_FRAMEWORK",
                &format!("no framework period covers {}", format_date(date)),
            ));
        }
        Ok(ai_ok_with_warnings(
            "framework_active",
            json!({
                "date": format_date(date),
                "framework": framework.as_ref().map(framework_json)
            }),
            warnings,
        ))
    }
}
