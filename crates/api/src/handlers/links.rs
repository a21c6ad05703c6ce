#![forbid(unsafe_code)]

use super::render::activity_json;
use crate::*;
use lf_core::ids::{ActivityId, IndicatorId};
use lf_storage::BatchLinkRequest;
use serde_json::{Value, json};

impl LogframeServer {
    pub(crate) fn tool_links_batch(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let indicator_id = require_id(args, "indicator_id", IndicatorId::try_new)?;
        let activity_ids = require_id_set(args, "activity_ids", ActivityId::try_new)?;

        let mut warnings = Vec::new();
        if activity_ids.is_empty() {
            warnings.push(warning("EMPTY_BATCH", "activity_ids is empty; nothing was linked"));
        }
        let outcome = self
            .store
            .batch_link_activities_to_indicator(BatchLinkRequest {
                indicator_id,
                activity_ids,
            })
            .map_err(store_error)?;
        Ok(ai_ok_with_warnings(
            "links_batch",
            json!({
                "indicator_id": indicator_id.get(),
                "added_count": outcome.added_count,
                "skipped_duplicate_count": outcome.skipped_duplicate_count
            }),
            warnings,
        ))
    }

    pub(crate) fn tool_link_add(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let indicator_id = require_id(args, "indicator_id", IndicatorId::try_new)?;
        let activity_id = require_id(args, "activity_id", ActivityId::try_new)?;
        self.store
            .link_activity_to_indicator(activity_id, indicator_id)
            .map_err(store_error)?;
        Ok(ai_ok(
            "link_add",
            json!({ "indicator_id": indicator_id.get(), "activity_id": activity_id.get() }),
        ))
    }

    pub(crate) fn tool_link_remove(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let indicator_id = require_id(args, "indicator_id", IndicatorId::try_new)?;
        let activity_id = require_id(args, "activity_id", ActivityId::try_new)?;
        self.store
            .unlink_activity_from_indicator(activity_id, indicator_id)
            .map_err(store_error)?;
        Ok(ai_ok(
            "link_remove",
            json!({ "indicator_id": indicator_id.get(), "activity_id": activity_id.get() }),
        ))
    }

    /// Per-activity counts overlap; their sum is not the indicator's actual value.
    pub(crate) fn tool_links_list(&mut self, args: Value) -> Result<Value, Value> {
        let args = args_object(&args)?;
        let indicator_id = require_id(args, "indicator_id", IndicatorId::try_new)?;
        let linked = self
            .store
            .linked_activities_with_counts(indicator_id)
            .map_err(store_error)?;
        Ok(ai_ok(
            "links_list",
            json!({
                "indicator_id": indicator_id.get(),
                "activities": linked
                    .iter()
                    .map(|entry| json!({
                        "activity": activity_json(&entry.activity),
                        "beneficiary_count": entry.beneficiary_count
                    }))
                    .collect::<Vec<_>>()
            }),
        ))
    }
}
