#![forbid(unsafe_code)]

use crate::LogframeServer;
use serde_json::Value;

macro_rules! define_logframe_dispatch {
    (
        read { $($read_name:literal => $read_method:ident),* $(,)? }
        write { $($write_name:literal => $write_method:ident),* $(,)? }
    ) => {
        pub(crate) fn dispatch_tool(
            server: &mut LogframeServer,
            name: &str,
            args: Value,
        ) -> Option<Value> {
            let resp = match name {
                $($read_name => server.$read_method(args),)*
                $($write_name => server.$write_method(args),)*
                _ => return None,
            };
            Some(resp.unwrap_or_else(|err| err))
        }

        /// `None` for unknown tools.
        pub(crate) fn tool_mutates(name: &str) -> Option<bool> {
            match name {
                $($read_name)|* => Some(false),
                $($write_name)|* => Some(true),
                _ => None,
            }
        }

        #[cfg(test)]
        pub(crate) fn dispatch_tool_names() -> &'static [&'static str] {
            &[$($read_name,)* $($write_name),*]
        }
    };
}

define_logframe_dispatch! {
    read {
        "framework_get" => tool_framework_get,
        "framework_list" => tool_framework_list,
        "framework_active" => tool_framework_active,
        "framework_actuals" => tool_framework_actuals,
        "objective_get" => tool_objective_get,
        "objective_list" => tool_objective_list,
        "outcome_get" => tool_outcome_get,
        "outcome_list" => tool_outcome_list,
        "output_get" => tool_output_get,
        "output_list" => tool_output_list,
        "indicator_get" => tool_indicator_get,
        "indicator_list" => tool_indicator_list,
        "indicator_actual" => tool_indicator_actual,
        "structure_get" => tool_structure_get,
        "links_list" => tool_links_list,
        "activity_get" => tool_activity_get,
        "beneficiary_get" => tool_beneficiary_get,
    }
    write {
        "framework_create" => tool_framework_create,
        "framework_update" => tool_framework_update,
        "framework_delete" => tool_framework_delete,
        "objective_create" => tool_objective_create,
        "objective_update" => tool_objective_update,
        "objective_delete" => tool_objective_delete,
        "outcome_create" => tool_outcome_create,
        "outcome_update" => tool_outcome_update,
        "outcome_delete" => tool_outcome_delete,
        "output_create" => tool_output_create,
        "output_update" => tool_output_update,
        "output_delete" => tool_output_delete,
        "indicator_create" => tool_indicator_create,
        "indicator_update" => tool_indicator_update,
        "indicator_delete" => tool_indicator_delete,
        "links_batch" => tool_links_batch,
        "link_add" => tool_link_add,
        "link_remove" => tool_link_remove,
        "activity_register" => tool_activity_register,
        "activity_delete" => tool_activity_delete,
        "beneficiary_register" => tool_beneficiary_register,
        "beneficiary_delete" => tool_beneficiary_delete,
        "enrollment_add" => tool_enrollment_add,
        "enrollment_remove" => tool_enrollment_remove,
    }
}
