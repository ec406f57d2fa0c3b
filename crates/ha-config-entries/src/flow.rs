//! Config flow results
//!
//! A config flow step either shows a form, creates an entry or aborts. The
//! step logic lives in each integration; this module only defines the
//! shape the frontend receives.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of flow result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowResultType {
    Form,
    CreateEntry,
    Abort,
}

/// Result of a config flow step
#[derive(Debug, Clone, Serialize)]
pub struct FlowResult {
    /// Integration domain handling the flow
    pub handler: String,
    #[serde(rename = "type")]
    pub result_type: FlowResultType,
    /// Current step ID (for forms)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    /// Form schema, empty unless this is a form
    pub data_schema: Vec<FormField>,
    /// Errors from the previous submission, keyed by field or `base`
    pub errors: HashMap<String, String>,
    pub description_placeholders: HashMap<String, String>,
    /// Title (for create_entry)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Abort reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Entry data (for create_entry) or options (for options flows)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, serde_json::Value>>,
}

impl FlowResult {
    fn empty(handler: &str, result_type: FlowResultType) -> Self {
        Self {
            handler: handler.to_string(),
            result_type,
            step_id: None,
            data_schema: Vec::new(),
            errors: HashMap::new(),
            description_placeholders: HashMap::new(),
            title: None,
            reason: None,
            data: None,
        }
    }

    /// Show a form for `step_id`
    pub fn form(
        handler: &str,
        step_id: impl Into<String>,
        data_schema: Vec<FormField>,
        errors: HashMap<String, String>,
    ) -> Self {
        Self {
            step_id: Some(step_id.into()),
            data_schema,
            errors,
            ..Self::empty(handler, FlowResultType::Form)
        }
    }

    /// Finish the flow by creating an entry
    pub fn create_entry(
        handler: &str,
        title: impl Into<String>,
        data: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            data: Some(data),
            ..Self::empty(handler, FlowResultType::CreateEntry)
        }
    }

    /// Finish the flow without creating anything
    pub fn abort(handler: &str, reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::empty(handler, FlowResultType::Abort)
        }
    }

    pub fn with_placeholder(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.description_placeholders.insert(key.into(), value.into());
        self
    }

    /// The `base` error of a re-shown form, if any
    pub fn base_error(&self) -> Option<&str> {
        self.errors.get("base").map(String::as_str)
    }
}

/// One field of a form schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    /// "string", "integer", "boolean" or "multi_select"
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    /// Choices for multi_select fields, value -> label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<(String, String)>>,
}

impl FormField {
    pub fn required(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            required: Some(true),
            default: None,
            options: None,
        }
    }

    pub fn optional(
        name: impl Into<String>,
        field_type: impl Into<String>,
        default: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            required: Some(false),
            default: Some(default),
            options: None,
        }
    }

    pub fn multi_select(
        name: impl Into<String>,
        options: Vec<(String, String)>,
        default: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            field_type: "multi_select".to_string(),
            required: Some(false),
            default: Some(serde_json::json!(default)),
            options: Some(options),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_form_serialization() {
        let errors = HashMap::from([("base".to_string(), "invalid_auth".to_string())]);
        let form = FlowResult::form(
            "music_assistant",
            "user",
            vec![
                FormField::required("host", "string"),
                FormField::optional("port", "integer", json!(8095)),
            ],
            errors,
        );

        assert_eq!(form.base_error(), Some("invalid_auth"));
        let value = serde_json::to_value(&form).unwrap();
        assert_eq!(value["type"], "form");
        assert_eq!(value["step_id"], "user");
        assert_eq!(value["data_schema"][1]["default"], 8095);
        assert!(value.get("title").is_none());
    }

    #[test]
    fn test_create_entry_and_abort() {
        let created = FlowResult::create_entry(
            "music_assistant",
            "Music Assistant",
            HashMap::from([("host".to_string(), json!("mass.local"))]),
        );
        assert_eq!(created.result_type, FlowResultType::CreateEntry);
        assert_eq!(created.title.as_deref(), Some("Music Assistant"));

        let aborted = FlowResult::abort("music_assistant", "already_configured");
        assert_eq!(aborted.result_type, FlowResultType::Abort);
        assert_eq!(
            serde_json::to_value(&aborted).unwrap()["reason"],
            "already_configured"
        );
    }
}
