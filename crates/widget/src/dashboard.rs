//! Prompt builders for dashboard and panel titles/descriptions

use llmassist_common::{AssistError, Result};
use llmassist_llm::Message;
use serde::Serialize;
use serde_json::Value;

/// Tooltip for a generate button that has nothing to work from
pub const NEED_PANEL_CONTEXT_MESSAGE: &str =
    "To generate this content, add titles or descriptions to your panels first.";

const TITLE_INSTRUCTIONS: &str = "You are an expert in creating observability dashboards. \
Your goal is to write a concise, descriptive dashboard title. \
The title must be shorter than 60 characters and must not contain the word 'dashboard'. \
Reply with the title only, without quotes or any other text.";

const DESCRIPTION_INSTRUCTIONS: &str = "You are an expert in creating observability dashboards. \
Your goal is to write a short description of the dashboard that helps a reader understand \
what it monitors and how the panels relate to each other. \
The description must be shorter than 140 characters. \
Reply with the description only, without quotes or any other text.";

const PANEL_TITLE_INSTRUCTIONS: &str = "You are an expert in creating observability dashboards. \
Your goal is to write a concise title for one dashboard panel based on its configuration. \
The title must be shorter than 50 characters. \
Reply with the title only, without quotes or any other text.";

const PANEL_DESCRIPTION_INSTRUCTIONS: &str = "You are an expert in creating observability dashboards. \
Your goal is to explain, in at most two sentences, what one dashboard panel shows \
and what a reader should look for in it. \
Reply with the description only, without quotes or any other text.";

/// Prompt-relevant view of one panel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PanelSummary {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub panel_type: String,
    /// Query expressions (PromQL, SQL, ...) when present
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub queries: Vec<String>,
}

impl PanelSummary {
    fn from_json(panel: &Value) -> Self {
        let text = |key: &str| {
            panel
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string()
        };

        let queries = panel
            .get("targets")
            .and_then(Value::as_array)
            .map(|targets| {
                targets
                    .iter()
                    .filter_map(|target| {
                        ["expr", "rawSql", "query"]
                            .iter()
                            .find_map(|key| target.get(*key).and_then(Value::as_str))
                    })
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            title: text("title"),
            description: text("description"),
            panel_type: text("type"),
            queries,
        }
    }

    fn has_context(&self) -> bool {
        !self.title.is_empty() || !self.description.is_empty()
    }
}

/// Prompt-relevant view of a dashboard model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub title: String,
    pub description: String,
    pub panels: Vec<PanelSummary>,
}

impl DashboardSummary {
    /// Read a dashboard JSON model
    ///
    /// Panels nested in collapsed rows are flattened; row panels themselves are skipped.
    pub fn from_json(model: &Value) -> Result<Self> {
        let model = model.get("dashboard").unwrap_or(model);
        if !model.is_object() {
            return Err(AssistError::invalid_input("dashboard model must be a JSON object"));
        }

        let mut panels = Vec::new();
        if let Some(list) = model.get("panels").and_then(Value::as_array) {
            for panel in list {
                if panel.get("type").and_then(Value::as_str) == Some("row") {
                    if let Some(nested) = panel.get("panels").and_then(Value::as_array) {
                        panels.extend(nested.iter().map(PanelSummary::from_json));
                    }
                } else {
                    panels.push(PanelSummary::from_json(panel));
                }
            }
        }

        Ok(Self {
            title: model
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            description: model
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            panels,
        })
    }

    /// Whether any panel carries a title or description to summarize
    pub fn has_panel_context(&self) -> bool {
        self.panels.iter().any(PanelSummary::has_context)
    }

    fn panels_prompt(&self) -> String {
        let panels: Vec<&PanelSummary> = self.panels.iter().filter(|p| p.has_context()).collect();
        serde_json::to_string(&panels).unwrap_or_default()
    }
}

pub fn dashboard_title_messages(dashboard: &DashboardSummary) -> Vec<Message> {
    vec![
        Message::system(TITLE_INSTRUCTIONS),
        Message::user(format!(
            "The dashboard contains these panels: {}",
            dashboard.panels_prompt()
        )),
    ]
}

pub fn dashboard_description_messages(dashboard: &DashboardSummary) -> Vec<Message> {
    let mut context = format!("The dashboard contains these panels: {}", dashboard.panels_prompt());
    if !dashboard.title.is_empty() {
        context = format!("The dashboard title is \"{}\". {}", dashboard.title, context);
    }
    vec![Message::system(DESCRIPTION_INSTRUCTIONS), Message::user(context)]
}

pub fn panel_title_messages(panel: &PanelSummary) -> Vec<Message> {
    vec![
        Message::system(PANEL_TITLE_INSTRUCTIONS),
        Message::user(format!(
            "The panel configuration is: {}",
            serde_json::to_string(panel).unwrap_or_default()
        )),
    ]
}

pub fn panel_description_messages(panel: &PanelSummary) -> Vec<Message> {
    vec![
        Message::system(PANEL_DESCRIPTION_INSTRUCTIONS),
        Message::user(format!(
            "The panel configuration is: {}",
            serde_json::to_string(panel).unwrap_or_default()
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmassist_llm::Role;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "title": "Checkout",
            "panels": [
                {"type": "timeseries", "title": "Request rate", "targets": [{"expr": "sum(rate(http_requests_total[5m]))"}]},
                {"type": "text", "title": ""},
                {"type": "row", "title": "Errors", "panels": [
                    {"type": "stat", "title": "5xx ratio", "description": "Share of failed requests"}
                ]}
            ]
        })
    }

    #[test]
    fn test_from_json_flattens_rows() {
        let dashboard = DashboardSummary::from_json(&sample()).unwrap();
        assert_eq!(dashboard.title, "Checkout");
        assert_eq!(dashboard.panels.len(), 3);
        assert_eq!(dashboard.panels[0].queries, vec!["sum(rate(http_requests_total[5m]))"]);
        assert_eq!(dashboard.panels[2].title, "5xx ratio");
        assert!(dashboard.has_panel_context());
    }

    #[test]
    fn test_from_json_accepts_wrapped_model() {
        let wrapped = json!({"dashboard": sample(), "meta": {}});
        assert_eq!(DashboardSummary::from_json(&wrapped).unwrap().title, "Checkout");
        assert!(DashboardSummary::from_json(&json!("nope")).is_err());
    }

    #[test]
    fn test_untitled_panels_have_no_context() {
        let dashboard =
            DashboardSummary::from_json(&json!({"panels": [{"type": "timeseries"}]})).unwrap();
        assert!(!dashboard.has_panel_context());
    }

    #[test]
    fn test_title_messages_put_instructions_first() {
        let dashboard = DashboardSummary::from_json(&sample()).unwrap();
        let messages = dashboard_title_messages(&dashboard);

        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[1].content.contains("Request rate"));
        assert!(messages[1].content.contains("5xx ratio"));
        // Panels without a title or description add nothing
        assert!(!messages[1].content.contains("\"text\""));
    }

    #[test]
    fn test_description_messages_mention_title() {
        let dashboard = DashboardSummary::from_json(&sample()).unwrap();
        let messages = dashboard_description_messages(&dashboard);
        assert!(messages[1].content.starts_with("The dashboard title is \"Checkout\""));
    }

    #[test]
    fn test_panel_messages_carry_configuration() {
        let dashboard = DashboardSummary::from_json(&sample()).unwrap();
        let messages = panel_description_messages(&dashboard.panels[0]);
        assert!(messages[1].content.contains("http_requests_total"));
        assert_eq!(panel_title_messages(&dashboard.panels[2])[0].role, Role::System);
    }
}
