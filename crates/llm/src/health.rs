use llmassist_common::AssistError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::llm_trait::LlmPlugin;

/// Memoized plugin health, keyed by plugin id
///
/// Concurrent callers for the same plugin share one in-flight probe. Only a
/// healthy answer is remembered: a failed or negative probe leaves the entry
/// unresolved so the next caller probes again.
#[derive(Debug, Default)]
pub struct HealthCache {
    entries: Mutex<HashMap<String, Arc<OnceCell<()>>>>,
}

impl HealthCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, plugin_id: &str) -> Arc<OnceCell<()>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.entry(plugin_id.to_string()).or_default().clone()
    }

    /// Whether the plugin is installed and healthy
    pub async fn is_enabled(&self, plugin: &dyn LlmPlugin) -> bool {
        let plugin_id = plugin.plugin_id();
        let cell = self.entry(plugin_id);

        let probe = cell
            .get_or_try_init(|| async {
                debug!(plugin_id, "Running LLM plugin health check");
                match plugin.health().await {
                    Ok(report) if report.ok => Ok(()),
                    Ok(_) => Err(AssistError::plugin_disabled(format!(
                        "{} reported unhealthy",
                        plugin_id
                    ))),
                    Err(e) => Err(e),
                }
            })
            .await;

        match probe {
            Ok(()) => true,
            Err(AssistError::PluginDisabled(reason)) => {
                debug!(plugin_id, "LLM plugin disabled: {}", reason);
                false
            }
            Err(e) => {
                warn!(plugin_id, "LLM plugin health check failed: {}", e);
                false
            }
        }
    }

    /// Whether a healthy result is currently memoized
    pub fn is_resolved(&self, plugin_id: &str) -> bool {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(plugin_id)
            .map(|cell| cell.initialized())
            .unwrap_or(false)
    }

    /// Forget the memoized result for one plugin
    pub fn invalidate(&self, plugin_id: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(plugin_id);
    }

    /// Forget every memoized result
    pub fn reset(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
    }
}
