use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::services::Registry;

/// Persisted user preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Id of the service used when no prefix is typed
    pub default_service: String,
    /// Maximum suggestions the surface will display
    pub max_suggestions: usize,
    /// Per-service enabled flags; ids not listed default to enabled
    pub enabled: HashMap<String, bool>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            default_service: "chatgpt".to_string(),
            max_suggestions: 6,
            enabled: HashMap::new(),
        }
    }
}

impl Preferences {
    /// Whether a service is enabled; unknown ids count as enabled
    pub fn is_enabled(&self, service_id: &str) -> bool {
        self.enabled.get(service_id).copied().unwrap_or(true)
    }

    /// Reject preference states that would leave the launcher unusable:
    /// a default service that is unknown or disabled, or no enabled
    /// service at all.
    pub fn validate(&self, registry: &Registry) -> Result<()> {
        if registry.get(&self.default_service).is_none() {
            bail!(
                "default service '{}' is not a known service",
                self.default_service
            );
        }
        if !self.is_enabled(&self.default_service) {
            bail!("default service '{}' is disabled", self.default_service);
        }
        if !registry.iter().any(|s| self.is_enabled(&s.id)) {
            bail!("at least one service must be enabled");
        }
        Ok(())
    }
}

/// Settings change request, as sent by an options surface
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub default_service: Option<String>,
    pub enabled: Option<HashMap<String, bool>>,
}

impl SettingsUpdate {
    /// Apply this update to a copy of `prefs`, leaving the original
    /// untouched so validation failures don't corrupt in-memory state
    pub fn applied_to(&self, prefs: &Preferences) -> Preferences {
        let mut next = prefs.clone();
        if let Some(default_service) = &self.default_service {
            next.default_service = default_service.clone();
        }
        if let Some(enabled) = &self.enabled {
            for (id, flag) in enabled {
                next.enabled.insert(id.clone(), *flag);
            }
        }
        next
    }
}
