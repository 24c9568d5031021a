use anyhow::{Context, Result};
use tracing::{debug, error, info};

use crate::config::{PrefsLoader, SettingsUpdate};
use crate::omnibox::{parse, rank, ParsedInput, Suggestion};
use crate::resolve::resolve_or_default;
use crate::services::Registry;
use crate::stats::StatsStore;
use crate::utils::open_url;

/// How a navigation target should be opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    CurrentTab,
    NewForegroundTab,
    NewBackgroundTab,
}

/// Navigation primitive: loads a URL somewhere the user can see it
pub trait Navigator {
    fn navigate(&self, url: &str, disposition: Disposition) -> Result<()>;
}

/// Default navigator: the system browser via `xdg-open`
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn navigate(&self, url: &str, disposition: Disposition) -> Result<()> {
        open_url(url, disposition)
    }
}

/// Owns all launcher state for one surface: the service registry, user
/// preferences, and the usage ledger.
///
/// Every decision re-reads the current in-memory preferences, so a
/// [`Engine::reload_settings`] call after an external change is enough to
/// resynchronize.
pub struct Engine<N: Navigator = BrowserNavigator> {
    registry: Registry,
    prefs: PrefsLoader,
    stats: StatsStore,
    navigator: N,
}

impl Engine<BrowserNavigator> {
    pub fn new(registry: Registry, prefs: PrefsLoader, stats: StatsStore) -> Self {
        Self::with_navigator(registry, prefs, stats, BrowserNavigator)
    }
}

impl<N: Navigator> Engine<N> {
    pub fn with_navigator(
        registry: Registry,
        prefs: PrefsLoader,
        mut stats: StatsStore,
        navigator: N,
    ) -> Self {
        stats.stats_mut().ensure_services(&registry);
        Self {
            registry,
            prefs,
            stats,
            navigator,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn stats(&self) -> &StatsStore {
        &self.stats
    }

    pub fn default_service(&self) -> &str {
        &self.prefs.prefs().default_service
    }

    /// Parse the current input against the live preferences
    pub fn parse_input(&self, text: &str) -> ParsedInput {
        parse(text, &self.registry, self.default_service())
    }

    /// Ranked suggestions for the typed text; empty input gives none
    pub fn suggest(&self, text: &str) -> Vec<Suggestion> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let parsed = self.parse_input(text);
        rank(
            text,
            &parsed,
            &self.registry,
            self.stats.stats(),
            self.prefs.prefs(),
            self.prefs.prefs().max_suggestions,
        )
    }

    /// Submit omnibox text: resolve the URL, record the search, navigate.
    ///
    /// Returns the URL that was opened. A disabled or unknown service id
    /// degrades to the default service; a stats write failure is logged
    /// and never blocks the navigation.
    pub fn submit(&mut self, text: &str, disposition: Disposition) -> Result<String> {
        let parsed = self.parse_input(text);
        let target = self.effective_service(&parsed.service);
        let default = self.default_service().to_string();
        let (url, used_service) =
            resolve_or_default(&target, &parsed.query, &self.registry, &default)
                .context("Failed to build search URL")?;

        self.record_search(&used_service, &parsed.query);

        info!("Submitting to {}: {}", used_service, url);
        self.navigator.navigate(&url, disposition)?;
        Ok(url)
    }

    /// URL that [`Engine::submit`] would open for this text, without
    /// recording or navigating
    pub fn preview_url(&self, text: &str) -> Result<String> {
        let parsed = self.parse_input(text);
        let target = self.effective_service(&parsed.service);
        let default = self.default_service();
        let (url, _) = resolve_or_default(&target, &parsed.query, &self.registry, default)
            .context("Failed to build search URL")?;
        Ok(url)
    }

    /// Context-menu search: selected text goes to the default service in
    /// a new tab
    pub fn search_selection(&mut self, selection: &str) -> Result<String> {
        let query = selection.trim();
        let default = self.default_service().to_string();
        let target = self.effective_service(&default);
        let (url, used_service) = resolve_or_default(&target, query, &self.registry, &default)
            .context("Failed to build search URL")?;

        self.record_search(&used_service, query);

        self.navigator
            .navigate(&url, Disposition::NewForegroundTab)?;
        Ok(url)
    }

    /// Service to actually search: the requested one when it exists and
    /// is enabled, otherwise the default, otherwise the first enabled
    /// service. Preference validation keeps the default enabled, but a
    /// hand-edited file can bypass it.
    fn effective_service(&self, service_id: &str) -> String {
        let prefs = self.prefs.prefs();
        if self.registry.get(service_id).is_some() && prefs.is_enabled(service_id) {
            return service_id.to_string();
        }

        let default = &prefs.default_service;
        if service_id != default {
            debug!("Service '{}' unavailable, degrading to default", service_id);
        }
        if self.registry.get(default).is_some() && prefs.is_enabled(default) {
            return default.clone();
        }

        self.registry
            .iter()
            .find(|s| prefs.is_enabled(&s.id))
            .or_else(|| self.registry.iter().next())
            .map(|s| s.id.clone())
            .unwrap_or_else(|| default.clone())
    }

    /// Icon-click: open the default service's landing page. Not counted
    /// as a search.
    pub fn open_default(&self) -> Result<String> {
        let service = self
            .registry
            .get(self.default_service())
            .or_else(|| self.registry.iter().next())
            .context("Registry is empty")?;

        self.navigator
            .navigate(&service.base_url, Disposition::NewForegroundTab)?;
        Ok(service.base_url.clone())
    }

    /// Context-menu label for the current default service
    pub fn selection_menu_title(&self) -> String {
        match self.registry.get(self.default_service()) {
            Some(service) => format!("Search {} for '%s'", service.name),
            None => "Search for '%s'".to_string(),
        }
    }

    /// Apply a settings update from an options surface: validate,
    /// persist, and refresh the in-memory copy. Invalid updates are
    /// rejected whole.
    pub fn apply_settings_update(&mut self, update: &SettingsUpdate) -> Result<()> {
        let next = update.applied_to(self.prefs.prefs());
        self.prefs.update(next, &self.registry)?;
        info!("Settings updated; default is now {}", self.default_service());
        Ok(())
    }

    /// Re-read preferences from disk after an external change
    /// notification
    pub fn reload_settings(&mut self) -> Result<()> {
        self.prefs.reload()
    }

    fn record_search(&mut self, service_id: &str, query: &str) {
        self.stats.stats_mut().record(service_id, query);
        debug!(
            "Recorded search #{} for {}",
            self.stats.stats().total_searches,
            service_id
        );
        if let Err(e) = self.stats.save() {
            error!("Failed to persist stats: {}", e);
        }
    }
}
