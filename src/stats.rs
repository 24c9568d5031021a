use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::services::Registry;

/// Maximum entries kept in the recent-search log
pub const RECENT_SEARCHES_CAP: usize = 10;

/// Maximum stored query length in the recent-search log
pub const RECENT_QUERY_MAX_LEN: usize = 50;

/// Number of services tracked as favorites
pub const FAVORITES_COUNT: usize = 3;

/// One completed search, as remembered in the recent log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentSearch {
    pub service: String,
    pub query: String,
    /// Unix timestamp in seconds
    pub timestamp: i64,
}

/// Usage statistics across all services
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserStats {
    pub total_searches: u64,
    /// Per-service search counts; every registry id is present
    pub service_usage: BTreeMap<String, u64>,
    /// Most recent first, capped at [`RECENT_SEARCHES_CAP`]
    pub recent_searches: Vec<RecentSearch>,
    /// Top ids by usage count, ties broken lexicographically by id
    pub favorite_services: Vec<String>,
}

impl UserStats {
    /// Zero-initialize a counter for every registry id that lacks one
    pub fn ensure_services(&mut self, registry: &Registry) {
        for service in registry.iter() {
            self.service_usage.entry(service.id.clone()).or_insert(0);
        }
    }

    /// Usage count for a service id
    pub fn usage(&self, service_id: &str) -> u64 {
        self.service_usage.get(service_id).copied().unwrap_or(0)
    }

    /// Record a completed search.
    ///
    /// Increments the counters, prepends the (truncated) query to the
    /// recent log, and recomputes the favorites list. Persistence is the
    /// caller's responsibility.
    pub fn record(&mut self, service_id: &str, query: &str) {
        self.total_searches += 1;
        *self.service_usage.entry(service_id.to_string()).or_insert(0) += 1;

        self.recent_searches.insert(
            0,
            RecentSearch {
                service: service_id.to_string(),
                query: truncate_chars(query, RECENT_QUERY_MAX_LEN),
                timestamp: Utc::now().timestamp(),
            },
        );
        self.recent_searches.truncate(RECENT_SEARCHES_CAP);

        self.favorite_services = self.compute_favorites();
    }

    /// Top services by usage count, descending, ties broken by id
    fn compute_favorites(&self) -> Vec<String> {
        let mut ranked: Vec<(&String, u64)> = self
            .service_usage
            .iter()
            .map(|(id, count)| (id, *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
            .into_iter()
            .take(FAVORITES_COUNT)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Most recent entry whose query contains `needle` case-insensitively
    pub fn find_recent(&self, needle: &str) -> Option<&RecentSearch> {
        let needle = needle.to_lowercase();
        self.recent_searches
            .iter()
            .find(|r| r.query.to_lowercase().contains(&needle))
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Disk-backed store for [`UserStats`]
///
/// Saved after every mutation, best effort. A missing or malformed file
/// yields a fresh zero-valued ledger rather than an error.
#[derive(Debug)]
pub struct StatsStore {
    stats: UserStats,
    path: PathBuf,
}

impl StatsStore {
    /// Create an empty store at the default path
    pub fn new() -> Self {
        Self {
            stats: UserStats::default(),
            path: Self::default_path(),
        }
    }

    /// Load statistics from disk, falling back to a fresh ledger
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load statistics from an explicit path
    pub fn load_from(path: PathBuf) -> Self {
        if !path.exists() {
            debug!("No stats file at {:?}, starting fresh", path);
            return Self {
                stats: UserStats::default(),
                path,
            };
        }

        let stats = match fs::read(&path) {
            Ok(data) => match serde_json::from_slice::<UserStats>(&data) {
                Ok(stats) => {
                    info!(
                        "Loaded stats: {} searches across {} services",
                        stats.total_searches,
                        stats.service_usage.len()
                    );
                    stats
                }
                Err(e) => {
                    warn!("Malformed stats file {:?}: {}, starting fresh", path, e);
                    UserStats::default()
                }
            },
            Err(e) => {
                warn!("Failed to read stats file {:?}: {}, starting fresh", path, e);
                UserStats::default()
            }
        };

        Self { stats, path }
    }

    /// Write statistics to disk. Creates parent directories if needed.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(&self.stats)?;
        fs::write(&self.path, json)?;

        debug!("Stats saved to {:?}", self.path);
        Ok(())
    }

    pub fn stats(&self) -> &UserStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut UserStats {
        &mut self.stats
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn default_path() -> PathBuf {
        let cache_dir = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
        cache_dir.join("ai-omnibar").join("stats.json")
    }
}

impl Default for StatsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::builtin_registry;

    #[test]
    fn test_record_increments_counters() {
        let mut stats = UserStats::default();
        stats.ensure_services(&builtin_registry());

        stats.record("claude", "explain recursion");
        stats.record("claude", "borrow checker");
        stats.record("chatgpt", "hello");

        assert_eq!(stats.total_searches, 3);
        assert_eq!(stats.usage("claude"), 2);
        assert_eq!(stats.usage("chatgpt"), 1);
        assert_eq!(stats.usage("perplexity"), 0);
    }

    #[test]
    fn test_recent_searches_capped_at_ten() {
        let mut stats = UserStats::default();
        for i in 0..15 {
            stats.record("chatgpt", &format!("query {}", i));
        }
        assert_eq!(stats.recent_searches.len(), RECENT_SEARCHES_CAP);
        // Most recent first
        assert_eq!(stats.recent_searches[0].query, "query 14");
        assert_eq!(stats.recent_searches[9].query, "query 5");
    }

    #[test]
    fn test_long_queries_truncated() {
        let mut stats = UserStats::default();
        let long = "x".repeat(120);
        stats.record("claude", &long);
        assert_eq!(stats.recent_searches[0].query.len(), RECENT_QUERY_MAX_LEN);
    }

    #[test]
    fn test_favorites_top_three_by_usage() {
        let mut stats = UserStats::default();
        stats.ensure_services(&builtin_registry());
        for _ in 0..5 {
            stats.record("perplexity", "q");
        }
        for _ in 0..3 {
            stats.record("claude", "q");
        }
        stats.record("chatgpt", "q");

        assert_eq!(
            stats.favorite_services,
            vec!["perplexity", "claude", "chatgpt"]
        );
    }

    #[test]
    fn test_favorites_tie_break_is_lexicographic() {
        let mut stats = UserStats::default();
        stats.ensure_services(&builtin_registry());
        for _ in 0..5 {
            stats.record("chatgpt", "q");
        }
        for _ in 0..4 {
            stats.record("claude", "q");
        }
        // copilot and perplexity tie at 1 each; copilot sorts first
        stats.record("perplexity", "q");
        stats.record("copilot", "q");

        assert_eq!(stats.favorite_services, vec!["chatgpt", "claude", "copilot"]);

        // Recomputation is stable
        let again = stats.compute_favorites();
        assert_eq!(again, stats.favorite_services);
    }

    #[test]
    fn test_find_recent_case_insensitive() {
        let mut stats = UserStats::default();
        stats.record("claude", "Explain Recursion");
        stats.record("chatgpt", "weather today");

        let found = stats.find_recent("recursion").unwrap();
        assert_eq!(found.service, "claude");
        assert!(stats.find_recent("nonexistent").is_none());
    }

    #[test]
    fn test_find_recent_prefers_most_recent() {
        let mut stats = UserStats::default();
        stats.record("claude", "rust traits");
        stats.record("chatgpt", "rust lifetimes");

        let found = stats.find_recent("rust").unwrap();
        assert_eq!(found.service, "chatgpt");
    }

    #[test]
    fn test_ensure_services_zero_initializes() {
        let mut stats = UserStats::default();
        stats.ensure_services(&builtin_registry());
        assert_eq!(stats.service_usage.len(), 4);
        assert!(stats.service_usage.values().all(|&v| v == 0));
    }

    #[test]
    fn test_malformed_file_yields_fresh_ledger() {
        let path = std::env::temp_dir().join("ai-omnibar-test-malformed-stats.json");
        fs::write(&path, b"{ not json").unwrap();

        let store = StatsStore::load_from(path.clone());
        assert_eq!(store.stats().total_searches, 0);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let path = std::env::temp_dir().join("ai-omnibar-test-stats-roundtrip.json");
        let _ = fs::remove_file(&path);

        let mut store = StatsStore::load_from(path.clone());
        store.stats_mut().record("claude", "persisted query");
        store.save().unwrap();

        let reloaded = StatsStore::load_from(path.clone());
        assert_eq!(reloaded.stats().total_searches, 1);
        assert_eq!(reloaded.stats().recent_searches[0].query, "persisted query");

        let _ = fs::remove_file(path);
    }
}
