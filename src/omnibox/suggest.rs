use crate::config::Preferences;
use crate::services::{Registry, ServiceDescriptor};
use crate::stats::UserStats;

use super::parse::{MatchKind, ParsedInput};

/// One address-bar suggestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// Text that replaces the input when the suggestion is chosen
    pub fill_text: String,
    pub label: SuggestionLabel,
}

/// Display label split into semantic regions; rendering is the surface's
/// concern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionLabel {
    /// Leading plain text
    pub text: String,
    /// Highlighted "matched" portion, when there is one
    pub matched: Option<String>,
    /// Dimmed trailing annotation
    pub note: Option<String>,
}

impl SuggestionLabel {
    fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            matched: None,
            note: None,
        }
    }

    fn with_matched(mut self, matched: impl Into<String>) -> Self {
        self.matched = Some(matched.into());
        self
    }

    fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Rank candidate suggestions for the typed text.
///
/// Four buckets, appended in priority order and truncated to `cap` —
/// later buckets are dropped first, never interleaved:
///
/// 1. The primary suggestion for the parsed service and query.
/// 2. Other enabled services, when no prefix was typed.
/// 3. Quick-switch entries for 1-2 character inputs matching an alias.
/// 4. The most recent matching entry from the search history.
///
/// An implicit match with an empty query ("gpt ") gets no primary
/// suggestion: there is nothing to search for yet. Submitting it still
/// navigates (see the resolver).
///
/// Pure function of its arguments; calling it twice gives the same list.
pub fn rank(
    raw: &str,
    parsed: &ParsedInput,
    registry: &Registry,
    stats: &UserStats,
    prefs: &Preferences,
    cap: usize,
) -> Vec<Suggestion> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut suggestions = Vec::new();

    // Bucket 1: primary suggestion for the parsed service
    if let Some(service) = registry.get(&parsed.service) {
        let suppress = parsed.kind == MatchKind::Implicit && parsed.query.is_empty();
        if !suppress {
            let text = if parsed.is_default() {
                format!("Search {} (default) for: ", service.name)
            } else {
                format!("Search {} for: ", service.name)
            };
            suggestions.push(Suggestion {
                fill_text: raw.to_string(),
                label: SuggestionLabel::new(text).with_matched(parsed.query.clone()),
            });
        }
    }

    // Bucket 2: alternative services, only when nothing narrowed the
    // input down yet
    if parsed.is_default() && parsed.query == trimmed {
        for service in sorted_by_usage(registry, stats) {
            if service.id == parsed.service || !prefs.is_enabled(&service.id) {
                continue;
            }
            suggestions.push(Suggestion {
                fill_text: format!("{}: {}", service.first_alias(), trimmed),
                label: SuggestionLabel::new(format!("{} {}: ", service.icon, service.name))
                    .with_matched(trimmed)
                    .with_note(service.description.clone()),
            });
        }
    }

    // Bucket 3: quick service switching for very short inputs; gates on
    // the raw text as typed, not its trimmed form
    if raw.len() <= 2 && parsed.matched_token.is_none() {
        let lowered = raw.to_lowercase();
        for service in sorted_by_usage(registry, stats) {
            if !prefs.is_enabled(&service.id) {
                continue;
            }
            if service.aliases.iter().any(|a| a.starts_with(&lowered)) {
                suggestions.push(Suggestion {
                    fill_text: format!("{}: ", service.first_alias()),
                    label: SuggestionLabel::new(format!(
                        "{} Switch to {}",
                        service.icon, service.name
                    ))
                    .with_note("Type your query after the colon"),
                });
            }
        }
    }

    // Bucket 4: recent search matching the typed text
    if trimmed.len() >= 3 {
        if let Some(recent) = stats.find_recent(trimmed) {
            if let Some(service) = registry.get(&recent.service) {
                suggestions.push(Suggestion {
                    fill_text: format!("{}: {}", service.first_alias(), recent.query),
                    label: SuggestionLabel::new(format!("🕒 Recent: {} - ", service.name))
                        .with_matched(recent.query.clone()),
                });
            }
        }
    }

    suggestions.truncate(cap);
    suggestions
}

/// Services ordered by usage count descending, then display name
fn sorted_by_usage<'a>(registry: &'a Registry, stats: &UserStats) -> Vec<&'a ServiceDescriptor> {
    let mut services: Vec<&ServiceDescriptor> = registry.iter().collect();
    services.sort_by(|a, b| {
        stats
            .usage(&b.id)
            .cmp(&stats.usage(&a.id))
            .then_with(|| a.name.cmp(&b.name))
    });
    services
}
