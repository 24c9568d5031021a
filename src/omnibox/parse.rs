use crate::services::Registry;

/// How the input selected its service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// `token:` prefix
    Explicit,
    /// `token ` prefix
    Implicit,
    /// No prefix, default service used
    Default,
}

/// Result of parsing raw omnibox text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInput {
    /// Id of the resolved service
    pub service: String,
    /// Query to search for, already trimmed
    pub query: String,
    pub kind: MatchKind,
    /// The keyword or alias that matched, when one did
    pub matched_token: Option<String>,
}

impl ParsedInput {
    /// True when no prefix was typed and the default service was used
    pub fn is_default(&self) -> bool {
        self.kind == MatchKind::Default
    }
}

/// Map raw input text to a service and query.
///
/// Two prefix passes run over the registry in definition order, testing
/// each service's keywords before its aliases:
///
/// 1. `token:` — the remainder becomes the query. An empty remainder
///    falls back to the whole trimmed input, so "claude:" still searches
///    for something useful instead of an empty string.
/// 2. `token ` — only consulted when no colon form matched. The remainder
///    may legitimately be empty ("gpt " selects ChatGPT with no query yet).
///
/// Anything else resolves to the default service with the whole trimmed
/// text as the query. Deterministic: same registry, default, and text
/// always produce the same result.
pub fn parse(raw: &str, registry: &Registry, default_service: &str) -> ParsedInput {
    let trimmed = raw.trim();
    let lowered = trimmed.to_lowercase();

    // Pass 1: colon form
    for service in registry.iter() {
        for token in service.match_tokens() {
            let prefix = format!("{}:", token.to_lowercase());
            if lowered.starts_with(&prefix) {
                let remainder = trimmed[prefix.len()..].trim();
                let query = if remainder.is_empty() {
                    trimmed.to_string()
                } else {
                    remainder.to_string()
                };
                return ParsedInput {
                    service: service.id.clone(),
                    query,
                    kind: MatchKind::Explicit,
                    matched_token: Some(token.to_string()),
                };
            }
        }
    }

    // Pass 2: space-separated form
    for service in registry.iter() {
        for token in service.match_tokens() {
            let prefix = format!("{} ", token.to_lowercase());
            if lowered.starts_with(&prefix) {
                let remainder = trimmed[token.len()..].trim();
                return ParsedInput {
                    service: service.id.clone(),
                    query: remainder.to_string(),
                    kind: MatchKind::Implicit,
                    matched_token: Some(token.to_string()),
                };
            }
        }
    }

    ParsedInput {
        service: default_service.to_string(),
        query: trimmed.to_string(),
        kind: MatchKind::Default,
        matched_token: None,
    }
}
