use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single AI service the launcher can target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Unique short key, e.g. "chatgpt"
    pub id: String,
    /// Display name, e.g. "ChatGPT"
    pub name: String,
    /// Search URL with a single `%s` placeholder for the encoded query
    pub url_template: String,
    /// Query-less landing page
    pub base_url: String,
    /// Display glyph
    pub icon: String,
    /// Hex color hint for display
    pub color: String,
    /// One-line description shown in suggestions
    pub description: String,
    /// Primary match keywords, in priority order
    pub keywords: Vec<String>,
    /// Short aliases, matched after keywords
    pub aliases: Vec<String>,
}

impl ServiceDescriptor {
    /// All tokens that can prefix an input to select this service,
    /// keywords first, then aliases, in declared order
    pub fn match_tokens(&self) -> impl Iterator<Item = &str> {
        self.keywords
            .iter()
            .chain(self.aliases.iter())
            .map(String::as_str)
    }

    /// Preferred short token used when generating fill text
    pub fn first_alias(&self) -> &str {
        self.aliases.first().map(String::as_str).unwrap_or(&self.id)
    }
}

/// Ordered collection of service descriptors
///
/// Iteration order is definition order, which is also the priority order
/// for prefix matching.
#[derive(Debug, Clone)]
pub struct Registry {
    services: Vec<ServiceDescriptor>,
}

impl Registry {
    /// Build a registry, rejecting duplicate ids and duplicate match tokens
    pub fn new(services: Vec<ServiceDescriptor>) -> Result<Self> {
        let mut seen_ids = HashSet::new();
        let mut seen_tokens = HashSet::new();

        for service in &services {
            if !seen_ids.insert(service.id.clone()) {
                bail!("duplicate service id: {}", service.id);
            }
            for token in service.match_tokens() {
                let token = token.to_lowercase();
                if !seen_tokens.insert(token.clone()) {
                    bail!("match token '{}' declared by more than one service", token);
                }
            }
        }

        Ok(Self { services })
    }

    /// Look up a service by id
    pub fn get(&self, id: &str) -> Option<&ServiceDescriptor> {
        self.services.iter().find(|s| s.id == id)
    }

    /// Iterate services in definition order
    pub fn iter(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.services.iter()
    }

    /// Number of registered services
    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

fn descriptor(
    id: &str,
    name: &str,
    url_template: &str,
    base_url: &str,
    icon: &str,
    color: &str,
    description: &str,
    keywords: &[&str],
    aliases: &[&str],
) -> ServiceDescriptor {
    ServiceDescriptor {
        id: id.to_string(),
        name: name.to_string(),
        url_template: url_template.to_string(),
        base_url: base_url.to_string(),
        icon: icon.to_string(),
        color: color.to_string(),
        description: description.to_string(),
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
        aliases: aliases.iter().map(|s| s.to_string()).collect(),
    }
}

/// The built-in service table
///
/// Fixed for the lifetime of the process; adding a service means a new
/// build, not runtime data.
pub fn builtin_registry() -> Registry {
    let services = vec![
        descriptor(
            "chatgpt",
            "ChatGPT",
            "https://chatgpt.com/?q=%s",
            "https://chatgpt.com/",
            "💬",
            "#10a37f",
            "Conversational AI & coding help",
            &["gpt", "chatgpt", "openai"],
            &["g", "chat", "gpt4"],
        ),
        descriptor(
            "copilot",
            "GitHub Copilot",
            "https://copilot.microsoft.com/?q=%s",
            "https://copilot.microsoft.com/",
            "🤖",
            "#0078d4",
            "Web search & real-time info",
            &["copilot", "microsoft", "bing"],
            &["co", "pilot", "ms"],
        ),
        descriptor(
            "claude",
            "Claude AI",
            "https://claude.ai/new?query=%s",
            "https://claude.ai/",
            "🧠",
            "#cc785c",
            "Thoughtful analysis & reasoning",
            &["claude", "anthropic"],
            &["c", "ant", "claude3"],
        ),
        descriptor(
            "perplexity",
            "Perplexity",
            "https://www.perplexity.ai/search?q=%s",
            "https://www.perplexity.ai/",
            "🔎",
            "#20b2aa",
            "AI search with sources",
            &["perplexity", "ppl", "search"],
            &["p", "px", "pplx"],
        ),
    ];

    // The built-in table is validated by tests; construction cannot fail
    // for a table that passed them.
    Registry { services }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_is_valid() {
        let registry = builtin_registry();
        assert!(Registry::new(registry.services.clone()).is_ok());
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_builtin_tokens_pairwise_distinct() {
        let registry = builtin_registry();
        let mut seen = HashSet::new();
        for service in registry.iter() {
            for token in service.match_tokens() {
                assert!(
                    seen.insert(token.to_lowercase()),
                    "token '{}' is declared twice",
                    token
                );
            }
        }
    }

    #[test]
    fn test_duplicate_token_rejected() {
        let services = vec![
            descriptor(
                "a",
                "A",
                "https://a.example/?q=%s",
                "https://a.example/",
                "",
                "#000000",
                "",
                &["shared"],
                &[],
            ),
            descriptor(
                "b",
                "B",
                "https://b.example/?q=%s",
                "https://b.example/",
                "",
                "#000000",
                "",
                &[],
                &["shared"],
            ),
        ];
        assert!(Registry::new(services).is_err());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let services = vec![
            descriptor(
                "same",
                "A",
                "https://a.example/?q=%s",
                "https://a.example/",
                "",
                "#000000",
                "",
                &["one"],
                &[],
            ),
            descriptor(
                "same",
                "B",
                "https://b.example/?q=%s",
                "https://b.example/",
                "",
                "#000000",
                "",
                &["two"],
                &[],
            ),
        ];
        assert!(Registry::new(services).is_err());
    }

    #[test]
    fn test_match_tokens_keywords_before_aliases() {
        let registry = builtin_registry();
        let chatgpt = registry.get("chatgpt").unwrap();
        let tokens: Vec<&str> = chatgpt.match_tokens().collect();
        assert_eq!(tokens, vec!["gpt", "chatgpt", "openai", "g", "chat", "gpt4"]);
    }

    #[test]
    fn test_first_alias() {
        let registry = builtin_registry();
        assert_eq!(registry.get("claude").unwrap().first_alias(), "c");
        assert_eq!(registry.get("chatgpt").unwrap().first_alias(), "g");
    }

    #[test]
    fn test_get_unknown_id() {
        let registry = builtin_registry();
        assert!(registry.get("gemini").is_none());
    }
}
