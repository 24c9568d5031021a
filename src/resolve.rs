use thiserror::Error;

use crate::services::Registry;

/// Placeholder replaced by the encoded query in a service URL template
pub const QUERY_PLACEHOLDER: &str = "%s";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unknown service '{0}'")]
    UnknownService(String),
    #[error("no services registered")]
    EmptyRegistry,
}

/// Build the destination URL for a service and query.
///
/// The query is percent-encoded (space becomes `%20`, reserved characters
/// escaped) and substituted at the template's `%s` placeholder. An empty
/// query substitutes an empty string, which still yields a loadable URL.
pub fn resolve(service_id: &str, query: &str, registry: &Registry) -> Result<String, ResolveError> {
    let service = registry
        .get(service_id)
        .ok_or_else(|| ResolveError::UnknownService(service_id.to_string()))?;

    let encoded = urlencoding::encode(query);
    Ok(service.url_template.replace(QUERY_PLACEHOLDER, &encoded))
}

/// Resolve against `service_id`, degrading to the default service when
/// the id is unknown, and to the registry's first service when the
/// stored default is itself stale. Navigation is never abandoned over a
/// bad id; only an empty registry fails.
///
/// Returns the URL together with the id actually used, so the caller can
/// attribute the search correctly in the usage ledger.
pub fn resolve_or_default(
    service_id: &str,
    query: &str,
    registry: &Registry,
    default_service: &str,
) -> Result<(String, String), ResolveError> {
    if let Ok(url) = resolve(service_id, query, registry) {
        return Ok((url, service_id.to_string()));
    }
    if let Ok(url) = resolve(default_service, query, registry) {
        return Ok((url, default_service.to_string()));
    }
    let first = registry.iter().next().ok_or(ResolveError::EmptyRegistry)?;
    let url = resolve(&first.id, query, registry)?;
    Ok((url, first.id.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::builtin_registry;

    #[test]
    fn test_resolve_substitutes_encoded_query() {
        let registry = builtin_registry();
        let url = resolve("claude", "explain recursion", &registry).unwrap();
        assert_eq!(url, "https://claude.ai/new?query=explain%20recursion");
    }

    #[test]
    fn test_resolve_escapes_reserved_characters() {
        let registry = builtin_registry();
        let query = "a&b=c";
        let url = resolve("chatgpt", query, &registry).unwrap();

        assert!(!url.contains("a&b"));

        // Round trip: decoding the query segment recovers the original
        let encoded = url.strip_prefix("https://chatgpt.com/?q=").unwrap();
        let decoded = urlencoding::decode(encoded).unwrap();
        assert_eq!(decoded, query);
    }

    #[test]
    fn test_resolve_empty_query() {
        let registry = builtin_registry();
        let url = resolve("perplexity", "", &registry).unwrap();
        assert_eq!(url, "https://www.perplexity.ai/search?q=");
    }

    #[test]
    fn test_resolve_unknown_service() {
        let registry = builtin_registry();
        let err = resolve("gemini", "hi", &registry).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownService(_)));
    }

    #[test]
    fn test_resolve_or_default_falls_back() {
        let registry = builtin_registry();
        let (url, used) = resolve_or_default("gemini", "hi there", &registry, "chatgpt").unwrap();
        assert_eq!(used, "chatgpt");
        assert_eq!(url, "https://chatgpt.com/?q=hi%20there");
    }

    #[test]
    fn test_resolve_or_default_stale_default_uses_first_service() {
        let registry = builtin_registry();
        let (url, used) =
            resolve_or_default("gemini", "plain question", &registry, "retired").unwrap();
        assert_eq!(used, "chatgpt");
        assert_eq!(url, "https://chatgpt.com/?q=plain%20question");
    }

    #[test]
    fn test_resolve_or_default_empty_registry_fails() {
        let registry = Registry::new(Vec::new()).unwrap();
        let err = resolve_or_default("a", "q", &registry, "b").unwrap_err();
        assert!(matches!(err, ResolveError::EmptyRegistry));
    }

    #[test]
    fn test_resolve_or_default_known_service_untouched() {
        let registry = builtin_registry();
        let (url, used) = resolve_or_default("claude", "hi", &registry, "chatgpt").unwrap();
        assert_eq!(used, "claude");
        assert!(url.starts_with("https://claude.ai/"));
    }

    #[test]
    fn test_resolve_unicode_query() {
        let registry = builtin_registry();
        let url = resolve("claude", "café ☕", &registry).unwrap();
        let encoded = url.strip_prefix("https://claude.ai/new?query=").unwrap();
        let decoded = urlencoding::decode(encoded).unwrap();
        assert_eq!(decoded, "café ☕");
    }
}
