use url::form_urlencoded::Serializer;
use vacscan_core::Query;

/// Name of the repeated key the upstream expects for each professional role.
pub const PROFESSIONAL_ROLE_KEY: &str = "professional_role";

/// Encode a query into its canonical URL query string.
///
/// Professional roles come first as repeated `professional_role=<v>` pairs,
/// followed by the scalar filters in insertion order. The same string seeds
/// the cache key, so the output must stay order-stable.
pub fn encode_query(query: &Query) -> String {
    let mut serializer = Serializer::new(String::new());

    for role in query.professional_roles() {
        serializer.append_pair(PROFESSIONAL_ROLE_KEY, role);
    }
    for (name, value) in query.params() {
        serializer.append_pair(name, value);
    }

    serializer.finish()
}

/// Append a `page` parameter to a canonical query string.
pub fn with_page(canonical: &str, page: u32) -> String {
    if canonical.is_empty() {
        format!("page={page}")
    } else {
        format!("{canonical}&page={page}")
    }
}
