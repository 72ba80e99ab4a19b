use url::form_urlencoded;

/// Derive the cache key for an endpoint and its query parameters.
///
/// Parameters are sorted lexicographically by name before encoding, so two
/// calls with the same pairs in different insertion order yield the same key.
/// With no parameters the key is the endpoint string itself.
pub fn cache_key<'a, I>(endpoint: &str, params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut pairs: Vec<(&str, &str)> = params.into_iter().collect();
    if pairs.is_empty() {
        return endpoint.to_string();
    }
    pairs.sort_unstable();

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("{endpoint}?{query}")
}
