//! URL-scoped settings resolution.
//!
//! Settings (credentials, client certificates, anything keyed per
//! registry) are stored in a map whose keys are either literal URLs or
//! nerf-dart scope keys. Resolution finds the most specific entry that
//! applies to a request URL.

use crate::error::Result;
use crate::url::ParsedUri;
use std::collections::HashMap;

/// Find the most specific setting that applies to a URL.
///
/// The match strategies are ordered, most specific first:
///
/// 1. An exact match on the raw URL string (query string included).
/// 2. Nerf-dart scope keys, walked from the deepest path prefix down to
///    the bare `//host[:port]/` form.
/// 3. When the URL carries an explicit port, the whole lookup is
///    repeated with the port removed, so entries keyed without a port
///    still apply.
///
/// Returns `Ok(None)` when the map is absent, empty, or has no
/// applicable entry.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use network_config_rs::pick_setting_by_url;
///
/// let mut settings = HashMap::new();
/// settings.insert("//example.com/".to_string(), "setting");
///
/// let found = pick_setting_by_url(Some(&settings), "https://example.com/path/to/resource");
/// assert_eq!(found.unwrap(), Some(&"setting"));
/// ```
pub fn pick_setting_by_url<'a, T>(
    generic: Option<&'a HashMap<String, T>>,
    uri: &str,
) -> Result<Option<&'a T>> {
    let Some(map) = generic else {
        return Ok(None);
    };
    if map.is_empty() {
        return Ok(None);
    }

    if let Some(setting) = map.get(uri) {
        return Ok(Some(setting));
    }

    let parsed = ParsedUri::parse(uri)?;

    // Bound the walk by the deepest key in the map. This is purely a
    // performance bound; a deeper walk would test keys that cannot
    // exist.
    let max_parts = get_max_parts(map.keys());
    let parts: Vec<&str> = parsed.nerf.split('/').collect();

    // Candidates from deepest to shallowest. Three segments is the
    // floor: joining `["", "", "host"]` yields the `//host/` scope root.
    let mut i = parts.len().min(max_parts).saturating_sub(1);
    while i >= 3 {
        let candidate = format!("{}/", parts[..i].join("/"));
        if let Some(setting) = map.get(&candidate) {
            return Ok(Some(setting));
        }
        i -= 1;
    }

    if parsed.without_port != uri {
        return pick_setting_by_url(generic, &parsed.without_port);
    }

    Ok(None)
}

/// The maximum `/`-delimited depth across settings keys.
fn get_max_parts<'a>(keys: impl Iterator<Item = &'a String>) -> usize {
    keys.map(|key| key.split('/').count()).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_absent_map() {
        let result = pick_setting_by_url::<String>(None, "https://example.com").unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_empty_map() {
        let map: HashMap<String, String> = HashMap::new();
        let result = pick_setting_by_url(Some(&map), "https://example.com").unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_exact_raw_url_match() {
        let map = settings(&[("https://example.com/", "ExampleSetting")]);
        let result = pick_setting_by_url(Some(&map), "https://example.com/").unwrap();
        assert_eq!(result.map(String::as_str), Some("ExampleSetting"));
    }

    #[test]
    fn test_nerf_dart_match() {
        let map = settings(&[("//example.com/", "NerfDartSetting")]);
        let result =
            pick_setting_by_url(Some(&map), "https://example.com/path/to/resource").unwrap();
        assert_eq!(result.map(String::as_str), Some("NerfDartSetting"));
    }

    #[test]
    fn test_raw_url_match_beats_scope_key() {
        let map = settings(&[
            ("https://example.com/a/b?write=true", "RawMatch"),
            ("//example.com/a/", "ScopeMatch"),
        ]);
        let result = pick_setting_by_url(Some(&map), "https://example.com/a/b?write=true").unwrap();
        assert_eq!(result.map(String::as_str), Some("RawMatch"));
    }

    #[test]
    fn test_deeper_scope_key_wins() {
        let map = settings(&[
            ("//example.com/", "Shallow"),
            ("//example.com/npm/", "Deep"),
        ]);
        let result = pick_setting_by_url(Some(&map), "https://example.com/npm/package").unwrap();
        assert_eq!(result.map(String::as_str), Some("Deep"));
    }

    #[test]
    fn test_without_port_exact_match() {
        let map = settings(&[("https://example.com/path/to/resource/", "WithoutPortSetting")]);
        let result =
            pick_setting_by_url(Some(&map), "https://example.com:8080/path/to/resource").unwrap();
        assert_eq!(result.map(String::as_str), Some("WithoutPortSetting"));
    }

    #[test]
    fn test_without_port_recursion() {
        let map = settings(&[("https://example.com/", "RecursiveSetting")]);
        let result = pick_setting_by_url(Some(&map), "https://example.com:8080").unwrap();
        assert_eq!(result.map(String::as_str), Some("RecursiveSetting"));
    }

    #[test]
    fn test_host_with_port_scope_key() {
        let map = settings(&[("//example.com:8080/", "PortScoped")]);
        let result = pick_setting_by_url(Some(&map), "https://example.com:8080/pkg").unwrap();
        assert_eq!(result.map(String::as_str), Some("PortScoped"));
    }

    #[test]
    fn test_no_match() {
        let map = settings(&[("https://example.com/", "ExampleSetting")]);
        let result = pick_setting_by_url(Some(&map), "https://nomatch.com").unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_invalid_url_propagates() {
        let map = settings(&[("//example.com/", "x")]);
        assert!(pick_setting_by_url(Some(&map), "not a url").is_err());
    }

    #[test]
    fn test_get_max_parts() {
        let map = settings(&[("//example.com/", "a"), ("//example.com/a/b/", "b")]);
        assert_eq!(get_max_parts(map.keys()), 6);
    }
}
