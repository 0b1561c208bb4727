//! Glob and label filtering shared across discoverers.

use std::collections::HashMap;

/// Whether a filter list's `patterns` names the only acceptable items (`Include`) or the
/// only unacceptable ones (`Exclude`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterType {
    Exclude,
    Include,
}

/// An include/exclude list of exact string items (used for port numbers, job-id
/// prefixes, etc. — callers needing glob matching use [`matches_any_glob`] instead).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterList {
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default = "default_action")]
    pub action: FilterType,
}

fn default_action() -> FilterType {
    FilterType::Include
}

/// Tests whether `item` should be included according to `filter_list`. `None` means no
/// filter configured — always include.
pub fn should_include(filter_list: Option<&FilterList>, item: &str) -> bool {
    let Some(list) = filter_list else {
        return true;
    };
    let contained = list.items.iter().any(|i| i == item);
    match list.action {
        FilterType::Include => contained,
        FilterType::Exclude => !contained,
    }
}

/// Shell-glob filters unit/service names. An empty pattern list accepts everything
/// (systemd, OpenRC, and BSD rc.d discoverers all use this for their `patterns` config).
pub fn matches_any_glob(patterns: &[String], name: &str) -> bool {
    if patterns.is_empty() {
        return true;
    }
    patterns.iter().any(|pattern| {
        glob::Pattern::new(pattern)
            .map(|p| p.matches(name))
            .unwrap_or(false)
    })
}

/// Docker/Podman label filter: accept-all when `filter` is empty; otherwise every
/// key/value pair in `filter` must be present and equal in `labels`.
pub fn matches_labels(filter: &HashMap<String, String>, labels: &HashMap<String, String>) -> bool {
    filter
        .iter()
        .all(|(k, v)| labels.get(k).is_some_and(|actual| actual == v))
}
