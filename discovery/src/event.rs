//! Event category inference.
//!
//! The event bus and its full type taxonomy live in the owning daemon, outside this
//! crate. This module only infers a category prefix from an event-type string:
//! `ProcessStarted` -> `process`, `MeshNodeUp` -> `mesh`, `K8sPodCreated` -> `kubernetes`,
//! `SystemHighCPU` -> `system`, `DaemonStarted` -> `daemon`.

/// Infers the category prefix (`process`, `mesh`, `kubernetes`, `system`, `daemon`) an
/// event type belongs to, from its `PascalCase` variant name. Recognizes the
/// `K8s`-prefixed spelling specially (it maps to `kubernetes`, not `k8s`); falls back to
/// lowercasing the leading run of alphabetic characters for any other name.
pub fn category_for_event_type(event_type: &str) -> String {
    if event_type.starts_with("K8s") {
        return "kubernetes".to_string();
    }
    let mut chars = event_type.chars();
    let mut word = String::new();
    if let Some(first) = chars.next() {
        word.push(first);
    }
    for c in chars {
        if c.is_ascii_uppercase() {
            break;
        }
        word.push(c);
    }
    word.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_event_types_to_categories() {
        assert_eq!(category_for_event_type("ProcessStarted"), "process");
        assert_eq!(category_for_event_type("MeshNodeUp"), "mesh");
        assert_eq!(category_for_event_type("K8sPodCreated"), "kubernetes");
        assert_eq!(category_for_event_type("SystemHighCPU"), "system");
        assert_eq!(category_for_event_type("DaemonStarted"), "daemon");
    }
}
