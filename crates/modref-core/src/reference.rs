//! Module references: opaque handles standing in for client modules.
//!
//! A reference says *where* the real module lives and *which* export was
//! requested. It never carries the module's value. Downstream consumers
//! recognise one by its `$$typeof` tag before treating it as real data.

use serde::Serialize;

/// Tag carried by every module reference.
pub const MODULE_REFERENCE_TAG: &str = "react.module.reference";

/// Property holding the tag.
pub const KIND_PROPERTY: &str = "$$typeof";

/// Property holding the module location.
pub const LOCATION_PROPERTY: &str = "filepath";

/// Property holding the export name.
pub const NAME_PROPERTY: &str = "name";

/// Export name standing for the whole module namespace.
pub const NAMESPACE_EXPORT: &str = "*";

/// Export name telling the client to pick the default export or the whole
/// namespace, whichever the module turns out to have.
pub const DEFAULT_OR_NAMESPACE_EXPORT: &str = "";

/// Immutable handle to one export of a client module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ModuleReference {
    #[serde(rename = "$$typeof")]
    kind: String,
    #[serde(rename = "filepath")]
    location: String,
    #[serde(rename = "name")]
    export_name: String,
}

impl ModuleReference {
    #[must_use]
    pub fn new(location: impl Into<String>, export_name: impl Into<String>) -> Self {
        Self {
            kind: MODULE_REFERENCE_TAG.to_string(),
            location: location.into(),
            export_name: export_name.into(),
        }
    }

    /// Reference to the whole module namespace.
    #[must_use]
    pub fn namespace(location: impl Into<String>) -> Self {
        Self::new(location, NAMESPACE_EXPORT)
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[must_use]
    pub fn export_name(&self) -> &str {
        &self.export_name
    }

    #[must_use]
    pub fn is_namespace(&self) -> bool {
        self.export_name == NAMESPACE_EXPORT
    }

    /// Whether a serialized value is a module reference rather than data.
    #[must_use]
    pub fn is_reference(value: &serde_json::Value) -> bool {
        value
            .get(KIND_PROPERTY)
            .and_then(serde_json::Value::as_str)
            .is_some_and(|tag| tag == MODULE_REFERENCE_TAG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let r = ModuleReference::new("file:///app/Button.client.js", "Button");
        let value = serde_json::to_value(&r).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "$$typeof": "react.module.reference",
                "filepath": "file:///app/Button.client.js",
                "name": "Button"
            })
        );
        assert!(ModuleReference::is_reference(&value));
    }

    #[test]
    fn test_plain_objects_are_not_references() {
        assert!(!ModuleReference::is_reference(&serde_json::json!({ "name": "x" })));
        assert!(!ModuleReference::is_reference(
            &serde_json::json!({ "$$typeof": "react.element" })
        ));
        assert!(!ModuleReference::is_reference(&serde_json::json!("react.module.reference")));
    }

    #[test]
    fn test_namespace_reference() {
        let r = ModuleReference::namespace("file:///a.client.js");
        assert!(r.is_namespace());
        assert_eq!(r.kind(), MODULE_REFERENCE_TAG);
        assert_eq!(r.export_name(), "*");
    }
}
