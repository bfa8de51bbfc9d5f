//! Stub source synthesis.
//!
//! A client module, when loaded on the server, is replaced by a module that
//! exports one frozen reference object per discovered export name.

use crate::reference::{KIND_PROPERTY, LOCATION_PROPERTY, MODULE_REFERENCE_TAG, NAME_PROPERTY};
use std::fmt::Write;

const TAG_BINDING: &str = "MODULE_REFERENCE";

/// Generate the replacement source for the client module at `url`.
#[must_use]
pub fn stub_source(names: &[String], url: &str) -> String {
    let mut out = format!(
        "const {TAG_BINDING} = Symbol.for({});\n",
        json_string(MODULE_REFERENCE_TAG)
    );
    let location = json_string(url);

    for (index, name) in names.iter().enumerate() {
        let value = format!(
            "Object.freeze({{ {KIND_PROPERTY}: {TAG_BINDING}, {LOCATION_PROPERTY}: {location}, {NAME_PROPERTY}: {} }})",
            json_string(name)
        );
        if name == "default" {
            let _ = writeln!(out, "export default {value};");
        } else if is_identifier(name) {
            let _ = writeln!(out, "export const {name} = {value};");
        } else {
            let _ = writeln!(out, "const __ref_{index} = {value};");
            let _ = writeln!(out, "export {{ __ref_{index} as {} }};", json_string(name));
        }
    }

    out
}

fn json_string(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

/// Whether `name` can appear as `export const <name>`.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        && !is_reserved(name)
}

fn is_reserved(name: &str) -> bool {
    matches!(
        name,
        "await"
            | "break"
            | "case"
            | "catch"
            | "class"
            | "const"
            | "continue"
            | "debugger"
            | "default"
            | "delete"
            | "do"
            | "else"
            | "enum"
            | "export"
            | "extends"
            | "false"
            | "finally"
            | "for"
            | "function"
            | "if"
            | "implements"
            | "import"
            | "in"
            | "instanceof"
            | "interface"
            | "let"
            | "new"
            | "null"
            | "package"
            | "private"
            | "protected"
            | "public"
            | "return"
            | "static"
            | "super"
            | "switch"
            | "this"
            | "throw"
            | "true"
            | "try"
            | "typeof"
            | "var"
            | "void"
            | "while"
            | "with"
            | "yield"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{scan_exports, ExportEntry};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn exported(source: &str) -> Vec<String> {
        scan_exports(source, "file:///stub.js")
            .unwrap()
            .into_iter()
            .flat_map(|e| match e {
                ExportEntry::Names(n) => n,
                ExportEntry::ReExportAll(_) => Vec::new(),
            })
            .collect()
    }

    #[test]
    fn test_stub_source_shape() {
        let src = stub_source(&names(&["default", "Button"]), "file:///app/Button.client.js");
        assert_eq!(
            src,
            "const MODULE_REFERENCE = Symbol.for(\"react.module.reference\");\n\
             export default Object.freeze({ $$typeof: MODULE_REFERENCE, filepath: \"file:///app/Button.client.js\", name: \"default\" });\n\
             export const Button = Object.freeze({ $$typeof: MODULE_REFERENCE, filepath: \"file:///app/Button.client.js\", name: \"Button\" });\n"
        );
    }

    #[test]
    fn test_stub_source_exports_every_name() {
        let list = names(&["a", "default", "b", "c"]);
        let src = stub_source(&list, "file:///x.client.js");
        assert_eq!(exported(&src), list);
    }

    #[test]
    fn test_no_names() {
        let src = stub_source(&[], "file:///empty.client.js");
        assert_eq!(src.lines().count(), 1);
        assert!(exported(&src).is_empty());
    }

    #[test]
    fn test_non_identifier_names_use_string_exports() {
        let list = names(&["string name", "class", "ok"]);
        let src = stub_source(&list, "file:///x.client.js");
        assert!(src.contains("export { __ref_0 as \"string name\" };"));
        assert!(src.contains("export { __ref_1 as \"class\" };"));
        assert_eq!(exported(&src), list);
    }

    #[test]
    fn test_duplicates_emit_twice() {
        let src = stub_source(&names(&["a", "a"]), "file:///x.client.js");
        assert_eq!(src.matches("export const a = ").count(), 2);
        assert!(scan_exports(&src, "file:///x.client.js").is_err());
    }

    #[test]
    fn test_url_is_escaped() {
        let src = stub_source(&names(&["a"]), "file:///dir/\"quoted\".client.js");
        assert!(src.contains(r#"filepath: "file:///dir/\"quoted\".client.js""#));
        assert_eq!(exported(&src), vec!["a"]);
    }

    #[test]
    fn test_identifier_rules() {
        assert!(is_identifier("$el"));
        assert!(is_identifier("_private"));
        assert!(is_identifier("café"));
        assert!(!is_identifier("1st"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("default"));
    }
}
