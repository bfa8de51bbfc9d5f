//! Filesystem module resolution shared by the default pipeline stages.
//!
//! Supports:
//! - Relative specifiers: `./`, `../`
//! - Absolute filesystem specifiers and `file:` URLs
//! - Bare specifiers with `node_modules` lookup
//! - Extension probing and directory `index.*`
//! - package.json `exports` root entries, matched against active conditions

use crate::error::{Error, Result};
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Default extensions for probing.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".js", ".mjs", ".cjs", ".jsx", ".ts", ".tsx", ".json"];

/// Convert a `file:` URL to a filesystem path.
pub fn url_to_path(url: &str) -> Result<PathBuf> {
    let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
    parsed
        .to_file_path()
        .map_err(|()| Error::InvalidUrl(format!("{url}: not a file URL")))
}

/// Convert an absolute path to its `file:` URL.
pub fn path_to_url(path: &Path) -> Result<String> {
    Url::from_file_path(path)
        .map(String::from)
        .map_err(|()| Error::InvalidUrl(path.display().to_string()))
}

/// Remove `.` and resolve `..` components without touching the filesystem.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                result.pop();
            }
            other => result.push(other),
        }
    }
    result
}

/// Resolve `specifier` as imported from a file in `base_dir`.
///
/// `conditions` are matched in order against package.json `exports`
/// condition objects; `default` always matches last.
pub fn resolve(specifier: &str, base_dir: &Path, conditions: &[String]) -> Result<PathBuf> {
    let not_found = || Error::ModuleNotFound {
        specifier: specifier.to_string(),
        parent: base_dir.display().to_string(),
    };

    if specifier.starts_with("file:") {
        let path = url_to_path(specifier)?;
        return resolve_as_file_or_dir(&path, conditions).ok_or_else(not_found);
    }

    if specifier.starts_with("./") || specifier.starts_with("../") || specifier == "." || specifier == ".." {
        let path = normalize_path(&base_dir.join(specifier));
        return resolve_as_file_or_dir(&path, conditions).ok_or_else(not_found);
    }

    if Path::new(specifier).is_absolute() {
        return resolve_as_file_or_dir(Path::new(specifier), conditions).ok_or_else(not_found);
    }

    resolve_bare(specifier, base_dir, conditions).ok_or_else(not_found)
}

fn resolve_as_file_or_dir(path: &Path, conditions: &[String]) -> Option<PathBuf> {
    resolve_as_file(path).or_else(|| resolve_as_dir(path, conditions))
}

fn resolve_as_file(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    let base = path.to_string_lossy();
    DEFAULT_EXTENSIONS
        .iter()
        .map(|ext| PathBuf::from(format!("{base}{ext}")))
        .find(|candidate| candidate.is_file())
}

fn resolve_as_dir(dir: &Path, conditions: &[String]) -> Option<PathBuf> {
    if !dir.is_dir() {
        return None;
    }

    if let Some(pkg) = read_package_json(&dir.join("package.json")) {
        if let Some(entry) = package_entry(&pkg, conditions) {
            if let Some(found) = resolve_as_file(&normalize_path(&dir.join(entry))) {
                return Some(found);
            }
        }
    }

    DEFAULT_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("index{ext}")))
        .find(|candidate| candidate.is_file())
}

/// Split `@scope/name/sub` or `name/sub` into package name and subpath.
fn split_bare(specifier: &str) -> (&str, Option<&str>) {
    let mut idx = specifier.find('/');
    if specifier.starts_with('@') {
        idx = idx.and_then(|first| specifier[first + 1..].find('/').map(|second| first + 1 + second));
    }
    match idx {
        Some(i) => (&specifier[..i], Some(&specifier[i + 1..])),
        None => (specifier, None),
    }
}

fn resolve_bare(specifier: &str, base_dir: &Path, conditions: &[String]) -> Option<PathBuf> {
    let (name, subpath) = split_bare(specifier);

    for dir in base_dir.ancestors() {
        let pkg_dir = dir.join("node_modules").join(name);
        if !pkg_dir.is_dir() {
            continue;
        }
        return match subpath {
            Some(sub) => resolve_as_file_or_dir(&pkg_dir.join(sub), conditions),
            None => resolve_as_dir(&pkg_dir, conditions),
        };
    }

    None
}

/// Read and parse a package.json file.
#[must_use]
pub fn read_package_json(path: &Path) -> Option<Value> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Find the nearest package.json at or above `dir`.
#[must_use]
pub fn find_package_json(dir: &Path) -> Option<(PathBuf, Value)> {
    dir.ancestors().find_map(|d| {
        let candidate = d.join("package.json");
        read_package_json(&candidate).map(|value| (candidate, value))
    })
}

/// Entry point of a package: `exports` root, then `module`, then `main`.
fn package_entry(pkg: &Value, conditions: &[String]) -> Option<String> {
    if let Some(exports) = pkg.get("exports") {
        let root = match exports {
            Value::Object(map) if map.keys().any(|k| k.starts_with('.')) => map.get(".")?,
            other => other,
        };
        if let Some(target) = resolve_export_target(root, conditions) {
            return Some(target);
        }
    }

    ["module", "main"]
        .iter()
        .find_map(|field| pkg.get(*field).and_then(Value::as_str))
        .map(str::to_string)
}

/// Resolve an export target which can be a string or a conditions object.
fn resolve_export_target(target: &Value, conditions: &[String]) -> Option<String> {
    match target {
        Value::String(s) => validate_export_path(s),
        Value::Object(map) => map.iter().find_map(|(key, value)| {
            let active = key == "default" || conditions.iter().any(|c| c == key);
            if active {
                resolve_export_target(value, conditions)
            } else {
                None
            }
        }),
        Value::Array(items) => items
            .iter()
            .find_map(|item| resolve_export_target(item, conditions)),
        _ => None,
    }
}

/// Export targets must be package-relative.
fn validate_export_path(path: &str) -> Option<String> {
    if path.starts_with("./") && !path.contains("/../") {
        Some(path.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn conditions(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_relative_with_extension_probe() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("util.js"), "").unwrap();

        let resolved = resolve("./util", dir.path(), &[]).unwrap();
        assert_eq!(resolved, dir.path().join("util.js"));
    }

    #[test]
    fn test_parent_relative_and_index() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("lib/index.js"), "").unwrap();

        let resolved = resolve("../lib", &dir.path().join("src"), &[]).unwrap();
        assert_eq!(resolved, dir.path().join("lib/index.js"));
    }

    #[test]
    fn test_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.client.js");
        fs::write(&file, "").unwrap();

        let url = path_to_url(&file).unwrap();
        assert!(url.starts_with("file://"));
        assert_eq!(resolve(&url, Path::new("/"), &[]).unwrap(), file);
        assert_eq!(url_to_path(&url).unwrap(), file);
    }

    #[test]
    fn test_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve("./missing", dir.path(), &[]).unwrap_err();
        assert!(matches!(err, Error::ModuleNotFound { .. }));
    }

    #[test]
    fn test_bare_exports_follow_conditions() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules/ui");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(
            pkg.join("package.json"),
            r#"{ "exports": { "react-server": "./server.js", "import": "./client.mjs", "default": "./client.js" } }"#,
        )
        .unwrap();
        fs::write(pkg.join("server.js"), "").unwrap();
        fs::write(pkg.join("client.mjs"), "").unwrap();
        fs::write(pkg.join("client.js"), "").unwrap();

        let server = resolve("ui", dir.path(), &conditions(&["node", "import", "react-server"])).unwrap();
        assert_eq!(server, pkg.join("server.js"));

        let client = resolve("ui", dir.path(), &conditions(&["node", "import"])).unwrap();
        assert_eq!(client, pkg.join("client.mjs"));

        let fallback = resolve("ui", dir.path(), &[]).unwrap();
        assert_eq!(fallback, pkg.join("client.js"));
    }

    #[test]
    fn test_bare_main_and_subpath() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules/@acme/kit");
        fs::create_dir_all(pkg.join("lib")).unwrap();
        fs::write(pkg.join("package.json"), r#"{ "main": "./lib/main.js" }"#).unwrap();
        fs::write(pkg.join("lib/main.js"), "").unwrap();
        fs::write(pkg.join("lib/extra.js"), "").unwrap();

        let nested = dir.path().join("src/deep");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(resolve("@acme/kit", &nested, &[]).unwrap(), pkg.join("lib/main.js"));
        assert_eq!(
            resolve("@acme/kit/lib/extra", &nested, &[]).unwrap(),
            pkg.join("lib/extra.js")
        );
    }

    #[test]
    fn test_split_bare() {
        assert_eq!(split_bare("react"), ("react", None));
        assert_eq!(split_bare("react/jsx-runtime"), ("react", Some("jsx-runtime")));
        assert_eq!(split_bare("@scope/pkg"), ("@scope/pkg", None));
        assert_eq!(split_bare("@scope/pkg/sub/x"), ("@scope/pkg", Some("sub/x")));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/a/b/./../c/d.js")),
            PathBuf::from("/a/c/d.js")
        );
    }
}
