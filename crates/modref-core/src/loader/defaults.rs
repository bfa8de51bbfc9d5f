//! Filesystem-backed default stages.
//!
//! These play the part of the host's own resolve, fetch-source and
//! transform-source stages, so the server loader hooks can run end to end
//! outside of a JavaScript host.

use super::types::{
    FetchContext, FetchSourceFn, Fetched, ModuleFormat, ModuleSource, ResolveContext, ResolveFn,
    Resolved, TransformContext, TransformSourceFn, Transformed,
};
use crate::error::{Error, Result};
use crate::resolver::{self, find_package_json, path_to_url, url_to_path};
use futures::FutureExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Prefix of built-in module specifiers.
const BUILTIN_PREFIX: &str = "node:";

/// The three default stages handed to each hook.
#[derive(Clone)]
pub struct DefaultStages {
    pub resolve: ResolveFn,
    pub fetch_source: FetchSourceFn,
    pub transform_source: TransformSourceFn,
}

impl std::fmt::Debug for DefaultStages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultStages").finish_non_exhaustive()
    }
}

impl DefaultStages {
    /// Stages reading from disk, resolving entry points against `cwd`.
    #[must_use]
    pub fn filesystem(cwd: PathBuf) -> Self {
        Self {
            resolve: resolve_fn(cwd),
            fetch_source: fetch_source_fn(),
            transform_source: transform_source_fn(),
        }
    }

    /// Replace the transform stage.
    #[must_use]
    pub fn with_transform_source(mut self, transform_source: TransformSourceFn) -> Self {
        self.transform_source = transform_source;
        self
    }
}

/// Default resolve stage.
#[must_use]
pub fn resolve_fn(cwd: PathBuf) -> ResolveFn {
    Arc::new(move |specifier: String, context: ResolveContext| {
        let cwd = cwd.clone();
        async move { resolve_url(&specifier, &context, &cwd) }.boxed()
    })
}

fn resolve_url(specifier: &str, context: &ResolveContext, cwd: &Path) -> Result<Resolved> {
    if specifier.starts_with(BUILTIN_PREFIX) {
        return Ok(Resolved {
            url: specifier.to_string(),
        });
    }

    let base_dir = match &context.parent_url {
        Some(parent) => url_to_path(parent)?
            .parent()
            .map_or_else(|| cwd.to_path_buf(), Path::to_path_buf),
        None => cwd.to_path_buf(),
    };

    let path = resolver::resolve(specifier, &base_dir, &context.conditions)?;
    let path = dunce::canonicalize(&path).unwrap_or(path);
    Ok(Resolved {
        url: path_to_url(&path)?,
    })
}

/// Default fetch-source stage.
#[must_use]
pub fn fetch_source_fn() -> FetchSourceFn {
    Arc::new(|url: String, context: FetchContext| fetch_source(url, context).boxed())
}

async fn fetch_source(url: String, context: FetchContext) -> Result<Fetched> {
    let path = url_to_path(&url)?;
    let bytes = tokio::fs::read(&path).await?;
    let source = if context.format == Some(ModuleFormat::Wasm) {
        ModuleSource::Binary(bytes)
    } else {
        match String::from_utf8(bytes) {
            Ok(text) => ModuleSource::Text(text),
            Err(e) => ModuleSource::Binary(e.into_bytes()),
        }
    };
    Ok(Fetched { source })
}

/// Default transform-source stage: returns the source unchanged.
#[must_use]
pub fn transform_source_fn() -> TransformSourceFn {
    Arc::new(|source: ModuleSource, _context: TransformContext| {
        futures::future::ready(Ok::<_, Error>(Transformed { source })).boxed()
    })
}

/// Format of the module at `url`.
///
/// `.js` files count as ES modules unless the nearest package.json says
/// `"type": "commonjs"`.
#[must_use]
pub fn detect_format(url: &str) -> Option<ModuleFormat> {
    if url.starts_with(BUILTIN_PREFIX) {
        return Some(ModuleFormat::Builtin);
    }

    let path = url_to_path(url).ok()?;
    match path.extension().and_then(|e| e.to_str())? {
        "mjs" => Some(ModuleFormat::Module),
        "cjs" => Some(ModuleFormat::CommonJs),
        "json" => Some(ModuleFormat::Json),
        "wasm" => Some(ModuleFormat::Wasm),
        "js" | "jsx" => {
            let commonjs = path
                .parent()
                .and_then(find_package_json)
                .and_then(|(_, pkg)| pkg.get("type").and_then(|t| t.as_str()).map(|t| t == "commonjs"))
                .unwrap_or(false);
            Some(if commonjs {
                ModuleFormat::CommonJs
            } else {
                ModuleFormat::Module
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_filesystem_stages() {
        let dir = tempfile::tempdir().unwrap();
        let root = dunce::canonicalize(dir.path()).unwrap();
        fs::write(root.join("a.js"), "export const a = 1;").unwrap();

        let stages = DefaultStages::filesystem(root.clone());
        let resolved = (stages.resolve)("./a".into(), ResolveContext::default())
            .await
            .unwrap();
        assert_eq!(resolved.url, path_to_url(&root.join("a.js")).unwrap());

        let fetched = (stages.fetch_source)(resolved.url.clone(), FetchContext::default())
            .await
            .unwrap();
        assert_eq!(fetched.source.as_text(), Some("export const a = 1;"));

        let transformed = (stages.transform_source)(
            fetched.source,
            TransformContext {
                format: Some(ModuleFormat::Module),
                url: resolved.url,
            },
        )
        .await
        .unwrap();
        assert_eq!(transformed.source.as_text(), Some("export const a = 1;"));
    }

    #[tokio::test]
    async fn test_resolve_relative_to_parent_url() {
        let dir = tempfile::tempdir().unwrap();
        let root = dunce::canonicalize(dir.path()).unwrap();
        fs::create_dir_all(root.join("lib")).unwrap();
        fs::write(root.join("lib/x.js"), "").unwrap();
        fs::write(root.join("lib/y.js"), "").unwrap();

        let resolve = resolve_fn(PathBuf::from("/nonexistent"));
        let parent = path_to_url(&root.join("lib/x.js")).unwrap();
        let resolved = resolve("./y.js".into(), ResolveContext::new(vec![], Some(parent)))
            .await
            .unwrap();
        assert!(resolved.url.ends_with("/lib/y.js"));
    }

    #[tokio::test]
    async fn test_builtin_passthrough() {
        let resolve = resolve_fn(PathBuf::from("/"));
        let resolved = resolve("node:fs".into(), ResolveContext::default())
            .await
            .unwrap();
        assert_eq!(resolved.url, "node:fs");
        assert_eq!(detect_format("node:fs"), Some(ModuleFormat::Builtin));
    }

    #[tokio::test]
    async fn test_non_utf8_is_binary() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("blob.js");
        fs::write(&file, [0xff, 0xfe, 0x00]).unwrap();

        let fetched = fetch_source_fn()(path_to_url(&file).unwrap(), FetchContext::default())
            .await
            .unwrap();
        assert_eq!(fetched.source, ModuleSource::Binary(vec![0xff, 0xfe, 0x00]));
    }

    #[test]
    fn test_detect_format() {
        let dir = tempfile::tempdir().unwrap();
        let url = |name: &str| path_to_url(&dir.path().join(name)).unwrap();

        assert_eq!(detect_format(&url("a.mjs")), Some(ModuleFormat::Module));
        assert_eq!(detect_format(&url("a.cjs")), Some(ModuleFormat::CommonJs));
        assert_eq!(detect_format(&url("a.json")), Some(ModuleFormat::Json));
        assert_eq!(detect_format(&url("a.client.js")), Some(ModuleFormat::Module));

        fs::write(dir.path().join("package.json"), r#"{ "type": "commonjs" }"#).unwrap();
        assert_eq!(detect_format(&url("a.client.js")), Some(ModuleFormat::CommonJs));
    }
}
