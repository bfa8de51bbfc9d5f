//! Synchronous, cache-based module registry.
//!
//! This is the host side of the synchronous stub loader: it resolves a
//! request to a file, consults its cache, and hands the file to the handler
//! registered for the longest matching file-name suffix. Both the resolver
//! and the handlers are replaceable, which is how [`crate::register`]
//! hooks in.

use crate::error::{Error, Result};
use crate::resolver;
use crate::stub::ProxyStub;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Conditions used by the registry's own resolver.
const REQUIRE_CONDITIONS: &[&str] = &["node", "require"];

/// Maps `(request, parent, is_main)` to a file path.
pub type ResolveFilename = Box<dyn Fn(&str, Option<&Module>, bool) -> Result<PathBuf>>;

/// Populates `module.exports` for a resolved file.
pub type ExtensionHandler = Box<dyn Fn(&mut Module, &Path) -> Result<()>>;

/// What loading a module produced.
#[derive(Debug, Clone)]
pub enum Exports {
    /// The file's text, unevaluated.
    Source(String),
    /// A reference stub standing in for the file.
    Stub(Rc<ProxyStub>),
}

impl Exports {
    #[must_use]
    pub fn as_stub(&self) -> Option<&Rc<ProxyStub>> {
        match self {
            Self::Stub(stub) => Some(stub),
            Self::Source(_) => None,
        }
    }
}

/// A loaded module.
#[derive(Debug, Clone)]
pub struct Module {
    pub filename: PathBuf,
    pub exports: Exports,
}

impl Module {
    #[must_use]
    pub fn new(filename: PathBuf) -> Self {
        Self {
            filename,
            exports: Exports::Source(String::new()),
        }
    }
}

/// Synchronous module registry with pluggable resolution and loading.
pub struct ModuleRegistry {
    cwd: PathBuf,
    extensions: HashMap<String, ExtensionHandler>,
    resolve_filename: ResolveFilename,
    cache: HashMap<PathBuf, Rc<Module>>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("cwd", &self.cwd)
            .field("extensions", &self.extensions.keys().collect::<Vec<_>>())
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl ModuleRegistry {
    /// Create a registry resolving entry points relative to `cwd`.
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        let base = cwd.clone();
        let resolve_filename: ResolveFilename = Box::new(move |request, parent, _is_main| {
            let dir = parent
                .and_then(|p| p.filename.parent())
                .unwrap_or(base.as_path());
            let conditions: Vec<String> =
                REQUIRE_CONDITIONS.iter().map(|c| (*c).to_string()).collect();
            resolver::resolve(request, dir, &conditions)
        });

        Self {
            cwd,
            extensions: HashMap::new(),
            resolve_filename,
            cache: HashMap::new(),
        }
    }

    #[must_use]
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Install the handler for files whose name ends with `suffix`.
    pub fn set_extension(&mut self, suffix: impl Into<String>, handler: ExtensionHandler) {
        self.extensions.insert(suffix.into(), handler);
    }

    /// Replace the filename resolver with one built from the current one.
    pub fn replace_resolver(&mut self, wrap: impl FnOnce(ResolveFilename) -> ResolveFilename) {
        let placeholder: ResolveFilename =
            Box::new(|_, _, _| Err(Error::other("resolver is being replaced")));
        let previous = std::mem::replace(&mut self.resolve_filename, placeholder);
        self.resolve_filename = wrap(previous);
    }

    /// Resolve a request without loading it.
    pub fn resolve_filename(&self, request: &str, parent: Option<&Module>) -> Result<PathBuf> {
        (self.resolve_filename)(request, parent, parent.is_none())
    }

    /// Load a module, returning the cached instance when there is one.
    pub fn require(&mut self, request: &str, parent: Option<&Module>) -> Result<Rc<Module>> {
        let filename = self.resolve_filename(request, parent)?;
        if let Some(cached) = self.cache.get(&filename) {
            return Ok(Rc::clone(cached));
        }

        let mut module = Module::new(filename.clone());
        match self.handler_for(&filename) {
            Some(handler) => handler(&mut module, &filename)?,
            None => module.exports = Exports::Source(std::fs::read_to_string(&filename)?),
        }

        let module = Rc::new(module);
        self.cache.insert(filename, Rc::clone(&module));
        Ok(module)
    }

    /// Cached module for a resolved path.
    #[must_use]
    pub fn cached(&self, filename: &Path) -> Option<&Rc<Module>> {
        self.cache.get(filename)
    }

    /// Handler registered for the longest suffix of `filename`.
    fn handler_for(&self, filename: &Path) -> Option<&ExtensionHandler> {
        let name = filename.to_string_lossy();
        self.extensions
            .iter()
            .filter(|(suffix, _)| name.ends_with(suffix.as_str()))
            .max_by_key(|(suffix, _)| suffix.len())
            .map(|(_, handler)| handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_require_reads_source_and_caches() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.js"), "module.exports = 1;").unwrap();

        let mut registry = ModuleRegistry::new(dir.path().to_path_buf());
        let first = registry.require("./a", None).unwrap();
        assert!(matches!(&first.exports, Exports::Source(s) if s == "module.exports = 1;"));

        fs::write(dir.path().join("a.js"), "changed").unwrap();
        let second = registry.require("./a.js", None).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_parent_relative_resolution() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib/a.js"), "a").unwrap();
        fs::write(dir.path().join("lib/b.js"), "b").unwrap();

        let mut registry = ModuleRegistry::new(dir.path().to_path_buf());
        let a = registry.require("./lib/a.js", None).unwrap();
        let b = registry.require("./b", Some(&a)).unwrap();
        assert_eq!(b.filename, dir.path().join("lib/b.js"));
    }

    #[test]
    fn test_longest_suffix_handler_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x.client.js"), "").unwrap();

        let mut registry = ModuleRegistry::new(dir.path().to_path_buf());
        registry.set_extension(
            ".js",
            Box::new(|m, _| {
                m.exports = Exports::Source("js".into());
                Ok(())
            }),
        );
        registry.set_extension(
            ".client.js",
            Box::new(|m, _| {
                m.exports = Exports::Source("client".into());
                Ok(())
            }),
        );

        let module = registry.require("./x.client.js", None).unwrap();
        assert!(matches!(&module.exports, Exports::Source(s) if s == "client"));
    }

    #[test]
    fn test_replace_resolver_wraps_previous() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("real.js"), "").unwrap();

        let mut registry = ModuleRegistry::new(dir.path().to_path_buf());
        registry.replace_resolver(|previous| {
            Box::new(move |request, parent, is_main| {
                let request = if request == "alias" { "./real.js" } else { request };
                previous(request, parent, is_main)
            })
        });

        let resolved = registry.resolve_filename("alias", None).unwrap();
        assert_eq!(resolved, dir.path().join("real.js"));
    }
}
