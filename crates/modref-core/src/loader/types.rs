//! Values passed between pipeline stages.

use crate::error::Result;
use futures::future::BoxFuture;
use serde::Serialize;
use std::sync::Arc;

/// Module format as reported by the host for one load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    Module,
    #[serde(rename = "commonjs")]
    CommonJs,
    Json,
    Wasm,
    Builtin,
}

impl ModuleFormat {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::CommonJs => "commonjs",
            Self::Json => "json",
            Self::Wasm => "wasm",
            Self::Builtin => "builtin",
        }
    }
}

impl std::fmt::Display for ModuleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context for the resolve stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveContext {
    /// Active export conditions, in priority order.
    pub conditions: Vec<String>,
    /// URL of the importing module, if any.
    pub parent_url: Option<String>,
}

impl ResolveContext {
    #[must_use]
    pub fn new(conditions: Vec<String>, parent_url: Option<String>) -> Self {
        Self {
            conditions,
            parent_url,
        }
    }

    #[must_use]
    pub fn has_condition(&self, condition: &str) -> bool {
        self.conditions.iter().any(|c| c == condition)
    }

    /// A copy of this context with `condition` appended.
    #[must_use]
    pub fn with_condition(&self, condition: &str) -> Self {
        let mut conditions = self.conditions.clone();
        conditions.push(condition.to_string());
        Self {
            conditions,
            parent_url: self.parent_url.clone(),
        }
    }
}

/// Result of the resolve stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub url: String,
}

/// Context for the fetch-source stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchContext {
    pub format: Option<ModuleFormat>,
}

/// Module source as produced by fetch or transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleSource {
    Text(String),
    Binary(Vec<u8>),
}

impl ModuleSource {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Binary(_) => None,
        }
    }
}

impl From<String> for ModuleSource {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for ModuleSource {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Result of the fetch-source stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub source: ModuleSource,
}

/// Context for the transform-source stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformContext {
    pub format: Option<ModuleFormat>,
    pub url: String,
}

/// Result of the transform-source stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub source: ModuleSource,
}

/// Next resolve stage.
pub type ResolveFn =
    Arc<dyn Fn(String, ResolveContext) -> BoxFuture<'static, Result<Resolved>> + Send + Sync>;

/// Next fetch-source stage.
pub type FetchSourceFn =
    Arc<dyn Fn(String, FetchContext) -> BoxFuture<'static, Result<Fetched>> + Send + Sync>;

/// Next transform-source stage.
pub type TransformSourceFn = Arc<
    dyn Fn(ModuleSource, TransformContext) -> BoxFuture<'static, Result<Transformed>> + Send + Sync,
>;
