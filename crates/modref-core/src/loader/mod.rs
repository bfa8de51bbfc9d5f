//! Asynchronous loader hooks.
//!
//! Three hooks wrap the host's resolve, fetch-source and transform-source
//! stages. Each receives the next stage as an argument and forwards to it.
//! Client modules come out of the transform stage replaced by generated
//! reference-stub source.

pub mod defaults;
pub mod state;
pub mod types;

pub use defaults::{detect_format, DefaultStages};
pub use state::LoaderState;
pub use types::{
    FetchContext, FetchSourceFn, Fetched, ModuleFormat, ModuleSource, ResolveContext, ResolveFn,
    Resolved, TransformContext, TransformSourceFn, Transformed,
};

use crate::config::Conventions;
use crate::discovery::{discover_exports, DiscoveryContext};
use crate::error::{Error, Result};
use crate::synth::stub_source;
use serde::Serialize;
use std::sync::{Arc, OnceLock};

const MISSING_CONDITION_WARNING: &str = "You did not run Node.js with the `--conditions react-server` flag. \
     Any \"react-server\" override will only work with ESM imports.";

/// Server-side loader: the three hooks plus the state they share.
#[derive(Debug, Clone)]
pub struct ServerLoader {
    state: Arc<LoaderState>,
    conventions: Arc<Conventions>,
}

impl Default for ServerLoader {
    fn default() -> Self {
        Self::new(Conventions::default())
    }
}

/// A module run through all three stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedModule {
    pub url: String,
    pub format: Option<ModuleFormat>,
    #[serde(skip)]
    pub source: ModuleSource,
}

impl ServerLoader {
    #[must_use]
    pub fn new(conventions: Conventions) -> Self {
        Self::with_state(Arc::new(LoaderState::new()), conventions)
    }

    /// Build a loader around existing state.
    #[must_use]
    pub fn with_state(state: Arc<LoaderState>, conventions: Conventions) -> Self {
        Self {
            state,
            conventions: Arc::new(conventions),
        }
    }

    #[must_use]
    pub fn state(&self) -> &Arc<LoaderState> {
        &self.state
    }

    #[must_use]
    pub fn conventions(&self) -> &Conventions {
        &self.conventions
    }

    /// Resolve hook.
    ///
    /// Adds the restricted condition when the host did not supply it,
    /// warning the first time, and captures `next` for export discovery.
    pub async fn resolve(
        &self,
        specifier: String,
        context: ResolveContext,
        next: ResolveFn,
    ) -> Result<Resolved> {
        let condition = self.conventions.restricted_condition.as_str();
        let context = if context.has_condition(condition) {
            context
        } else {
            if self.state.take_missing_condition_warning() {
                tracing::warn!("{MISSING_CONDITION_WARNING}");
            }
            context.with_condition(condition)
        };

        self.state.stash_resolve(Arc::clone(&next));
        next(specifier, context).await
    }

    /// Fetch-source hook. Only captures `next`.
    pub async fn fetch_source(
        &self,
        url: String,
        context: FetchContext,
        next: FetchSourceFn,
    ) -> Result<Fetched> {
        self.state.stash_fetch_source(Arc::clone(&next));
        next(url, context).await
    }

    /// Transform-source hook.
    ///
    /// Runs `next` first. ES modules named like client modules then have
    /// their exports discovered and their source replaced with stub source.
    pub async fn transform_source(
        &self,
        source: ModuleSource,
        context: TransformContext,
        next: TransformSourceFn,
    ) -> Result<Transformed> {
        let url = context.url.clone();
        let format = context.format;
        let transformed = next(source, context).await?;

        if format != Some(ModuleFormat::Module) || !self.conventions.is_client_module(&url) {
            return Ok(transformed);
        }

        let Some(text) = transformed.source.as_text() else {
            return Err(Error::NonTextualSource { url });
        };

        let cx = DiscoveryContext {
            state: &self.state,
            client_conditions: &self.conventions.client_conditions,
            transform_source: next,
        };
        let names = discover_exports(text, &url, &cx).await?;
        tracing::debug!(%url, exports = names.len(), "generated reference stub");

        Ok(Transformed {
            source: ModuleSource::Text(stub_source(&names, &url)),
        })
    }

    /// Drive `specifier` through resolve, fetch-source and transform-source
    /// with `stages` as the next stage of each hook. `context` is what the
    /// host would hand to the resolve hook.
    pub async fn load(
        &self,
        specifier: &str,
        context: ResolveContext,
        stages: &DefaultStages,
    ) -> Result<LoadedModule> {
        let (url, format, source) = self.resolve_and_fetch(specifier, context, stages).await?;
        let transformed = self
            .transform_source(
                source,
                TransformContext {
                    format,
                    url: url.clone(),
                },
                Arc::clone(&stages.transform_source),
            )
            .await?;

        Ok(LoadedModule {
            url,
            format,
            source: transformed.source,
        })
    }

    /// Export names of `specifier` as discovery sees them, whether or not it
    /// is a client module. Returns the resolved URL alongside.
    pub async fn exports(
        &self,
        specifier: &str,
        context: ResolveContext,
        stages: &DefaultStages,
    ) -> Result<(String, Vec<String>)> {
        let (url, format, source) = self.resolve_and_fetch(specifier, context, stages).await?;
        let transformed = (stages.transform_source)(
            source,
            TransformContext {
                format,
                url: url.clone(),
            },
        )
        .await?;
        let Some(text) = transformed.source.as_text() else {
            return Err(Error::NonTextualSource { url });
        };

        let cx = DiscoveryContext {
            state: &self.state,
            client_conditions: &self.conventions.client_conditions,
            transform_source: Arc::clone(&stages.transform_source),
        };
        let names = discover_exports(text, &url, &cx).await?;
        Ok((url, names))
    }

    async fn resolve_and_fetch(
        &self,
        specifier: &str,
        context: ResolveContext,
        stages: &DefaultStages,
    ) -> Result<(String, Option<ModuleFormat>, ModuleSource)> {
        let resolved = self
            .resolve(specifier.to_string(), context, Arc::clone(&stages.resolve))
            .await?;

        let format = detect_format(&resolved.url);
        let fetched = self
            .fetch_source(
                resolved.url.clone(),
                FetchContext { format },
                Arc::clone(&stages.fetch_source),
            )
            .await?;

        Ok((resolved.url, format, fetched.source))
    }
}

static GLOBAL_LOADER: OnceLock<ServerLoader> = OnceLock::new();

/// The process-wide loader behind the free hook functions.
pub fn global_loader() -> &'static ServerLoader {
    GLOBAL_LOADER.get_or_init(ServerLoader::default)
}

/// Install `loader` as the process-wide loader.
///
/// Returns the loader back if one was already installed.
pub fn install_global_loader(loader: ServerLoader) -> std::result::Result<(), ServerLoader> {
    GLOBAL_LOADER.set(loader)
}

/// Resolve hook on the process-wide loader.
pub async fn resolve(
    specifier: String,
    context: ResolveContext,
    default_resolve: ResolveFn,
) -> Result<Resolved> {
    global_loader()
        .resolve(specifier, context, default_resolve)
        .await
}

/// Fetch-source hook on the process-wide loader.
pub async fn fetch_source(
    url: String,
    context: FetchContext,
    default_fetch_source: FetchSourceFn,
) -> Result<Fetched> {
    global_loader()
        .fetch_source(url, context, default_fetch_source)
        .await
}

/// Transform-source hook on the process-wide loader.
pub async fn transform_source(
    source: ModuleSource,
    context: TransformContext,
    default_transform_source: TransformSourceFn,
) -> Result<Transformed> {
    global_loader()
        .transform_source(source, context, default_transform_source)
        .await
}
