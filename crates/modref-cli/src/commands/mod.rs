pub mod check;
pub mod exports;
pub mod require;
pub mod stub;
pub mod version;

use miette::{IntoDiagnostic, Result};
use modref_core::loader::{DefaultStages, ResolveContext};
use modref_core::Config;

/// Conditions a plain `node` ESM resolution starts with.
const HOST_CONDITIONS: &[&str] = &["node", "import"];

/// Filesystem stages plus the initial resolve context for a CLI load.
pub(crate) fn host_pipeline(config: &Config, conditions: &[String]) -> (DefaultStages, ResolveContext) {
    let stages = DefaultStages::filesystem(config.cwd.clone());
    let mut active: Vec<String> = HOST_CONDITIONS.iter().map(ToString::to_string).collect();
    active.extend(conditions.iter().cloned());
    (stages, ResolveContext::new(active, None))
}

pub(crate) fn current_thread_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .into_diagnostic()
}
