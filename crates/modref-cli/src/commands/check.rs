use miette::{IntoDiagnostic, Result};
use modref_core::host::{Module, ModuleRegistry};
use modref_core::{register, Config, Error};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct CheckOutput {
    target: String,
    importer: Option<PathBuf>,
    allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Resolve `target` from `from` through the guarded resolver.
///
/// Exits with status 1 when the import crosses the boundary.
pub fn run(config: &Config, target: &str, from: Option<&str>, json: bool) -> Result<()> {
    let mut registry = ModuleRegistry::new(config.cwd.clone());
    register(&mut registry, &config.conventions);

    let importer = from.map(|f| Module::new(config.cwd.join(f)));
    let outcome = registry.resolve_filename(target, importer.as_ref());

    if let Err(e) = &outcome {
        if !matches!(e, Error::BoundaryViolation { .. }) {
            tracing::debug!(target, error = %e, "resolution failed");
        }
    }

    if json {
        let out = match &outcome {
            Ok(resolved) => CheckOutput {
                target: target.to_string(),
                importer: importer.as_ref().map(|m| m.filename.clone()),
                allowed: true,
                resolved: Some(resolved.clone()),
                error: None,
            },
            Err(e) => CheckOutput {
                target: target.to_string(),
                importer: importer.as_ref().map(|m| m.filename.clone()),
                allowed: false,
                resolved: None,
                error: Some(e.to_string()),
            },
        };
        println!("{}", serde_json::to_string_pretty(&out).into_diagnostic()?);
        if outcome.is_err() {
            std::process::exit(1);
        }
        return Ok(());
    }

    let resolved = outcome.into_diagnostic()?;
    println!("ok: {}", resolved.display());
    Ok(())
}
