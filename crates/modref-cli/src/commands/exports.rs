use super::{current_thread_runtime, host_pipeline};
use miette::{IntoDiagnostic, Result};
use modref_core::{Config, ServerLoader};
use serde::Serialize;

#[derive(Serialize)]
struct ExportsOutput {
    url: String,
    exports: Vec<String>,
}

/// Print the export names discovery finds for `file`.
pub fn run(config: &Config, file: &str, conditions: &[String], json: bool) -> Result<()> {
    let (stages, context) = host_pipeline(config, conditions);
    let loader = ServerLoader::new(config.conventions.clone());

    let runtime = current_thread_runtime()?;
    let (url, exports) = runtime
        .block_on(loader.exports(file, context, &stages))
        .into_diagnostic()?;

    if json {
        let out = serde_json::to_string_pretty(&ExportsOutput { url, exports }).into_diagnostic()?;
        println!("{out}");
    } else {
        for name in &exports {
            println!("{name}");
        }
    }
    Ok(())
}
