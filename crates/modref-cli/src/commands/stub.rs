use super::{current_thread_runtime, host_pipeline};
use miette::{miette, IntoDiagnostic, Result};
use modref_core::loader::ModuleFormat;
use modref_core::{Config, ServerLoader};
use serde::Serialize;

#[derive(Serialize)]
struct StubOutput<'a> {
    url: &'a str,
    format: Option<&'a str>,
    stubbed: bool,
    source: &'a str,
}

/// Print `file` as the server loader would hand it to the host.
pub fn run(config: &Config, file: &str, conditions: &[String], json: bool) -> Result<()> {
    let (stages, context) = host_pipeline(config, conditions);
    let loader = ServerLoader::new(config.conventions.clone());

    let runtime = current_thread_runtime()?;
    let loaded = runtime
        .block_on(loader.load(file, context, &stages))
        .into_diagnostic()?;

    let source = loaded
        .source
        .as_text()
        .ok_or_else(|| miette!("{} is not a text module", loaded.url))?;

    if json {
        let out = StubOutput {
            url: &loaded.url,
            format: loaded.format.map(|f| f.as_str()),
            stubbed: loaded.format == Some(ModuleFormat::Module)
                && loader.conventions().is_client_module(&loaded.url),
            source,
        };
        println!("{}", serde_json::to_string_pretty(&out).into_diagnostic()?);
    } else {
        print!("{source}");
    }
    Ok(())
}
