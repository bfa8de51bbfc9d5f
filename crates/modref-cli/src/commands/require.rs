use miette::{IntoDiagnostic, Result};
use modref_core::host::{Exports, ModuleRegistry};
use modref_core::{register, Config, StubProperty};
use serde_json::{json, Value};

/// Load `file` through the registered registry and show its exports.
///
/// For a client module each requested property is read off the stub; with
/// no properties, the namespace reference is shown.
pub fn run(config: &Config, file: &str, props: &[String], json: bool) -> Result<()> {
    let mut registry = ModuleRegistry::new(config.cwd.clone());
    register(&mut registry, &config.conventions);

    let module = registry.require(file, None).into_diagnostic()?;

    let value = match &module.exports {
        Exports::Source(source) => json!({
            "filename": module.filename,
            "stub": false,
            "bytes": source.len(),
        }),
        Exports::Stub(stub) => {
            let properties: serde_json::Map<String, Value> = props
                .iter()
                .map(|prop| (prop.clone(), property_value(stub.get(prop))))
                .collect();
            let namespace = serde_json::to_value(&**stub.namespace()).into_diagnostic()?;
            json!({
                "filename": module.filename,
                "stub": true,
                "namespace": namespace,
                "properties": properties,
            })
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&value).into_diagnostic()?);
        return Ok(());
    }

    match &module.exports {
        Exports::Source(_) => {
            println!("{}: not a client module", module.filename.display());
        }
        Exports::Stub(_) if props.is_empty() => {
            println!("{}", value["namespace"]);
        }
        Exports::Stub(_) => {
            for prop in props {
                println!("{prop}: {}", value["properties"][prop]);
            }
        }
    }
    Ok(())
}

fn property_value(property: StubProperty<'_>) -> Value {
    match property {
        StubProperty::Str(s) => Value::from(s),
        StubProperty::Bool(b) => Value::from(b),
        StubProperty::Undefined => Value::Null,
        StubProperty::Reference(reference) => {
            serde_json::to_value(&*reference).unwrap_or(Value::Null)
        }
    }
}
