use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use modelschema::{
    MemoryAdapter, ModelSettings, Properties, Schema, SchemaSettings, TypeRef, TypeRegistry, Value,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "schema-tool")]
#[command(about = "Developer tooling for modelschema definitions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Define every model in a JSON file and print the bound property types
    Inspect {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        slave: bool,
    },
    /// Coerce a raw value with a declared type
    Coerce {
        #[arg(long = "type")]
        type_name: String,
        #[arg(long)]
        value: String,
    },
    /// List the registered named types
    Types,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Inspect { file, slave } => inspect(&file, slave).await,
        Command::Coerce { type_name, value } => coerce(&type_name, &value),
        Command::Types => {
            let registry = TypeRegistry::global()
                .read()
                .map_err(|_| anyhow!("type registry lock poisoned"))?;
            for name in registry.names() {
                println!("{}", name);
            }
            Ok(())
        }
    }
}

/// File layout:
/// `{"Person": {"properties": {"name": "String"}, "settings": {"table": "people"}}}`
async fn inspect(path: &Path, slave: bool) -> Result<()> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read definitions from {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    let models = json
        .as_object()
        .ok_or_else(|| anyhow!("definitions file must contain a JSON object"))?;

    let adapter = Arc::new(MemoryAdapter::new());
    let schema = Schema::new("memory", adapter, SchemaSettings::new().slave(slave));
    schema.initialize().await?;

    for (name, body) in models {
        let properties = Properties::from_json(body.get("properties").unwrap_or(&serde_json::json!({})))
            .with_context(|| format!("invalid properties for model '{}'", name))?;
        let settings = match body.get("settings") {
            Some(settings) => serde_json::from_value::<ModelSettings>(settings.clone())
                .with_context(|| format!("invalid settings for model '{}'", name))?,
            None => ModelSettings::new(),
        };
        schema.define(name.clone(), properties, settings)?;
    }

    for name in schema.model_names()? {
        let model = schema.model(&name)?;
        println!("{} (table {})", name, model.table_name());
        for property in model.properties()?.names() {
            let bound = model
                .resolved_type(&property)?
                .map(|resolved| resolved.name())
                .unwrap_or_else(|| "<unbound>".to_string());
            println!("  {}: {}", property, bound);
        }
    }

    Ok(())
}

fn coerce(type_name: &str, raw: &str) -> Result<()> {
    let value = serde_json::from_str::<serde_json::Value>(raw)
        .map(Value::from_json)
        .unwrap_or_else(|_| Value::Text(raw.to_string()));

    let resolved = TypeRegistry::global()
        .read()
        .map_err(|_| anyhow!("type registry lock poisoned"))?
        .resolve(&TypeRef::from_name(type_name));

    let coerced = resolved
        .coerce(value)
        .with_context(|| format!("cannot coerce '{}' to {}", raw, type_name))?;
    println!("{} ({})", coerced, coerced.type_name());
    Ok(())
}
