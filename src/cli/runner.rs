//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::{load_config, ClientConfig};
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig};
use crate::result::QueryResult;
use crate::sobject::{Field, GenericObject, ObjectMap, Record, SObject};
use crate::types::{JsonObject, JsonValue};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command, writing JSON lines to stdout
    pub fn run(&self) -> Result<()> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.run_with(&mut out)
    }

    /// Run the CLI command against an arbitrary writer
    pub fn run_with<W: Write>(&self, out: &mut W) -> Result<()> {
        let config = self.client_config()?;
        let client = HttpClient::with_config(HttpClientConfig::from(&config))?;
        let object_map = Arc::new(build_object_map(&config));

        match &self.cli.command {
            Commands::Query {
                soql,
                all,
                max_records,
            } => {
                let result = if *all {
                    client.query_all(soql, object_map)?
                } else {
                    client.query(soql, object_map)?
                };
                self.query(result, *max_records, out)
            }
            Commands::Get { sobject, id } => {
                let mut result = client.retrieve(sobject, id, object_map)?;
                let mut object = result
                    .first()?
                    .ok_or_else(|| Error::Other(format!("{sobject} {id} returned no record")))?;
                write_line(out, &render_object(&mut object)?)
            }
            Commands::Create { sobject, json } => {
                let fields: JsonValue = serde_json::from_str(json)?;
                if !fields.is_object() {
                    return Err(Error::invalid_field("json", "expected a JSON object"));
                }
                let result = client.create(sobject, &fields, object_map)?;
                let id = result.last_id().map(String::from);
                info!(sobject = sobject.as_str(), id = ?id, "Record created");
                write_line(out, &json!({ "id": id, "success": id.is_some() }))
            }
        }
    }

    /// Config from the file named by `--config`, with flag overrides applied
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.cli.config {
            Some(path) => load_config(path)?,
            None => {
                let url = self.cli.instance_url.clone().ok_or_else(|| {
                    Error::config("Instance URL not specified (use --config or --instance-url)")
                })?;
                ClientConfig::new(url)
            }
        };

        if let Some(url) = &self.cli.instance_url {
            config.instance_url.clone_from(url);
        }
        if let Some(token) = &self.cli.access_token {
            config.access_token = Some(token.clone());
        }
        if let Some(version) = &self.cli.api_version {
            config.api_version.clone_from(version);
        }

        config.validate()?;
        Ok(config)
    }

    fn query<W: Write>(
        &self,
        mut result: QueryResult,
        max_records: Option<usize>,
        out: &mut W,
    ) -> Result<()> {
        let start = Instant::now();
        let limit = max_records.unwrap_or(usize::MAX);
        info!(
            class_name = result.class_name(),
            total_size = result.total_size(),
            "Query started"
        );

        let mut count = 0;
        for entry in result.iter().take(limit) {
            let (_, mut object) = entry?;
            write_line(out, &render_object(&mut object)?)?;
            count += 1;
        }

        info!(
            records = count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query finished"
        );
        Ok(())
    }
}

/// Class registry for the CLI: configured class names all build generic objects
fn build_object_map(config: &ClientConfig) -> ObjectMap {
    let mut map = config.apply_object_map(ObjectMap::new());
    for class_name in config.object_map.values() {
        if !map.is_registered(class_name) {
            map = map.register::<GenericObject>(class_name.clone());
        }
    }
    map
}

fn write_line<W: Write>(out: &mut W, value: &JsonValue) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

// ============================================================================
// Rendering
// ============================================================================

/// Render an object as JSON, walking nested relations
///
/// Objects other than [`GenericObject`] only expose their identity.
pub fn render_object(object: &mut Box<dyn SObject>) -> Result<JsonValue> {
    match object.downcast_mut::<GenericObject>() {
        Some(generic) => Ok(JsonValue::Object(render_record(generic.record_mut())?)),
        None => Ok(json!({
            "attributes": { "type": object.type_name() },
            "Id": object.id(),
        })),
    }
}

fn render_record(record: &mut Record) -> Result<JsonObject> {
    let mut rendered = JsonObject::new();
    for (name, field) in record.iter_mut() {
        let value = match field {
            Field::Value(value) => value.clone(),
            Field::Parent(None) => JsonValue::Null,
            Field::Parent(Some(parent)) => render_object(parent)?,
            Field::Children(children) => render_children(children)?,
        };
        rendered.insert(name.clone(), value);
    }
    Ok(rendered)
}

fn render_children(children: &mut QueryResult) -> Result<JsonValue> {
    let total_size = children.total_size();
    let done = children.is_done();
    let mut records = Vec::new();
    for entry in children.iter() {
        let (_, mut object) = entry?;
        records.push(render_object(&mut object)?);
    }
    Ok(json!({
        "totalSize": total_size,
        "done": done,
        "records": records,
    }))
}
