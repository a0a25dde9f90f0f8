use serde_json::{Value, json};
use tracing::info;

use zbx_manager::Result;
use zbx_manager::config::Config;
use zbx_manager::error::{Error, ZbxError};
use zbx_manager::telemetry::init_tracing;
use zbx_manager::types::Severity;
use zbx_manager::zbx_client::{ProblemFilter, ResourceDescriptor, ZbxClient};

use crate::cli::{Cli, Command};

pub async fn run(cli: Cli) -> Result<()> {
    init_tracing(cli.log_filter.as_deref(), cli.json_logs)?;

    let mut options = Config::from_env_and_file(&cli.config)?.into_connect_options();
    if cli.ignore_version {
        options.ignore_version = true;
    }
    if cli.debug {
        options.debug = true;
    }

    let client = ZbxClient::connect(&options).await?;
    let outcome = execute(&client, cli.command).await;
    if let Err(err) = client.logout().await {
        info!(error = %err, "logout failed");
    }
    outcome
}

async fn execute(client: &ZbxClient, command: Command) -> Result<()> {
    match command {
        Command::Version => {
            println!("{}", client.api_version().await?);
        }
        Command::Query { method, params } => {
            let params = parse_params(params.as_deref())?;
            let result = client.query(&method, params).await?;
            print_json(&result)?;
        }
        Command::GetId { resource, name } => {
            let descriptor = ResourceDescriptor::by_name(&resource).ok_or_else(|| {
                Error::from(ZbxError::InvalidParams {
                    message: format!("unknown resource type {resource}"),
                })
            })?;
            let mut fields = serde_json::Map::new();
            fields.insert(descriptor.identify_field.to_string(), Value::String(name));
            match client.resource(descriptor).get_id(Value::Object(fields)).await? {
                Some(id) => println!("{id}"),
                None => {
                    return Err(ZbxError::InvalidParams {
                        message: format!("no {resource} matches"),
                    }
                    .into());
                }
            }
        }
        Command::Problems {
            ack,
            min_severity,
            limit,
        } => {
            let filter = ProblemFilter {
                severities: min_severity.map_or_else(Vec::new, Severity::at_least),
                acknowledged: ack,
                limit: Some(limit),
                ..ProblemFilter::default()
            };
            for problem in client.problems().list(&filter).await? {
                let ack = if problem.acknowledged { "ack" } else { "-" };
                println!(
                    "{}\t{}\t{}\t{}",
                    problem.event_id, problem.severity, ack, problem.name
                );
            }
        }
    }
    Ok(())
}

fn parse_params(raw: Option<&str>) -> Result<Value> {
    raw.map_or_else(
        || Ok(json!({})),
        |raw| {
            serde_json::from_str(raw).map_err(|err| {
                ZbxError::InvalidParams {
                    message: format!("params are not valid JSON: {err}"),
                }
                .into()
            })
        },
    )
}

fn print_json(value: &Value) -> Result<()> {
    let pretty = serde_json::to_string_pretty(value).map_err(|err| ZbxError::Json {
        message: err.to_string(),
    })?;
    println!("{pretty}");
    Ok(())
}
