use clap::Subcommand;
use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::config;
use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Check server health from the /health endpoint")]
    Health,

    #[command(about = "Show server information from the API root endpoint")]
    Info,
}

pub async fn handle(
    cmd: ServerCommands,
    server: Option<String>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let server = config::resolve_server(server)?;
    let client = ApiClient::new(&server, None)?;

    match cmd {
        ServerCommands::Health => match client.get("/health").await {
            Ok(data) => output_success(
                &output_format,
                &format!("{server} is healthy"),
                Some(json!({ "health": data })),
            ),
            Err(err) => {
                output_error(&output_format, &format!("{server}: {err}"))?;
                std::process::exit(1);
            }
        },
        ServerCommands::Info => {
            let data = client.get("/").await?;
            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&data)?);
                }
                OutputFormat::Text => {
                    let service = data.get("service").and_then(|v| v.as_str()).unwrap_or("?");
                    let version = data.get("version").and_then(|v| v.as_str()).unwrap_or("?");
                    println!("{service} {version} at {server}");
                }
            }
            Ok(())
        }
    }
}
