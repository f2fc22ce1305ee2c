use chrono::Utc;
use clap::Subcommand;
use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::config::{self, SessionConfig};
use crate::cli::utils::{output_error, output_success, prompt_if_missing};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Register a new account")]
    Register {
        #[arg(help = "Email address")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Login and save the session token")]
    Login {
        #[arg(help = "Email address")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Forget the saved session token")]
    Logout,

    #[command(about = "Show the locally saved session")]
    Status,

    #[command(about = "Ask the server who this token belongs to")]
    Whoami,
}

pub async fn handle(
    cmd: AuthCommands,
    server: Option<String>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let server = config::resolve_server(server)?;

    match cmd {
        AuthCommands::Register { email, password } => {
            let password = prompt_if_missing(password, "Password")?;
            let client = ApiClient::new(&server, None)?;
            let data = client
                .post("/auth/register", &json!({ "email": email, "password": password }))
                .await?;
            save_token(&server, &email, &data)?;
            output_success(
                &output_format,
                &format!("Registered {email}"),
                Some(json!({ "user": data.get("user") })),
            )
        }
        AuthCommands::Login { email, password } => {
            let password = prompt_if_missing(password, "Password")?;
            let client = ApiClient::new(&server, None)?;
            let data = client
                .post("/auth/login", &json!({ "email": email, "password": password }))
                .await?;
            save_token(&server, &email, &data)?;
            let onboarded = data.get("onboarded").and_then(|v| v.as_bool()).unwrap_or(false);
            let hint = if onboarded {
                "signed in"
            } else {
                "signed in, run `flock onboard` to create your church"
            };
            output_success(&output_format, &format!("{email}: {hint}"), None)
        }
        AuthCommands::Logout => {
            config::clear_session()?;
            output_success(&output_format, "Session cleared", None)
        }
        AuthCommands::Status => {
            let session = config::load_session()?;
            match &session.token {
                Some(_) => output_success(
                    &output_format,
                    &format!(
                        "Session for {} on {} (saved {})",
                        session.email.as_deref().unwrap_or("<unknown>"),
                        session.server,
                        session.saved_at.format("%Y-%m-%d %H:%M UTC")
                    ),
                    Some(json!({ "server": session.server, "email": session.email })),
                ),
                None => output_error(&output_format, "No saved session, run `flock auth login`"),
            }
        }
        AuthCommands::Whoami => {
            let session = config::load_session()?;
            let client = ApiClient::new(&server, session.token)?;
            let data = client.get("/api/auth/whoami").await?;
            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&data)?);
                    Ok(())
                }
                OutputFormat::Text => {
                    if data.get("authenticated").and_then(|v| v.as_bool()) == Some(true) {
                        let email = data.get("email").and_then(|v| v.as_str()).unwrap_or("?");
                        match data.get("binding").filter(|b| !b.is_null()) {
                            Some(binding) => {
                                let role = binding
                                    .get("role")
                                    .and_then(|v| v.as_str())
                                    .unwrap_or("?");
                                let church = binding
                                    .get("church_id")
                                    .and_then(|v| v.as_str())
                                    .unwrap_or("?");
                                println!("{email} ({role}) bound to church {church}");
                            }
                            None => println!("{email}, not onboarded yet"),
                        }
                    } else {
                        println!("Not signed in");
                    }
                    Ok(())
                }
            }
        }
    }
}

fn save_token(server: &str, email: &str, data: &serde_json::Value) -> anyhow::Result<()> {
    let Some(token) = data.get("token").and_then(|v| v.as_str()) else {
        return Ok(());
    };
    config::save_session(&SessionConfig {
        server: server.to_string(),
        token: Some(token.to_string()),
        email: Some(email.to_string()),
        saved_at: Utc::now(),
    })
}
