use chrono::Utc;
use clap::Args;
use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::config::{self, SessionConfig};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Args)]
pub struct OnboardArgs {
    #[arg(long, help = "Church display name")]
    pub name: String,

    #[arg(long, help = "Candidate web address (normalized server-side)")]
    pub slug: Option<String>,

    #[arg(long, help = "Two-letter country code, e.g. BR or US")]
    pub country: String,

    #[arg(long, help = "Short name shown in the application header")]
    pub system_name: Option<String>,

    #[arg(long, default_value = "#1e40af", help = "Primary theme color (#rrggbb)")]
    pub primary_color: String,

    #[arg(long, default_value = "#9333ea", help = "Secondary theme color (#rrggbb)")]
    pub secondary_color: String,

    #[arg(long, help = "Founding administrator's full name")]
    pub admin_name: String,

    #[arg(long, help = "Founding administrator's phone")]
    pub admin_phone: Option<String>,

    #[arg(long)]
    pub city: Option<String>,

    #[arg(long)]
    pub state: Option<String>,

    #[arg(long)]
    pub address: Option<String>,

    #[arg(long, help = "Church contact phone")]
    pub phone: Option<String>,

    #[arg(long, help = "Church contact email")]
    pub email: Option<String>,
}

pub async fn handle(
    args: OnboardArgs,
    server: Option<String>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let server = config::resolve_server(server)?;
    let session = config::load_session()?;
    if session.token.is_none() {
        anyhow::bail!("not signed in, run `flock auth login` first");
    }

    let slug = args.slug.unwrap_or_else(|| args.name.clone());
    let system_name = args.system_name.unwrap_or_else(|| args.name.clone());
    let body = json!({
        "church": {
            "name": args.name,
            "slug": slug,
            "address": args.address,
            "city": args.city,
            "state": args.state,
            "country": args.country,
            "phone": args.phone,
            "email": args.email,
        },
        "theme": {
            "systemName": system_name,
            "primaryColor": args.primary_color,
            "secondaryColor": args.secondary_color,
        },
        "admin": {
            "fullName": args.admin_name,
            "phone": args.admin_phone,
        },
    });

    let client = ApiClient::new(&server, session.token.clone())?;
    let data = client.post("/api/onboarding", &body).await?;

    // The server mints a fresh token with the new binding; replace the
    // pre-onboarding one.
    if let Some(token) = data.get("token").and_then(|v| v.as_str()) {
        config::save_session(&SessionConfig {
            server: server.clone(),
            token: Some(token.to_string()),
            email: session.email.clone(),
            saved_at: Utc::now(),
        })?;
    }

    let slug = data.get("slug").and_then(|v| v.as_str()).unwrap_or("?");
    output_success(
        &output_format,
        &format!("Church created at /visit/{slug}"),
        Some(json!({
            "church_id": data.get("church_id"),
            "slug": slug,
        })),
    )
}
