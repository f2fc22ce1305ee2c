use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_SERVER: &str = "http://localhost:3000";

/// Saved CLI session: which server we talk to and the token from the
/// last login, registration or onboarding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub server: String,
    pub token: Option<String>,
    pub email: Option<String>,
    pub saved_at: DateTime<Utc>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            token: None,
            email: None,
            saved_at: Utc::now(),
        }
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("FLOCK_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME")
            .map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("flock").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn load_session() -> anyhow::Result<SessionConfig> {
    let session_file = get_config_dir()?.join("session.json");

    if !session_file.exists() {
        return Ok(SessionConfig::default());
    }

    let content = fs::read_to_string(session_file)?;
    let config: SessionConfig = serde_json::from_str(&content)?;
    Ok(config)
}

pub fn save_session(config: &SessionConfig) -> anyhow::Result<()> {
    let session_file = get_config_dir()?.join("session.json");
    let content = serde_json::to_string_pretty(config)?;
    fs::write(session_file, content)?;
    Ok(())
}

pub fn clear_session() -> anyhow::Result<()> {
    let session_file = get_config_dir()?.join("session.json");
    if session_file.exists() {
        fs::remove_file(session_file)?;
    }
    Ok(())
}

/// Server precedence: `--server` flag, then FLOCK_SERVER, then whatever
/// the saved session used, then the default.
pub fn resolve_server(flag: Option<String>) -> anyhow::Result<String> {
    if let Some(server) = flag {
        return Ok(server);
    }
    if let Ok(server) = std::env::var("FLOCK_SERVER") {
        if !server.is_empty() {
            return Ok(server);
        }
    }
    Ok(load_session()?.server)
}
