use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token saved by `manim auth login` and reused by later commands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub url: String,
    pub email: String,
    pub token: String,
    pub saved_at: DateTime<Utc>,
}

impl Session {
    pub fn new(url: &str, email: &str, token: &str) -> Self {
        Self {
            url: url.to_string(),
            email: email.to_string(),
            token: token.to_string(),
            saved_at: Utc::now(),
        }
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("MANIM_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME")
            .map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("manim").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

fn session_file() -> anyhow::Result<PathBuf> {
    Ok(get_config_dir()?.join("session.json"))
}

pub fn load_session() -> anyhow::Result<Option<Session>> {
    let file = session_file()?;
    if !file.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(file)?;
    Ok(Some(serde_json::from_str(&content)?))
}

pub fn save_session(session: &Session) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(session)?;
    fs::write(session_file()?, content)?;
    Ok(())
}

/// Returns whether a session existed.
pub fn clear_session() -> anyhow::Result<bool> {
    let file = session_file()?;
    if file.exists() {
        fs::remove_file(file)?;
        return Ok(true);
    }
    Ok(false)
}
