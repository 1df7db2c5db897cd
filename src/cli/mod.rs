pub mod client;
pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use client::ApiClient;

#[derive(Parser)]
#[command(name = "manim")]
#[command(about = "Command-line client for the Manim orchestrator API")]
#[command(version)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "MANIM_API_URL",
        default_value = "http://localhost:8080",
        help = "Base URL of the API server"
    )]
    pub url: String,

    #[arg(long, global = true, env = "MANIM_TOKEN", help = "Bearer token (defaults to the saved login)")]
    pub token: Option<String>,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Check server and database health")]
    Health,

    #[command(about = "Accounts and tokens")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Manim projects and rendering")]
    Project {
        #[command(subcommand)]
        cmd: commands::project::ProjectCommands,
    },

    #[command(about = "Merge rendered videos into one")]
    Merge {
        #[arg(required = true, help = "Video ids to merge, in order")]
        ids: Vec<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let token = match cli.token {
        Some(token) => Some(token),
        None => config::load_session()?
            .filter(|session| session.url == cli.url.trim_end_matches('/'))
            .map(|session| session.token),
    };
    let client = ApiClient::new(&cli.url, token);

    match cli.command {
        Commands::Health => commands::health::handle(&client, output_format).await,
        Commands::Auth { cmd } => commands::auth::handle(cmd, &client, output_format).await,
        Commands::Project { cmd } => commands::project::handle(cmd, &client, output_format).await,
        Commands::Merge { ids } => commands::merge::handle(&client, ids, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commands::project::ProjectCommands;

    #[test]
    fn parses_project_create() {
        let cli = Cli::try_parse_from([
            "manim",
            "--url",
            "http://api:9000",
            "project",
            "create",
            "Intro",
            "--prompt",
            "a circle turning into a square",
        ])
        .unwrap();

        assert_eq!(cli.url, "http://api:9000");
        match cli.command {
            Commands::Project {
                cmd: ProjectCommands::Create { name, parent, .. },
            } => {
                assert_eq!(name, "Intro");
                assert_eq!(parent, None);
            }
            _ => panic!("expected project create"),
        }
    }

    #[test]
    fn merge_requires_ids() {
        assert!(Cli::try_parse_from(["manim", "merge"]).is_err());
    }
}
