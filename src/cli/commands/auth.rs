use clap::Subcommand;
use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::config::{self, Session};
use crate::cli::{utils, OutputFormat};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Create an account")]
    Register {
        #[arg(help = "Username (3-30 characters)")]
        username: String,
        #[arg(help = "Email")]
        email: String,
        #[arg(long, env = "MANIM_PASSWORD", help = "Password (8-100 characters)")]
        password: String,
    },

    #[command(about = "Log in and save the token for later commands")]
    Login {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, env = "MANIM_PASSWORD", help = "Password")]
        password: String,
    },

    #[command(about = "Forget the saved token")]
    Logout,

    #[command(about = "Show the identity behind the current token")]
    Profile,

    #[command(about = "Delete your account and every project in it")]
    DeleteAccount {
        #[arg(long, help = "Required confirmation flag")]
        yes: bool,
    },
}

pub async fn handle(cmd: AuthCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Register { username, email, password } => {
            let envelope = client
                .post(
                    "/auth/register",
                    &json!({ "username": username, "email": email, "password": password }),
                )
                .await?;
            utils::output_success(&output_format, &envelope.message, None)
        }
        AuthCommands::Login { email, password } => {
            let envelope = client
                .post("/auth/login", &json!({ "email": email, "password": password }))
                .await?;
            let token = envelope
                .data
                .as_ref()
                .and_then(|d| d["token"].as_str())
                .ok_or_else(|| anyhow::anyhow!("login response did not contain a token"))?;

            config::save_session(&Session::new(client.base_url(), &email, token))?;
            utils::output_success(&output_format, &envelope.message, envelope.data.as_ref())
        }
        AuthCommands::Logout => {
            let message = if config::clear_session()? {
                "Saved token removed"
            } else {
                "No saved token"
            };
            utils::output_success(&output_format, message, None)
        }
        AuthCommands::Profile => {
            let envelope = client.get("/api/profile").await?;
            utils::output_success(&output_format, &envelope.message, envelope.data.as_ref())
        }
        AuthCommands::DeleteAccount { yes } => {
            if !yes {
                anyhow::bail!("refusing to delete the account without --yes");
            }
            let envelope = client.post("/api/delete", &json!({})).await?;
            config::clear_session()?;
            utils::output_success(&output_format, &envelope.message, None)
        }
    }
}
