use clap::Subcommand;
use serde_json::{json, Map, Value};

use crate::cli::client::ApiClient;
use crate::cli::{utils, OutputFormat};

#[derive(Subcommand)]
pub enum ProjectCommands {
    #[command(about = "List your projects, newest first")]
    List,

    #[command(about = "Show one project")]
    Show {
        #[arg(help = "Project id")]
        id: String,
    },

    #[command(about = "List the sub-projects of a project")]
    Children {
        #[arg(help = "Parent project id")]
        id: String,
    },

    #[command(about = "Create a project")]
    Create {
        #[arg(help = "Project name (unique per account)")]
        name: String,
        #[arg(long, help = "Prompt describing the animation (at least 10 characters)")]
        prompt: String,
        #[arg(long, default_value = "", help = "Free-form description")]
        description: String,
        #[arg(long, help = "Parent project id")]
        parent: Option<String>,
    },

    #[command(about = "Change name, description or prompt")]
    Update {
        #[arg(help = "Project id")]
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        prompt: Option<String>,
    },

    #[command(about = "Delete a project")]
    Delete {
        #[arg(help = "Project id")]
        id: String,
    },

    #[command(about = "Generate code from the prompt and start rendering")]
    Render {
        #[arg(help = "Project id")]
        id: String,
    },
}

pub async fn handle(cmd: ProjectCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ProjectCommands::List => {
            let envelope = client.get("/api/projects").await?;
            let projects = envelope.data.unwrap_or(Value::Array(Vec::new()));
            utils::output_projects(&output_format, &envelope.message, &projects)
        }
        ProjectCommands::Show { id } => {
            let envelope = client.get(&format!("/api/projects/{}", id)).await?;
            utils::output_success(&output_format, &envelope.message, envelope.data.as_ref())
        }
        ProjectCommands::Children { id } => {
            let envelope = client.get(&format!("/api/projects/{}/children", id)).await?;
            let children = envelope.data.unwrap_or(Value::Array(Vec::new()));
            utils::output_projects(&output_format, &envelope.message, &children)
        }
        ProjectCommands::Create { name, prompt, description, parent } => {
            let body = json!({
                "name": name,
                "prompt": prompt,
                "description": description,
                "parent_project_id": parent,
            });
            let envelope = client.post("/api/projects", &body).await?;
            utils::output_success(&output_format, &envelope.message, envelope.data.as_ref())
        }
        ProjectCommands::Update { id, name, description, prompt } => {
            let body = update_body(name, description, prompt);
            if body.is_empty() {
                anyhow::bail!("nothing to update: pass --name, --description or --prompt");
            }
            let envelope = client.put(&format!("/api/projects/{}", id), &body).await?;
            utils::output_success(&output_format, &envelope.message, envelope.data.as_ref())
        }
        ProjectCommands::Delete { id } => {
            let envelope = client.delete(&format!("/api/projects/{}", id)).await?;
            utils::output_success(&output_format, &envelope.message, None)
        }
        ProjectCommands::Render { id } => {
            let envelope = client
                .post(&format!("/api/projects/{}/generate-render", id), &json!({}))
                .await?;
            utils::output_success(&output_format, &envelope.message, envelope.data.as_ref())
        }
    }
}

/// Only the flags that were given, so the server leaves the rest untouched.
fn update_body(name: Option<String>, description: Option<String>, prompt: Option<String>) -> Map<String, Value> {
    let mut body = Map::new();
    for (key, value) in [("name", name), ("description", description), ("prompt", prompt)] {
        if let Some(value) = value {
            body.insert(key.to_string(), Value::String(value));
        }
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_body_skips_missing_flags() {
        let body = update_body(Some("Intro".into()), None, None);
        assert_eq!(Value::Object(body), json!({ "name": "Intro" }));
        assert!(update_body(None, None, None).is_empty());
    }
}
