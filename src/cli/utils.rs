use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Print a successful result: the full envelope in JSON mode, a check line
/// plus pretty data in text mode.
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<&Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let Some(data) = data {
                response["data"] = data.clone();
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
            if let Some(data) = data.filter(|d| !d.is_null()) {
                println!("{}", serde_json::to_string_pretty(data)?);
            }
        }
    }
    Ok(())
}

/// One line per project in text mode.
pub fn output_projects(output_format: &OutputFormat, message: &str, projects: &Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => output_success(output_format, message, Some(projects)),
        OutputFormat::Text => {
            let items = projects.as_array().map(Vec::as_slice).unwrap_or_default();
            if items.is_empty() {
                println!("No projects found");
                return Ok(());
            }
            for project in items {
                println!("{}", project_line(project));
            }
            Ok(())
        }
    }
}

pub fn project_line(project: &Value) -> String {
    let video = project["video_url"].as_str().filter(|v| !v.is_empty());
    format!(
        "{}  {:<12} {}{}",
        project["id"].as_str().unwrap_or("?"),
        project["render_status"].as_str().unwrap_or("?"),
        project["name"].as_str().unwrap_or(""),
        video.map(|v| format!("  {}", v)).unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_line_shows_video_only_when_present() {
        let with_video = json!({
            "id": "p1", "render_status": "completed", "name": "Intro",
            "video_url": "https://cdn/v.mp4"
        });
        assert!(project_line(&with_video).ends_with("Intro  https://cdn/v.mp4"));

        let without = json!({ "id": "p2", "render_status": "pending", "name": "Draft", "video_url": "" });
        assert!(project_line(&without).ends_with("Draft"));
    }
}
