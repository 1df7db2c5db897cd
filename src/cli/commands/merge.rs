use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::{utils, OutputFormat};

pub async fn handle(client: &ApiClient, ids: Vec<String>, output_format: OutputFormat) -> anyhow::Result<()> {
    let envelope = client.post("/api/merge_videos", &json!({ "ids": ids })).await?;

    if let OutputFormat::Text = output_format {
        if let Some(url) = envelope.data.as_ref().and_then(|d| d["merged_video_url"].as_str()) {
            println!("✓ {}", envelope.message);
            println!("{}", url);
            return Ok(());
        }
    }
    utils::output_success(&output_format, &envelope.message, envelope.data.as_ref())
}
