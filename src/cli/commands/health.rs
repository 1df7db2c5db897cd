use crate::cli::client::ApiClient;
use crate::cli::{utils, OutputFormat};

pub async fn handle(client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    let envelope = client.get("/health").await?;
    utils::output_success(&output_format, &envelope.message, envelope.data.as_ref())
}
