use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::LlmConfig;

const CODE_FENCE_OPEN: &str = "```python\n";
const CODE_FENCE_CLOSE: &str = "```";

const PROMPT_TEMPLATE: &str = r#"Generate Manim Python code based on this request.

Instructions:
- Provide ONLY valid, runnable Manim Python code.
- No explanations, external comments, or extra text.
- Code must be self-contained in a class inheriting from 'Scene'.
- Use 'self.play()' for animations and 'self.wait()' for pauses.
- For complex/unclear requests, output a simple default animation.
- Wrap the whole program in a single ```python code block.

Example Input: "Animate a blue circle fading in."
Example Output:
```python
from manim import *

class MyAnimation(Scene):
    def construct(self):
        circle = Circle(color=BLUE)
        self.play(FadeIn(circle))
        self.wait(1)
```

User request: "{prompt}""#;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM API key is not configured")]
    MissingApiKey,

    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("LLM returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM returned no usable content")]
    EmptyResponse,

    #[error("LLM response did not contain a python code block")]
    MissingCodeBlock,
}

/// Turns a natural-language prompt into a Manim program.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    async fn generate_scene(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Full instruction text sent for a user prompt.
pub fn build_prompt(user_prompt: &str) -> String {
    PROMPT_TEMPLATE.replace("{prompt}", user_prompt)
}

/// Pulls the program out of a fenced ```python block. Everything between the
/// opening fence and the last closing fence is kept, trimmed.
pub fn extract_code_block(text: &str) -> Result<String, LlmError> {
    let start = text
        .find(CODE_FENCE_OPEN)
        .map(|i| i + CODE_FENCE_OPEN.len())
        .ok_or(LlmError::MissingCodeBlock)?;
    let end = text
        .rfind(CODE_FENCE_CLOSE)
        .filter(|&end| end >= start)
        .ok_or(LlmError::MissingCodeBlock)?;

    Ok(text[start..end].trim().to_string())
}

/// Gemini `generateContent` client.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Request(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl CodeGenerator for GeminiClient {
    async fn generate_scene(&self, prompt: &str) -> Result<String, LlmError> {
        info!(model = %self.model, prompt_len = prompt.len(), "Sending prompt to LLM");

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "contents": [{ "parts": [{ "text": build_prompt(prompt) }] }]
            }))
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let result: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;
        let text = result["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .filter(|t| !t.is_empty())
            .ok_or(LlmError::EmptyResponse)?;
        debug!(response_len = text.len(), "Received LLM response");

        let code = extract_code_block(text).map_err(|e| {
            warn!("LLM response had no python code block");
            e
        })?;
        info!(code_len = code.len(), "Extracted Manim code from LLM response");
        Ok(code)
    }
}
