use anyhow::{anyhow, Context};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

/// Thin HTTP client for the orchestrator API; unwraps the response envelope.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// Decoded `{success, message, data}` envelope of a successful call.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub status: u16,
    pub message: String,
    pub data: Option<Value>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Envelope> {
        self.send(self.request(Method::GET, path)).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> anyhow::Result<Envelope> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> anyhow::Result<Envelope> {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> anyhow::Result<Envelope> {
        self.send(self.request(Method::DELETE, path)).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> anyhow::Result<Envelope> {
        let response = builder
            .send()
            .await
            .with_context(|| format!("failed to reach {}", self.base_url))?;

        let status = response.status().as_u16();
        let body: Value = response
            .json()
            .await
            .with_context(|| format!("server answered HTTP {} without a JSON body", status))?;

        decode_envelope(status, body)
    }
}

pub fn decode_envelope(status: u16, body: Value) -> anyhow::Result<Envelope> {
    let message = body["message"].as_str().unwrap_or_default().to_string();

    if body["success"].as_bool() != Some(true) {
        let code = body["error"]["code"].as_str().unwrap_or("ERROR");
        let detail = match &body["error"]["detail"] {
            Value::Null => String::new(),
            Value::String(s) => format!(" ({})", s),
            other => format!(" ({})", other),
        };
        return Err(anyhow!("{} [{} {}]{}", message, status, code, detail));
    }

    Ok(Envelope {
        status,
        message,
        data: body.get("data").cloned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_is_unwrapped() {
        let envelope = decode_envelope(
            201,
            json!({ "success": true, "message": "Created", "data": { "id": 1 } }),
        )
        .unwrap();
        assert_eq!(envelope.message, "Created");
        assert_eq!(envelope.data.unwrap()["id"], 1);
    }

    #[test]
    fn error_envelope_becomes_error_with_code() {
        let err = decode_envelope(
            403,
            json!({
                "success": false,
                "message": "You do not have permission to access this project",
                "error": { "code": "FORBIDDEN" }
            }),
        )
        .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("403 FORBIDDEN"), "{}", text);
        assert!(text.starts_with("You do not have permission"));
    }
}
