use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::RendererConfig;

/// Body POSTed to `<renderer>/render`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderRequest {
    pub project_id: String,
    pub script_content: String,
    pub callback_url: String,
}

/// Successful reply of `<renderer>/merge_videos`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MergeOutcome {
    #[serde(default)]
    pub message: Option<String>,
    pub merged_video_id: String,
    pub merged_video_url: String,
}

#[derive(Debug, Deserialize)]
struct RendererErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Error)]
pub enum RendererError {
    /// The outbound request could not be built.
    #[error("failed to prepare renderer request: {0}")]
    Request(String),

    /// Connection, timeout or body read failure.
    #[error("failed to reach renderer: {0}")]
    Transport(String),

    /// The renderer answered with an unexpected status.
    #[error("renderer returned HTTP {status}")]
    Rejected {
        status: u16,
        error: Option<String>,
        body: String,
    },

    #[error("unexpected renderer response: {0}")]
    InvalidResponse(String),
}

impl RendererError {
    /// Stage suffix recorded in the project's `failed: <stage>` status.
    pub fn failure_stage(&self) -> String {
        match self {
            RendererError::Request(_) => "renderer_req_error".to_string(),
            RendererError::Transport(_) | RendererError::InvalidResponse(_) => {
                "renderer_comm_error".to_string()
            }
            RendererError::Rejected { status, .. } => format!("renderer_status_{}", status),
        }
    }
}

/// The external video renderer.
#[async_trait]
pub trait RenderService: Send + Sync {
    /// Hands a script to the renderer. Succeeds only on `202 Accepted`; the
    /// outcome arrives later through the callback URL.
    async fn start_render(&self, request: &RenderRequest) -> Result<(), RendererError>;

    /// Merges previously rendered videos synchronously.
    async fn merge_videos(&self, ids: &[String]) -> Result<MergeOutcome, RendererError>;
}

pub struct HttpRenderService {
    client: reqwest::Client,
    base_url: String,
    render_timeout: Duration,
    merge_timeout: Duration,
}

impl HttpRenderService {
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            render_timeout: config.render_timeout(),
            merge_timeout: config.merge_timeout(),
        }
    }
}

#[async_trait]
impl RenderService for HttpRenderService {
    async fn start_render(&self, request: &RenderRequest) -> Result<(), RendererError> {
        let endpoint = format!("{}/render", self.base_url);
        let outbound = self
            .client
            .post(&endpoint)
            .timeout(self.render_timeout)
            .json(request)
            .build()
            .map_err(|e| RendererError::Request(e.to_string()))?;

        debug!(%endpoint, project_id = %request.project_id, "Sending render request");
        let response = self
            .client
            .execute(outbound)
            .await
            .map_err(|e| RendererError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::ACCEPTED {
            info!(project_id = %request.project_id, "Renderer accepted render request");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let error = serde_json::from_str::<RendererErrorBody>(&body)
            .ok()
            .and_then(|b| b.error);
        Err(RendererError::Rejected {
            status: status.as_u16(),
            error,
            body,
        })
    }

    async fn merge_videos(&self, ids: &[String]) -> Result<MergeOutcome, RendererError> {
        let endpoint = format!("{}/merge_videos", self.base_url);
        info!(%endpoint, count = ids.len(), "Forwarding merge request to renderer");

        let response = self
            .client
            .post(&endpoint)
            .timeout(self.merge_timeout)
            .json(&json!({ "ids": ids }))
            .send()
            .await
            .map_err(|e| RendererError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RendererError::Transport(e.to_string()))?;

        if status != reqwest::StatusCode::OK {
            warn!(status = status.as_u16(), "Renderer rejected merge request");
            let error = serde_json::from_str::<RendererErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .filter(|e| !e.is_empty());
            return Err(RendererError::Rejected {
                status: status.as_u16(),
                error,
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| RendererError::InvalidResponse(e.to_string()))
    }
}

/// Swaps the storage origin of `video_url` for the public one.
///
/// Returns `None` when either domain is unset, the URL does not parse, or its
/// `scheme://host[:port]` differs from `internal_domain` (case-insensitive,
/// trailing slashes ignored). The rewritten URL keeps only the path.
pub fn rewrite_storage_url(
    video_url: &str,
    internal_domain: Option<&str>,
    public_domain: Option<&str>,
) -> Option<String> {
    let internal = internal_domain?.trim_end_matches('/');
    let public = public_domain?.trim_end_matches('/');
    if internal.is_empty() || public.is_empty() {
        return None;
    }

    let parsed = Url::parse(video_url).ok()?;
    let host = parsed.host_str()?;
    let origin = match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    };

    if origin.eq_ignore_ascii_case(internal) {
        Some(format!("{}{}", public, parsed.path()))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::Value;

    const INTERNAL: &str = "https://abc123.r2.dev";
    const PUBLIC: &str = "https://pub-xyz.r2.dev/";

    #[test]
    fn rewrites_matching_origin() {
        let url = rewrite_storage_url("https://ABC123.r2.dev/videos/m1.mp4", Some(INTERNAL), Some(PUBLIC));
        assert_eq!(url.as_deref(), Some("https://pub-xyz.r2.dev/videos/m1.mp4"));
    }

    #[test]
    fn leaves_foreign_or_unconfigured_urls() {
        assert_eq!(rewrite_storage_url("https://other.dev/v.mp4", Some(INTERNAL), Some(PUBLIC)), None);
        assert_eq!(rewrite_storage_url("https://abc123.r2.dev/v.mp4", None, Some(PUBLIC)), None);
        assert_eq!(rewrite_storage_url("not a url", Some(INTERNAL), Some(PUBLIC)), None);
    }

    #[test]
    fn failure_stages_follow_error_kind() {
        assert_eq!(RendererError::Request("x".into()).failure_stage(), "renderer_req_error");
        assert_eq!(RendererError::Transport("x".into()).failure_stage(), "renderer_comm_error");
        let rejected = RendererError::Rejected {
            status: 503,
            error: None,
            body: String::new(),
        };
        assert_eq!(rejected.failure_stage(), "renderer_status_503");
    }

    async fn stub_renderer(app: Router) -> HttpRenderService {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        HttpRenderService::new(&RendererConfig {
            base_url: format!("http://{}/", addr),
            render_timeout_secs: 5,
            merge_timeout_secs: 5,
            r2_internal_domain: None,
            r2_public_domain: None,
        })
    }

    fn render_request() -> RenderRequest {
        RenderRequest {
            project_id: "p1".to_string(),
            script_content: "from manim import *".to_string(),
            callback_url: "http://host.docker.internal:8080/api/projects/render-callback".to_string(),
        }
    }

    #[tokio::test]
    async fn render_accepted_on_202() {
        let app = Router::new().route(
            "/render",
            post(|Json(body): Json<RenderRequest>| async move {
                assert_eq!(body.project_id, "p1");
                (StatusCode::ACCEPTED, Json(serde_json::json!({ "status": "queued" })))
            }),
        );
        let service = stub_renderer(app).await;
        service.start_render(&render_request()).await.unwrap();
    }

    #[tokio::test]
    async fn render_rejection_carries_error_field() {
        let app = Router::new().route(
            "/render",
            post(|| async {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(serde_json::json!({ "error": "queue full" })),
                )
            }),
        );
        let service = stub_renderer(app).await;
        match service.start_render(&render_request()).await {
            Err(RendererError::Rejected { status, error, .. }) => {
                assert_eq!(status, 503);
                assert_eq!(error.as_deref(), Some("queue full"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn render_200_is_not_acceptance() {
        let app = Router::new().route("/render", post(|| async { StatusCode::OK }));
        let service = stub_renderer(app).await;
        let err = service.start_render(&render_request()).await.unwrap_err();
        assert_eq!(err.failure_stage(), "renderer_status_200");
    }

    #[tokio::test]
    async fn unreachable_renderer_is_transport_error() {
        let service = HttpRenderService::new(&RendererConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            render_timeout_secs: 1,
            merge_timeout_secs: 1,
            r2_internal_domain: None,
            r2_public_domain: None,
        });
        let err = service.merge_videos(&["a".to_string()]).await.unwrap_err();
        assert!(matches!(err, RendererError::Transport(_)));
    }

    #[tokio::test]
    async fn merge_parses_success_body() {
        let app = Router::new().route(
            "/merge_videos",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["ids"], serde_json::json!(["a", "b"]));
                Json(serde_json::json!({
                    "message": "merged",
                    "merged_video_id": "m1",
                    "merged_video_url": "https://abc123.r2.dev/m1.mp4"
                }))
            }),
        );
        let service = stub_renderer(app).await;
        let outcome = service
            .merge_videos(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(outcome.merged_video_id, "m1");
        assert_eq!(outcome.merged_video_url, "https://abc123.r2.dev/m1.mp4");
    }

    #[tokio::test]
    async fn merge_rejection_keeps_raw_body() {
        let app = Router::new().route(
            "/merge_videos",
            post(|| async { (StatusCode::BAD_REQUEST, "missing clips") }),
        );
        let service = stub_renderer(app).await;
        match service.merge_videos(&["a".to_string()]).await {
            Err(RendererError::Rejected { status, error, body }) => {
                assert_eq!(status, 400);
                assert_eq!(error, None);
                assert_eq!(body, "missing clips");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn merge_garbage_success_is_invalid_response() {
        let app = Router::new().route("/merge_videos", post(|| async { "ok" }));
        let service = stub_renderer(app).await;
        let err = service.merge_videos(&["a".to_string()]).await.unwrap_err();
        assert!(matches!(err, RendererError::InvalidResponse(_)));
    }
}
