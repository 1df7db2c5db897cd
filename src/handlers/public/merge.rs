// handlers/public/merge.rs - POST /api/merge_videos
//
// Synchronous proxy to the renderer's merge endpoint. The ids are passed
// through as given; the resulting video is recorded under the renderer's id.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, instrument, warn};

use crate::api::{ApiResponse, ApiResult};
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::AppJson;
use crate::services::{rewrite_storage_url, RendererError};

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MergeResponse {
    pub message: String,
    pub merged_video_id: String,
    pub merged_video_url: String,
}

#[instrument(skip_all, fields(count = request.ids.len()))]
pub async fn merge_videos(
    State(state): State<AppState>,
    AppJson(request): AppJson<MergeRequest>,
) -> ApiResult<MergeResponse> {
    if request.ids.is_empty() {
        return Err(ApiError::bad_request("No video IDs provided for merging."));
    }

    let outcome = state
        .renderer
        .merge_videos(&request.ids)
        .await
        .map_err(merge_error)?;

    let storage = &state.config.renderer;
    let merged_video_url = match rewrite_storage_url(
        &outcome.merged_video_url,
        storage.r2_internal_domain.as_deref(),
        storage.r2_public_domain.as_deref(),
    ) {
        Some(public_url) => {
            info!("Rewrote merged video URL {} to {}", outcome.merged_video_url, public_url);
            public_url
        }
        None => {
            warn!(
                "Merged video URL {} left as is (storage domains unset or not matching)",
                outcome.merged_video_url
            );
            outcome.merged_video_url.clone()
        }
    };

    if let Err(e) = state
        .repo
        .upsert_merged_video(&outcome.merged_video_id, &merged_video_url)
        .await
    {
        // The merge already happened upstream; there is nothing to roll back.
        error!("Failed to record merged video {}: {}", outcome.merged_video_id, e);
        return Err(ApiError::internal_server_error(
            "Failed to record merged video in database.",
        ));
    }

    info!("Merged video {} recorded", outcome.merged_video_id);
    Ok(ApiResponse::ok(
        "Videos merged and uploaded successfully",
        MergeResponse {
            message: "Videos merged, uploaded to storage, and URL recorded successfully."
                .to_string(),
            merged_video_id: outcome.merged_video_id,
            merged_video_url,
        },
    ))
}

fn merge_error(err: RendererError) -> ApiError {
    match err {
        RendererError::Transport(e) | RendererError::Request(e) => {
            error!("Merge request to renderer failed: {}", e);
            ApiError::bad_gateway("Failed to connect to video processing service for merging.")
        }
        RendererError::Rejected {
            status,
            error: Some(message),
            ..
        } => {
            warn!("Renderer rejected merge with {}: {}", status, message);
            ApiError::upstream(status, message, None)
        }
        RendererError::Rejected {
            status,
            error: None,
            body,
        } => {
            warn!("Renderer rejected merge with {}", status);
            ApiError::upstream(
                status,
                "Video merging service reported an error.",
                Some(json!(body)),
            )
        }
        RendererError::InvalidResponse(e) => {
            error!("Unparseable merge response from renderer: {}", e);
            ApiError::internal_server_error("Error parsing successful merge response from renderer.")
        }
    }
}
