mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{TestApp, PUBLIC_BASE_URL, SCRIPT};
use manim_orchestrator::database::models::NewProject;
use manim_orchestrator::database::ProjectRepository;
use manim_orchestrator::services::RendererError;

fn render_uri(project: &serde_json::Value) -> String {
    format!("/api/projects/{}/generate-render", project["id"].as_str().unwrap())
}

#[tokio::test]
async fn trigger_hands_generated_script_to_renderer() {
    let app = TestApp::new();
    let token = app.sign_up("ada").await;
    let project = app.create_project(&token, "Intro").await;
    let id = project["id"].as_str().unwrap();

    let (status, body) = app.post(&render_uri(&project), Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::ACCEPTED, "{}", body);
    assert_eq!(body["message"], "Manim rendering process initiated");
    assert_eq!(body["data"]["project_id"], id);
    assert_eq!(body["data"]["status"], "rendering_initiated");

    assert_eq!(app.llm.prompts.lock().unwrap().as_slice(), ["a blue circle fading into view"]);
    let job = app.renderer.last_render().expect("render job");
    assert_eq!(job.project_id, id);
    assert_eq!(job.script_content, SCRIPT);
    assert_eq!(
        job.callback_url,
        format!("{}/api/projects/render-callback?render_version=1", PUBLIC_BASE_URL)
    );

    let stored = app.project(&token, id).await;
    assert_eq!(stored["render_status"], "generating");
    assert_eq!(stored["render_version"], 1);
}

#[tokio::test]
async fn empty_prompt_is_rejected_before_code_generation() {
    let app = TestApp::new();
    let token = app.sign_up("ada").await;
    let user_id = app.tokens.verify(&token).unwrap().user_id;

    // the API refuses short prompts, so plant one directly
    let project = app
        .repo
        .create_project(NewProject {
            user_id,
            parent_project_id: None,
            name: "Blank".to_string(),
            description: String::new(),
            prompt: "   ".to_string(),
        })
        .await
        .unwrap();

    let (status, _) = app
        .post(&format!("/api/projects/{}/generate-render", project.id), Some(&token), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.llm.calls(), 0);
    assert!(app.renderer.last_render().is_none());

    let stored = app.project(&token, &project.id.to_string()).await;
    assert_eq!(stored["render_status"], "pending");
}

#[tokio::test]
async fn code_generation_failure_is_recorded() {
    let app = TestApp::new();
    let token = app.sign_up("ada").await;
    let project = app.create_project(&token, "Intro").await;
    *app.llm.fail.lock().unwrap() = true;

    let (status, body) = app.post(&render_uri(&project), Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Failed to generate Manim code from prompt");
    assert!(app.renderer.last_render().is_none());

    let stored = app.project(&token, project["id"].as_str().unwrap()).await;
    assert_eq!(stored["render_status"], "failed: code_gen_error");
}

#[tokio::test]
async fn renderer_rejection_is_recorded_with_its_status() {
    let app = TestApp::new();
    let token = app.sign_up("ada").await;
    let project = app.create_project(&token, "Intro").await;
    app.renderer.fail_next_render(RendererError::Rejected {
        status: 503,
        error: Some("queue full".to_string()),
        body: r#"{"error":"queue full"}"#.to_string(),
    });

    let (status, body) = app.post(&render_uri(&project), Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Failed to start Manim rendering process");
    assert_eq!(body["error"]["detail"], "queue full");

    let stored = app.project(&token, project["id"].as_str().unwrap()).await;
    assert_eq!(stored["render_status"], "failed: renderer_status_503");
}

#[tokio::test]
async fn unreachable_renderer_is_recorded_as_comm_error() {
    let app = TestApp::new();
    let token = app.sign_up("ada").await;
    let project = app.create_project(&token, "Intro").await;
    app.renderer
        .fail_next_render(RendererError::Transport("connection refused".to_string()));

    let (status, body) = app.post(&render_uri(&project), Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Failed to connect to Manim renderer");

    let stored = app.project(&token, project["id"].as_str().unwrap()).await;
    assert_eq!(stored["render_status"], "failed: renderer_comm_error");
}

#[tokio::test]
async fn retrigger_clears_previous_video_and_bumps_version() {
    let app = TestApp::new();
    let token = app.sign_up("ada").await;
    let project = app.create_project(&token, "Intro").await;
    let id = project["id"].as_str().unwrap();

    app.post(&render_uri(&project), Some(&token), json!({})).await;
    let (status, _) = app
        .post(
            "/api/projects/render-callback?render_version=1",
            None,
            json!({ "project_id": id, "status": "completed", "video_url": "https://cdn.test/v1.mp4" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.project(&token, id).await["video_url"], "https://cdn.test/v1.mp4");

    let (status, _) = app.post(&render_uri(&project), Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let stored = app.project(&token, id).await;
    assert_eq!(stored["render_status"], "generating");
    assert_eq!(stored["video_url"], "");
    assert_eq!(stored["render_version"], 2);
    assert!(app
        .renderer
        .last_render()
        .unwrap()
        .callback_url
        .ends_with("?render_version=2"));
}

#[tokio::test]
async fn failed_generating_write_does_not_abort_the_render() {
    let app = TestApp::new();
    let token = app.sign_up("ada").await;
    let project = app.create_project(&token, "Intro").await;
    app.faults
        .fail_begin_render
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let (status, body) = app.post(&render_uri(&project), Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::ACCEPTED, "{}", body);
    assert_eq!(app.llm.calls(), 1);

    let job = app.renderer.last_render().expect("render job");
    assert_eq!(
        job.callback_url,
        format!("{}/api/projects/render-callback", PUBLIC_BASE_URL)
    );
    assert!(!job.callback_url.contains("render_version"));

    let stored = app.project(&token, project["id"].as_str().unwrap()).await;
    assert_eq!(stored["render_status"], "pending");
    assert_eq!(stored["render_version"], 0);
}
