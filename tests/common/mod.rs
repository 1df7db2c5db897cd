#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use manim_orchestrator::auth::TokenService;
use manim_orchestrator::database::models::{
    MergedVideo, NewProject, NewUser, Project, ProjectDetails, StatusWrite, User,
};
use manim_orchestrator::database::{
    DatabaseError, MemoryRepository, MergedVideoRepository, ProjectRepository, Repository,
    UserRepository,
};
use manim_orchestrator::types::RenderStatus;
use uuid::Uuid;
use manim_orchestrator::services::{
    CodeGenerator, LlmError, MergeOutcome, RenderRequest, RenderService, RendererError,
};
use manim_orchestrator::{router, AppConfig, AppState};

pub const INTERNAL_STORAGE: &str = "https://pub-internal.r2.dev";
pub const PUBLIC_STORAGE: &str = "https://videos.example.com";
pub const PUBLIC_BASE_URL: &str = "http://api.test";

pub const SCRIPT: &str = "from manim import *\n\nclass Scene1(Scene):\n    def construct(self):\n        self.wait(1)";

/// Code generator that returns a fixed script, or fails when told to.
#[derive(Default)]
pub struct FakeCodeGenerator {
    pub fail: Mutex<bool>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeCodeGenerator {
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl CodeGenerator for FakeCodeGenerator {
    async fn generate_scene(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if *self.fail.lock().unwrap() {
            return Err(LlmError::MissingCodeBlock);
        }
        Ok(SCRIPT.to_string())
    }
}

/// Renderer that records render jobs and merges on the internal storage domain.
/// A queued error is returned once by the next call.
#[derive(Default)]
pub struct FakeRenderService {
    pub renders: Mutex<Vec<RenderRequest>>,
    pub merges: Mutex<Vec<Vec<String>>>,
    pub next_render_error: Mutex<Option<RendererError>>,
    pub next_merge_error: Mutex<Option<RendererError>>,
}

impl FakeRenderService {
    pub fn last_render(&self) -> Option<RenderRequest> {
        self.renders.lock().unwrap().last().cloned()
    }

    pub fn fail_next_render(&self, err: RendererError) {
        *self.next_render_error.lock().unwrap() = Some(err);
    }

    pub fn fail_next_merge(&self, err: RendererError) {
        *self.next_merge_error.lock().unwrap() = Some(err);
    }
}

#[async_trait]
impl RenderService for FakeRenderService {
    async fn start_render(&self, request: &RenderRequest) -> Result<(), RendererError> {
        if let Some(err) = self.next_render_error.lock().unwrap().take() {
            return Err(err);
        }
        self.renders.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn merge_videos(&self, ids: &[String]) -> Result<MergeOutcome, RendererError> {
        if let Some(err) = self.next_merge_error.lock().unwrap().take() {
            return Err(err);
        }
        self.merges.lock().unwrap().push(ids.to_vec());
        let merged_video_id = format!("merged-{}", ids.join("-"));
        Ok(MergeOutcome {
            message: Some("merged".to_string()),
            merged_video_url: format!("{}/merged/{}.mp4", INTERNAL_STORAGE, merged_video_id),
            merged_video_id,
        })
    }
}

/// Memory repository whose writes can be switched to fail one kind at a time.
pub struct FaultyRepository {
    inner: Arc<MemoryRepository>,
    pub fail_begin_render: AtomicBool,
    pub fail_merged_video_upsert: AtomicBool,
}

impl FaultyRepository {
    pub fn new(inner: Arc<MemoryRepository>) -> Self {
        Self {
            inner,
            fail_begin_render: AtomicBool::new(false),
            fail_merged_video_upsert: AtomicBool::new(false),
        }
    }

    fn injected(flag: &AtomicBool) -> Result<(), DatabaseError> {
        if flag.load(Ordering::SeqCst) {
            return Err(DatabaseError::ConnectionError("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for FaultyRepository {
    async fn create_user(&self, new_user: NewUser) -> Result<User, DatabaseError> {
        self.inner.create_user(new_user).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        self.inner.find_user_by_email(email).await
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, DatabaseError> {
        self.inner.delete_user(id).await
    }
}

#[async_trait]
impl ProjectRepository for FaultyRepository {
    async fn create_project(&self, new_project: NewProject) -> Result<Project, DatabaseError> {
        self.inner.create_project(new_project).await
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, DatabaseError> {
        self.inner.find_project(id).await
    }

    async fn find_project_by_name(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> Result<Option<Project>, DatabaseError> {
        self.inner.find_project_by_name(user_id, name).await
    }

    async fn list_projects(&self, user_id: Uuid) -> Result<Vec<Project>, DatabaseError> {
        self.inner.list_projects(user_id).await
    }

    async fn list_child_projects(&self, parent_id: Uuid) -> Result<Vec<Project>, DatabaseError> {
        self.inner.list_child_projects(parent_id).await
    }

    async fn update_project_details(
        &self,
        id: Uuid,
        details: &ProjectDetails,
    ) -> Result<Project, DatabaseError> {
        self.inner.update_project_details(id, details).await
    }

    async fn delete_project(&self, id: Uuid, user_id: Uuid) -> Result<bool, DatabaseError> {
        self.inner.delete_project(id, user_id).await
    }

    async fn begin_render(&self, id: Uuid) -> Result<i64, DatabaseError> {
        Self::injected(&self.fail_begin_render)?;
        self.inner.begin_render(id).await
    }

    async fn set_render_status(
        &self,
        id: Uuid,
        status: &RenderStatus,
        expected_version: Option<i64>,
    ) -> Result<StatusWrite, DatabaseError> {
        self.inner.set_render_status(id, status, expected_version).await
    }
}

#[async_trait]
impl MergedVideoRepository for FaultyRepository {
    async fn upsert_merged_video(&self, id: &str, r2_url: &str) -> Result<MergedVideo, DatabaseError> {
        Self::injected(&self.fail_merged_video_upsert)?;
        self.inner.upsert_merged_video(id, r2_url).await
    }
}

#[async_trait]
impl Repository for FaultyRepository {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        self.inner.health_check().await
    }
}

pub fn test_config() -> AppConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("JWT_SECRET", "integration-test-secret"),
        ("DATABASE_URL", "memory:"),
        ("GEMINI_API_KEY", "test-key"),
        ("MANIM_RENDERER_URL", "http://renderer.test"),
        ("PUBLIC_BASE_URL", PUBLIC_BASE_URL),
        ("PYTHON_R2_INTERNAL_DOMAIN", INTERNAL_STORAGE),
        ("FRONTEND_R2_PUBLIC_DOMAIN", PUBLIC_STORAGE),
    ]);
    AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
        .expect("test configuration is valid")
}

/// Router over an in-memory repository and fake collaborators.
pub struct TestApp {
    pub router: Router,
    pub repo: Arc<MemoryRepository>,
    pub faults: Arc<FaultyRepository>,
    pub llm: Arc<FakeCodeGenerator>,
    pub renderer: Arc<FakeRenderService>,
    pub tokens: TokenService,
}

impl TestApp {
    pub fn new() -> Self {
        let config = test_config();
        let repo = Arc::new(MemoryRepository::new());
        let faults = Arc::new(FaultyRepository::new(repo.clone()));
        let llm = Arc::new(FakeCodeGenerator::default());
        let renderer = Arc::new(FakeRenderService::default());
        let tokens = TokenService::new(&config.security).expect("token service");

        let state = AppState {
            repo: faults.clone(),
            llm: llm.clone(),
            renderer: renderer.clone(),
            tokens: tokens.clone(),
            config: Arc::new(config),
        };

        Self {
            router: router(state),
            repo,
            faults,
            llm,
            renderer,
            tokens,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    pub async fn register(&self, username: &str, email: &str) -> (StatusCode, Value) {
        self.post(
            "/auth/register",
            None,
            json!({ "username": username, "email": email, "password": "correct-horse" }),
        )
        .await
    }

    /// Registers `username` and returns a bearer token for them.
    pub async fn sign_up(&self, username: &str) -> String {
        let email = format!("{}@example.com", username);
        let (status, body) = self.register(username, &email).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);

        let (status, body) = self
            .post(
                "/auth/login",
                None,
                json!({ "email": email, "password": "correct-horse" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["data"]["token"].as_str().expect("token").to_string()
    }

    /// Creates a project and returns its `data` object.
    pub async fn create_project(&self, token: &str, name: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/projects",
                Some(token),
                json!({ "name": name, "prompt": "a blue circle fading into view" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }

    pub async fn project(&self, token: &str, id: &str) -> Value {
        let (status, body) = self.get(&format!("/api/projects/{}", id), Some(token)).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["data"].clone()
    }
}
