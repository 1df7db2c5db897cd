use std::sync::Arc;

use axum::{
    extract::FromRef,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::auth::TokenService;
use crate::config::{AppConfig, SecurityConfig};
use crate::database::{DatabaseManager, Repository};
use crate::handlers;
use crate::services::{CodeGenerator, GeminiClient, HttpRenderService, RenderService};

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub llm: Arc<dyn CodeGenerator>,
    pub renderer: Arc<dyn RenderService>,
    pub tokens: TokenService,
    pub config: Arc<AppConfig>,
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

impl AppState {
    /// Wires the production collaborators described by `config`.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let repo = DatabaseManager::connect(&config.database).await?;
        let llm = GeminiClient::new(&config.llm)?;
        let renderer = HttpRenderService::new(&config.renderer);
        let tokens = TokenService::new(&config.security)?;

        Ok(Self {
            repo,
            llm: Arc::new(llm),
            renderer: Arc::new(renderer),
            tokens,
            config: Arc::new(config),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);

    Router::new()
        .route("/", get(handlers::public::root))
        .route("/health", get(handlers::public::health))
        .merge(auth_public_routes())
        .merge(renderer_routes())
        .merge(account_routes())
        .merge(project_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

/// Endpoints called by the renderer and the merge UI; no bearer token.
fn renderer_routes() -> Router<AppState> {
    use handlers::public::{callback, merge};

    Router::new()
        .route("/api/projects/render-callback", post(callback::render_callback))
        .route("/api/merge_videos", post(merge::merge_videos))
}

fn account_routes() -> Router<AppState> {
    use handlers::protected::account;

    Router::new()
        .route("/api/profile", get(account::profile))
        .route("/api/delete", post(account::delete_account))
}

fn project_routes() -> Router<AppState> {
    use handlers::protected::projects;

    Router::new()
        .route(
            "/api/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/api/projects/:id",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/api/projects/:id/children", get(projects::list_children))
        .route(
            "/api/projects/:id/generate-render",
            post(projects::generate_render),
        )
}

/// Explicit origins get credentialed CORS; an empty list falls back to permissive.
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

/// Binds, serves and drains in-flight requests on SIGINT/SIGTERM.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let bind_addr = state.config.server.bind_addr();
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        "Manim orchestrator listening on http://{} (callbacks via {})",
        bind_addr,
        state.config.server.callback_base_url()
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received, draining connections");
}
