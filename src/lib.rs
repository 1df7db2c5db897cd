pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod services;
pub mod types;

pub use app::{router, AppState};
pub use config::AppConfig;
pub use error::ApiError;
