pub mod auth;
pub mod health;
pub mod merge;
pub mod project;
