// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (bearer JWT via the `AuthUser` extractor)

pub mod protected; // /api/profile, /api/delete, /api/projects/*
pub mod public;    // /, /health, /auth/*, renderer callback, merge proxy
pub mod validate;
