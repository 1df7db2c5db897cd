// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Each handler takes an `AuthUser` parameter; a missing or invalid bearer
// token is rejected with 401 before the handler body runs.

pub mod account;  // Caller's own account
pub mod projects; // Project CRUD and render trigger
