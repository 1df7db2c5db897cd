// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition, service metadata, and the two endpoints the renderer
// side talks to (render callback, merge proxy).

pub mod auth;
pub mod callback;
pub mod merge;
pub mod system;

pub use system::{health, root};
