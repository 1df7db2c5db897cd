pub mod format;
pub mod response;

pub use format::ProjectResponse;
pub use response::{ApiResponse, ApiResult};
