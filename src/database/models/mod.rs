pub mod merged_video;
pub mod project;
pub mod user;

pub use merged_video::MergedVideo;
pub use project::{NewProject, Project, ProjectDetails, StatusWrite};
pub use user::{NewUser, User};
