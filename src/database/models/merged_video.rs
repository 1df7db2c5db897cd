use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct MergedVideo {
    pub id: String,
    pub r2_url: String,
}
