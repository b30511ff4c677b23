#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to parse feed: {0}")]
    FeedParse(String),
    #[error("Unexpected response shape: {0}")]
    ResponseShape(&'static str),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
