/// Core error type for heartbot.
///
/// Adapter crates map their specific errors into this type so the engine can
/// tell a classified API rejection apart from everything else.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// Raw API failure as returned by an adapter, before classification.
    #[error("api error ({status}): {body}")]
    Api { status: u16, body: String },

    /// A failure that could not be mapped to an API error code.
    #[error("unclassified error: {0}")]
    Unclassified(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
