use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::{
    domain::{Cursor, Mention, StatusId},
    Result,
};

/// Hexagonal port for the remote microblogging service.
#[async_trait]
pub trait StatusApi: Send + Sync {
    /// Mentions of the authenticated account, newest first.
    ///
    /// `since` restricts the result to mentions strictly newer than that id;
    /// `None` means "everything available, bounded by `count`".
    async fn mentions_timeline(&self, since: Option<StatusId>, count: u32) -> Result<Vec<Mention>>;

    /// Publish one status. API-level failures come back as [`crate::Error::Api`]
    /// carrying the raw structured payload.
    async fn update_status(&self, status: &str, in_reply_to: Option<StatusId>)
        -> Result<StatusId>;
}

/// Durable single-value store for the last processed mention.
#[async_trait]
pub trait CursorStore: Send + Sync {
    async fn read(&self) -> Result<Cursor>;

    /// Full overwrite. Writing an empty cursor clears it.
    async fn write(&self, cursor: &Cursor) -> Result<()>;
}

/// Supplies compliment text.
#[async_trait]
pub trait ComplimentSource: Send + Sync {
    /// Generate one compliment for the given `@handles` (may be empty).
    ///
    /// The handles are addressed by the caller; sources must not prefix them.
    async fn generate(&self, mentioned: &BTreeSet<String>) -> Result<String>;
}
