//! Outbound posting: one status per call, with the remote response classified
//! into an accepted id or a numeric rejection code.

use std::sync::Arc;

use serde::Deserialize;

use crate::{domain::StatusId, errors::Error, ports::StatusApi, tokenizer::tokenize, Result};

/// Error code the platform returns when the exact same text was already posted
/// by this account ("Status is a duplicate.").
pub const DUPLICATE_CODE: i64 = 187;

/// Classified result of a post.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostOutcome {
    Accepted(StatusId),
    Rejected(i64),
}

impl PostOutcome {
    /// `0` when accepted, the platform error code otherwise.
    pub fn code(&self) -> i64 {
        match self {
            PostOutcome::Accepted(_) => 0,
            PostOutcome::Rejected(code) => *code,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, PostOutcome::Rejected(DUPLICATE_CODE))
    }
}

/// Result of sending a whole, possibly threaded, message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SendReport {
    /// Outcome of the last piece tried: the final piece when everything was
    /// accepted, the rejected piece otherwise.
    pub outcome: PostOutcome,
    /// Pieces accepted before `outcome`, plus the last one when it was accepted.
    pub posted: usize,
}

impl SendReport {
    /// Nothing reached the timeline.
    pub fn nothing_posted(&self) -> bool {
        self.posted == 0
    }
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    code: i64,
}

/// Extract the first error code from a structured error payload
/// (`{"errors":[{"code":187,"message":"..."}]}`).
pub fn error_code(payload: &str) -> Result<i64> {
    let parsed: ErrorPayload = serde_json::from_str(payload)
        .map_err(|e| Error::Unclassified(format!("unparseable error payload: {e}")))?;
    parsed
        .errors
        .first()
        .map(|entry| entry.code)
        .ok_or_else(|| Error::Unclassified("error payload has no entries".to_string()))
}

pub struct MessagePoster {
    api: Arc<dyn StatusApi>,
    limit: usize,
}

impl MessagePoster {
    pub fn new(api: Arc<dyn StatusApi>, limit: usize) -> Self {
        Self { api, limit }
    }

    /// Send exactly one status.
    ///
    /// Transport failures and payloads without a readable code are returned as
    /// [`Error::Unclassified`], never as an outcome.
    pub async fn post(&self, text: &str, reply_to: Option<StatusId>) -> Result<PostOutcome> {
        match self.api.update_status(text, reply_to).await {
            Ok(id) => Ok(PostOutcome::Accepted(id)),
            Err(Error::Api { status, body }) => {
                let code = error_code(&body)?;
                tracing::error!(http_status = status, code, "unable to post status");
                Ok(PostOutcome::Rejected(code))
            }
            Err(Error::Unclassified(msg)) => Err(Error::Unclassified(msg)),
            Err(other) => Err(Error::Unclassified(other.to_string())),
        }
    }

    /// Send a whole message, split into a reply thread when it exceeds the limit.
    ///
    /// Every piece is prefixed with `mentions`. The first piece replies to
    /// `reply_to`, each following piece to the one before it. Stops at the first
    /// rejected piece; pieces already accepted stay posted and are counted in
    /// [`SendReport::posted`].
    pub async fn send(
        &self,
        message: &str,
        reply_to: Option<StatusId>,
        mentions: &[String],
    ) -> Result<SendReport> {
        let pieces = tokenize(message, self.limit, mentions);
        let total = pieces.len();

        let mut target = reply_to;
        let mut posted = 0usize;
        let mut last = None;
        for (idx, piece) in pieces.iter().enumerate() {
            if total > 1 {
                tracing::debug!(piece = idx + 1, total, "posting thread piece");
            }
            let outcome = self.post(piece, target).await?;
            if let PostOutcome::Accepted(id) = outcome {
                target = Some(id);
                posted += 1;
                last = Some(outcome);
                continue;
            }
            if posted > 0 {
                tracing::warn!(posted, total, code = outcome.code(), "thread cut short");
            }
            return Ok(SendReport { outcome, posted });
        }

        last.map(|outcome| SendReport { outcome, posted })
            .ok_or_else(|| Error::Unclassified("empty message".to_string()))
    }
}

/// Compose an informational message, optionally tagged with hashtags.
///
/// `fallback_message("Nothing found.", &["love"])` → `"Nothing found. matching #love"`.
pub fn fallback_message(base: &str, hashtags: &[&str]) -> String {
    if hashtags.is_empty() {
        return base.to_string();
    }
    let tags = hashtags
        .iter()
        .map(|t| format!("#{t}"))
        .collect::<Vec<_>>()
        .join(" ");
    format!("{base} matching {tags}")
}
