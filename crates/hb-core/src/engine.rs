//! Mention-reply engine.
//!
//! One run: read the cursor, fetch mentions newer than it, reply to each one
//! oldest first, and overwrite the cursor after every mention. The cursor
//! advances whatever the reply outcome was, so a mention is attempted at most
//! once across runs.

use std::{collections::BTreeSet, sync::Arc};

use crate::{
    domain::{Cursor, Mention, StatusId},
    poster::{fallback_message, MessagePoster, PostOutcome},
    ports::{ComplimentSource, CursorStore, StatusApi},
    Result,
};

/// Page size for a mentions fetch (platform maximum).
pub const MENTION_PAGE_SIZE: u32 = 200;

/// Attempts per mention while the platform keeps rejecting duplicates.
pub const MAX_REPLY_TRIES: u32 = 11;

/// The try that stops asking the compliment source and posts
/// [`NO_COMPLIMENTS`] instead.
pub const FALLBACK_TRY: u32 = MAX_REPLY_TRIES - 1;

/// Sentinel text when no compliment can be produced.
pub const NO_COMPLIMENTS: &str = "No compliments found.";

/// How the reply to one mention ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success(StatusId),
    /// Every try, fallback included, was rejected as a duplicate.
    DuplicateRejected,
    /// The first piece was rejected with a code other than duplicate.
    OtherError(i64),
    /// Part of a thread went out before a later piece was rejected. Not
    /// retried, the reply already reached the timeline.
    PartialThread { posted: usize, code: i64 },
}

/// Transient record of replying to one mention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyAttempt {
    pub mention_id: StatusId,
    pub text: String,
    pub tries: u32,
    pub outcome: AttemptOutcome,
}

pub struct MentionReplyEngine {
    api: Arc<dyn StatusApi>,
    cursor: Arc<dyn CursorStore>,
    compliments: Arc<dyn ComplimentSource>,
    poster: MessagePoster,
    bot_handle: String,
}

impl MentionReplyEngine {
    pub fn new(
        api: Arc<dyn StatusApi>,
        cursor: Arc<dyn CursorStore>,
        compliments: Arc<dyn ComplimentSource>,
        bot_handle: impl Into<String>,
        post_limit: usize,
    ) -> Self {
        Self {
            poster: MessagePoster::new(api.clone(), post_limit),
            api,
            cursor,
            compliments,
            bot_handle: bot_handle.into(),
        }
    }

    /// Post one compliment to the timeline (no reply target, no retry).
    pub async fn post_message(&self) -> Result<PostOutcome> {
        let compliment = self.compliments.generate(&BTreeSet::new()).await?;
        let report = self.poster.send(&compliment, None, &[]).await?;
        match report.outcome {
            PostOutcome::Accepted(id) => tracing::info!(status_id = %id, "posted compliment"),
            PostOutcome::Rejected(code) => {
                tracing::warn!(code, posted = report.posted, "compliment rejected")
            }
        }
        Ok(report.outcome)
    }

    /// Reply to every mention newer than the cursor.
    ///
    /// Returns the number of mentions iterated, independent of reply outcomes.
    /// A failure while replying to one mention is logged and does not stop the
    /// batch; fetch and cursor-store failures propagate.
    pub async fn reply_to_mentions(&self) -> Result<usize> {
        let cursor = self.cursor.read().await?;
        tracing::debug!(since_id = ?cursor.last_id, "retrieved cursor");

        let mentions = self
            .api
            .mentions_timeline(cursor.last_id, MENTION_PAGE_SIZE)
            .await?;
        tracing::info!("Retrieved {} mentions", mentions.len());

        let mut processed = 0usize;
        // Timeline is newest first; walk it oldest first so the cursor only moves forward.
        for mention in mentions.iter().rev() {
            let mentioned = self.reply_targets(mention);

            match self.reply_to(mention, &mentioned).await {
                Ok(attempt) => log_attempt(&attempt, &mentioned),
                Err(e) => tracing::error!(
                    mention_id = %mention.id,
                    error = %e,
                    "failed to reply to mention"
                ),
            }

            processed += 1;
            tracing::info!(mention_id = %mention.id, "storing cursor");
            self.cursor.write(&Cursor::at(mention.id)).await?;
        }

        Ok(processed)
    }

    /// `@author` plus every `@handle` the mention references, minus the bot itself.
    ///
    /// Screen names are case-insensitive; the first spelling seen wins.
    pub fn reply_targets(&self, mention: &Mention) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        std::iter::once(&mention.author_handle)
            .chain(mention.mentioned_handles.iter())
            .filter(|handle| !handle.eq_ignore_ascii_case(&self.bot_handle))
            .filter(|handle| seen.insert(handle.to_ascii_lowercase()))
            .map(|handle| format!("@{handle}"))
            .collect()
    }

    /// Duplicate-retry loop for one mention.
    async fn reply_to(
        &self,
        mention: &Mention,
        mentioned: &BTreeSet<String>,
    ) -> Result<ReplyAttempt> {
        let handles: Vec<String> = mentioned.iter().cloned().collect();
        let mut text = String::new();

        for tries in 0..MAX_REPLY_TRIES {
            text = if tries == FALLBACK_TRY {
                fallback_message(NO_COMPLIMENTS, &[])
            } else {
                self.compliments.generate(mentioned).await?
            };

            let report = self.poster.send(&text, Some(mention.id), &handles).await?;
            let outcome = match report.outcome {
                PostOutcome::Accepted(id) => AttemptOutcome::Success(id),
                rejected if !report.nothing_posted() => AttemptOutcome::PartialThread {
                    posted: report.posted,
                    code: rejected.code(),
                },
                rejected if rejected.is_duplicate() => {
                    tracing::debug!(mention_id = %mention.id, tries, "duplicate, retrying");
                    continue;
                }
                PostOutcome::Rejected(code) => AttemptOutcome::OtherError(code),
            };

            return Ok(ReplyAttempt {
                mention_id: mention.id,
                text,
                tries: tries + 1,
                outcome,
            });
        }

        Ok(ReplyAttempt {
            mention_id: mention.id,
            text,
            tries: MAX_REPLY_TRIES,
            outcome: AttemptOutcome::DuplicateRejected,
        })
    }
}

fn log_attempt(attempt: &ReplyAttempt, mentioned: &BTreeSet<String>) {
    let to = mentioned.iter().cloned().collect::<Vec<_>>().join(" ");
    match attempt.outcome {
        AttemptOutcome::Success(id) => tracing::info!(
            mention_id = %attempt.mention_id,
            status_id = %id,
            tries = attempt.tries,
            "replied to {to}"
        ),
        AttemptOutcome::OtherError(code) => tracing::error!(
            mention_id = %attempt.mention_id,
            code,
            "unable to reply to {to}"
        ),
        AttemptOutcome::PartialThread { posted, code } => tracing::warn!(
            mention_id = %attempt.mention_id,
            posted,
            code,
            "partial reply to {to}"
        ),
        AttemptOutcome::DuplicateRejected => tracing::error!(
            mention_id = %attempt.mention_id,
            tries = attempt.tries,
            "unable to post duplicate message to {to}: {}",
            attempt.text
        ),
    }
}
