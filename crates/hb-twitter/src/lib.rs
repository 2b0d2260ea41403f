//! Twitter adapter (REST v1.1, OAuth 1.0a user context).
//!
//! This crate implements the `hb-core` StatusApi port.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

pub mod oauth;

use hb_core::{
    config::Credentials,
    domain::{Mention, StatusId},
    errors::Error,
    ports::StatusApi,
    Result,
};

#[derive(Clone, Debug)]
pub struct TwitterClient {
    credentials: Credentials,
    api_base: String,
    http: reqwest::Client,
}

impl TwitterClient {
    pub fn new(
        credentials: Credentials,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("heartbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::External(format!("http client build error: {e}")))?;
        Ok(Self {
            credentials,
            api_base: api_base.into(),
            http,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.api_base)
    }

    fn map_err(e: reqwest::Error) -> Error {
        if e.is_timeout() {
            return Error::External(format!("twitter request timed out: {e}"));
        }
        Error::External(format!("twitter request error: {e}"))
    }

    /// Turn a non-2xx response into [`Error::Api`] with the raw body.
    async fn read_body(resp: reqwest::Response) -> Result<String> {
        let status = resp.status();
        let body = resp.text().await.map_err(Self::map_err)?;
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl StatusApi for TwitterClient {
    async fn mentions_timeline(&self, since: Option<StatusId>, count: u32) -> Result<Vec<Mention>> {
        let url = self.endpoint("statuses/mentions_timeline.json");

        let count = count.to_string();
        let since = since.map(|id| id.to_string());
        let mut params: Vec<(&str, &str)> = vec![("count", count.as_str())];
        if let Some(id) = &since {
            params.push(("since_id", id.as_str()));
        }

        let auth = oauth::authorization_header("GET", &url, &params, &self.credentials);
        let resp = self
            .http
            .get(&url)
            .query(&params)
            .header(reqwest::header::AUTHORIZATION, auth)
            .send()
            .await
            .map_err(Self::map_err)?;

        let body = Self::read_body(resp).await?;
        tracing::debug!(bytes = body.len(), "mentions timeline response");
        parse_mentions(&body)
    }

    async fn update_status(
        &self,
        status: &str,
        in_reply_to: Option<StatusId>,
    ) -> Result<StatusId> {
        let url = self.endpoint("statuses/update.json");

        let reply_to = in_reply_to.map(|id| id.to_string());
        let mut params: Vec<(&str, &str)> = vec![("status", status)];
        if let Some(id) = &reply_to {
            params.push(("in_reply_to_status_id", id.as_str()));
        }

        let auth = oauth::authorization_header("POST", &url, &params, &self.credentials);
        let resp = self
            .http
            .post(&url)
            .form(&params)
            .header(reqwest::header::AUTHORIZATION, auth)
            .send()
            .await
            .map_err(Self::map_err)?;

        let body = Self::read_body(resp).await?;
        let posted: PostedStatus = serde_json::from_str(&body)?;
        let id = parse_id(&posted.id_str)?;
        tracing::info!(status_id = %id, chars = status.chars().count(), "posted status");
        Ok(id)
    }
}

#[derive(Debug, Deserialize)]
struct TimelineStatus {
    id_str: String,
    user: User,
    #[serde(default)]
    entities: Entities,
}

#[derive(Debug, Deserialize)]
struct User {
    screen_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct Entities {
    #[serde(default)]
    user_mentions: Vec<User>,
}

#[derive(Debug, Deserialize)]
struct PostedStatus {
    id_str: String,
}

fn parse_id(raw: &str) -> Result<StatusId> {
    raw.parse::<StatusId>()
        .map_err(|e| Error::External(format!("invalid status id '{raw}': {e}")))
}

fn parse_mentions(body: &str) -> Result<Vec<Mention>> {
    let statuses: Vec<TimelineStatus> = serde_json::from_str(body)?;
    statuses
        .into_iter()
        .map(|s| {
            Ok(Mention {
                id: parse_id(&s.id_str)?,
                author_handle: s.user.screen_name,
                mentioned_handles: s
                    .entities
                    .user_mentions
                    .into_iter()
                    .map(|u| u.screen_name)
                    .collect(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mentions_timeline() {
        let body = r#"[
          {"id": 1050118621198921728, "id_str": "1050118621198921728",
           "text": "@heartbotapp @jill say something nice",
           "user": {"id": 1, "screen_name": "jessamyn"},
           "entities": {"hashtags": [], "user_mentions": [
              {"screen_name": "heartbotapp", "id": 2},
              {"screen_name": "jill", "id": 3}
           ]}},
          {"id_str": "123", "user": {"screen_name": "bob"}, "entities": {"user_mentions": []}}
        ]"#;

        let mentions = parse_mentions(body).unwrap();

        assert_eq!(mentions.len(), 2);
        assert_eq!(mentions[0].id, StatusId(1050118621198921728));
        assert_eq!(mentions[0].author_handle, "jessamyn");
        assert_eq!(mentions[0].mentioned_handles, vec!["heartbotapp", "jill"]);
        assert_eq!(mentions[1].id, StatusId(123));
        assert!(mentions[1].mentioned_handles.is_empty());
    }

    #[test]
    fn missing_entities_means_no_mentions() {
        let body = r#"[{"id_str": "9", "user": {"screen_name": "ann"}}]"#;
        let mentions = parse_mentions(body).unwrap();
        assert!(mentions[0].mentioned_handles.is_empty());
    }

    #[test]
    fn rejects_non_numeric_ids() {
        let body = r#"[{"id_str": "abc", "user": {"screen_name": "ann"}}]"#;
        assert!(matches!(parse_mentions(body), Err(Error::External(_))));
    }

    #[test]
    fn endpoint_joins_base() {
        let client = TwitterClient::new(
            Credentials {
                oauth_token: "t".to_string(),
                oauth_secret: "s".to_string(),
                consumer_key: "k".to_string(),
                consumer_secret: "c".to_string(),
            },
            "https://api.twitter.com/1.1",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.endpoint("statuses/update.json"),
            "https://api.twitter.com/1.1/statuses/update.json"
        );
    }
}
