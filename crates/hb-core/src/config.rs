use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use regex::Regex;

use crate::{errors::Error, Result};

pub const DEFAULT_BOT_HANDLE: &str = "heartbotapp";
pub const DEFAULT_API_BASE: &str = "https://api.twitter.com/1.1";

/// OAuth 1.0a user-context credentials for the bot account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub oauth_token: String,
    pub oauth_secret: String,
    pub consumer_key: String,
    pub consumer_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("oauth_token", &"<redacted>")
            .field("oauth_secret", &"<redacted>")
            .field("consumer_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Read the four required `TWITTER_*` values. A missing or blank value is a
    /// configuration error.
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |token: &str| -> Result<String> {
            let key = format!("TWITTER_{token}");
            lookup(&key)
                .and_then(non_empty)
                .ok_or_else(|| Error::Config(format!("Must set environment variable '{key}'")))
        };

        Ok(Self {
            oauth_token: required("OAUTH_TOKEN")?,
            oauth_secret: required("OAUTH_SECRET")?,
            consumer_key: required("CONSUMER_KEY")?,
            consumer_secret: required("CONSUMER_SECRET")?,
        })
    }
}

/// Typed configuration for the bot.
#[derive(Clone, Debug)]
pub struct Config {
    pub credentials: Credentials,

    /// Screen name of the bot account, without `@`.
    pub bot_handle: String,
    /// Maximum characters per post.
    pub post_limit: usize,

    pub database_path: PathBuf,
    /// JSON compliment data imported into an empty database.
    pub seed_path: Option<PathBuf>,
    pub api_base: String,
    pub http_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(&env_str)
    }

    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let credentials = Credentials::from_lookup(lookup)?;

        let bot_handle = parse_handle(
            lookup("HEARTBOT_HANDLE")
                .and_then(non_empty)
                .as_deref()
                .unwrap_or(DEFAULT_BOT_HANDLE),
        )?;

        let post_limit = parse_num(lookup, "HEARTBOT_POST_LIMIT")?.unwrap_or(140);
        if post_limit == 0 {
            return Err(Error::Config(
                "HEARTBOT_POST_LIMIT must be greater than zero".to_string(),
            ));
        }

        let database_path = PathBuf::from(
            lookup("HEARTBOT_DATABASE_PATH")
                .and_then(non_empty)
                .unwrap_or_else(|| "heartbot.db".to_string()),
        );
        let seed_path = lookup("HEARTBOT_SEED_PATH")
            .and_then(non_empty)
            .map(PathBuf::from);
        let api_base = lookup("TWITTER_API_BASE")
            .and_then(non_empty)
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let http_timeout =
            Duration::from_secs(parse_num(lookup, "HEARTBOT_HTTP_TIMEOUT_SECS")?.unwrap_or(30));

        Ok(Self {
            credentials,
            bot_handle,
            post_limit,
            database_path,
            seed_path,
            api_base,
            http_timeout,
        })
    }
}

fn parse_handle(raw: &str) -> Result<String> {
    let re = Regex::new(r"^@?([A-Za-z0-9_]{1,15})$").expect("valid regex");
    re.captures(raw.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::Config(format!("HEARTBOT_HANDLE is not a valid screen name: {raw}")))
}

fn parse_num<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    let Some(raw) = lookup(key).and_then(non_empty) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} must be a number, got '{raw}'")))
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim().trim_start_matches("export ").trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
