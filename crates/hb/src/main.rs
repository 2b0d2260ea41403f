use std::{process::ExitCode, sync::Arc};

use anyhow::Context;

use hb_core::{config::Config, engine::MentionReplyEngine};
use hb_store::SqliteStore;
use hb_twitter::TwitterClient;

mod cli;

use cli::Command;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let command = match cli::parse(std::env::args_os().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", cli::USAGE);
            return ExitCode::from(e.exit_status());
        }
    };

    if let Err(e) = hb_core::logging::init("hb") {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::from(1);
    }

    match run(command).await {
        Ok(value) => ExitCode::from(cli::exit_status(value)),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(command: Command) -> anyhow::Result<usize> {
    let cfg = Config::load().context("loading configuration")?;

    let api = Arc::new(
        TwitterClient::new(cfg.credentials.clone(), cfg.api_base.clone(), cfg.http_timeout)
            .context("building twitter client")?,
    );
    let store = Arc::new(
        SqliteStore::open(&cfg.database_path)
            .with_context(|| format!("opening {}", cfg.database_path.display()))?,
    );
    if let Some(seed) = &cfg.seed_path {
        store
            .seed_if_empty(seed)
            .with_context(|| format!("seeding from {}", seed.display()))?;
    }

    let engine = MentionReplyEngine::new(
        api,
        store.clone(),
        store,
        cfg.bot_handle.clone(),
        cfg.post_limit,
    );

    match command {
        Command::PostMessage => {
            let outcome = engine.post_message().await.context("posting message")?;
            Ok(usize::try_from(outcome.code()).unwrap_or(usize::MAX))
        }
        Command::ReplyToMentions => engine
            .reply_to_mentions()
            .await
            .context("replying to mentions"),
    }
}
