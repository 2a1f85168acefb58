use std::sync::Arc;

use sea_orm::DatabaseConnection;
use topicsync::forum::{ApiRateLimiter, ForumClient};
use topicsync::sync::{ProgressCallback, SyncContext};

use crate::config::Config;

/// The context every command runs sync requests through.
pub(crate) type CliContext = SyncContext<ForumClient, DatabaseConnection>;

/// Create a rate limiter if rate limiting is enabled.
pub(crate) fn maybe_rate_limiter(no_rate_limit: bool, rps: u32) -> Option<ApiRateLimiter> {
    if no_rate_limit {
        None
    } else {
        Some(ApiRateLimiter::new(rps))
    }
}

/// Print a warning when rate limiting is disabled (TTY only).
pub(crate) fn warn_no_rate_limit(is_tty: bool) {
    if is_tty {
        eprintln!("Warning: Rate limiting disabled - you may experience API throttling\n");
    }
}

/// Build the Discourse client from configuration.
pub(crate) fn forum_client(
    config: &Config,
    no_rate_limit: bool,
) -> Result<ForumClient, Box<dyn std::error::Error>> {
    let url = config.discourse.url.as_deref().ok_or(
        "Discourse URL not configured. Set DISCOURSE_URL or [discourse] url in topicsync.toml",
    )?;
    let api_key = config.discourse.api_key.as_deref().ok_or(
        "Discourse API key not configured. Set DISCOURSE_API_KEY or [discourse] api_key",
    )?;

    let limiter = maybe_rate_limiter(
        no_rate_limit || config.discourse.no_rate_limit,
        config.discourse.requests_per_second,
    );

    Ok(ForumClient::new(
        url,
        api_key,
        &config.discourse.api_username,
        limiter,
    )?)
}

/// Connect to the database and assemble the sync context.
pub(crate) async fn build_context(
    config: &Config,
    database_url: &str,
    no_rate_limit: bool,
    progress: Option<Arc<ProgressCallback>>,
) -> Result<CliContext, Box<dyn std::error::Error>> {
    let forum = forum_client(config, no_rate_limit)?;
    let db = topicsync::db::connect(database_url).await?;

    let mut builder = CliContext::builder()
        .forum(forum)
        .store(db)
        .config(config.engine_config());
    if let Some(callback) = progress {
        builder = builder.progress(callback);
    }
    Ok(builder.build()?)
}
