//! `sync` and `dry-run` commands.

use std::sync::Arc;

use console::{Term, style};
use topicsync::sync::{
    DryRunResponse, ItemStatus, SyncAction, SyncOutcome, SyncRequest, SyncResponse,
};

use crate::commands::shared::{CliContext, build_context, warn_no_rate_limit};
use crate::config::Config;
use crate::progress::ProgressReporter;
use crate::shutdown::is_shutdown_requested;

/// Options shared by `sync` and `dry-run`.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SyncArgs {
    /// Only handle one license pool (technician, general or extra)
    #[arg(short, long)]
    pub license: Option<String>,

    /// Questions per call, clamped to 1..=100 (default from config or 50)
    #[arg(short, long)]
    pub batch_size: Option<i64>,

    /// Print the raw JSON response instead of a summary
    #[arg(long)]
    pub json: bool,

    /// Disable proactive rate limiting (may cause API throttling)
    #[arg(short = 'R', long)]
    pub no_rate_limit: bool,
}

impl SyncArgs {
    fn request(
        &self,
        action: &str,
        config: &Config,
    ) -> Result<SyncRequest, Box<dyn std::error::Error>> {
        Ok(SyncRequest::parse(
            action,
            self.license.as_deref(),
            self.batch_size.or(config.sync.batch_size),
        )?)
    }
}

struct Session {
    ctx: CliContext,
    reporter: Arc<ProgressReporter>,
    is_tty: bool,
}

async fn session(
    args: &SyncArgs,
    config: &Config,
    database_url: &str,
) -> Result<Session, Box<dyn std::error::Error>> {
    let is_tty = Term::stdout().is_term() && !args.json;
    if args.no_rate_limit {
        warn_no_rate_limit(is_tty);
    }

    let reporter = Arc::new(if is_tty {
        ProgressReporter::new()
    } else {
        ProgressReporter::logging()
    });
    let ctx = build_context(
        config,
        database_url,
        args.no_rate_limit,
        Some(reporter.as_callback()),
    )
    .await?;

    Ok(Session {
        ctx,
        reporter,
        is_tty,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NextStep {
    Continue,
    Complete,
    Stalled,
}

/// Decide whether `--until-complete` should make another call.
///
/// Linked topics outside the scanned category are found again on every
/// call, so a batch can report work without shrinking the remainder.
fn next_step(previous_remaining: Option<usize>, response: &SyncResponse) -> NextStep {
    if response.complete {
        return NextStep::Complete;
    }
    let remaining = response.progress.remaining_to_create;
    if previous_remaining.is_some_and(|previous| remaining >= previous) {
        return NextStep::Stalled;
    }
    let progressed = response.batch.created + response.batch.linked + response.batch.partial;
    if progressed == 0 {
        return NextStep::Stalled;
    }
    NextStep::Continue
}

/// Handle `topicsync sync`.
pub(crate) async fn handle_sync(
    args: SyncArgs,
    until_complete: bool,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = args.request(SyncAction::Sync.as_str(), config)?;
    let session = session(&args, config, database_url).await?;

    let mut calls = 0usize;
    let mut previous_remaining = None;
    loop {
        calls += 1;
        let response = match session.ctx.handle(request.clone()).await {
            Ok(SyncOutcome::Sync(response)) => response,
            Ok(SyncOutcome::DryRun(_)) => return Err("unexpected dry-run response".into()),
            Err(e) => {
                session.reporter.finish();
                return Err(e.into());
            }
        };
        session.reporter.finish();

        if args.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
        } else {
            print_sync_summary(&response, session.is_tty);
        }

        if !until_complete {
            break;
        }
        match next_step(previous_remaining, &response) {
            NextStep::Continue => {}
            NextStep::Complete => break,
            NextStep::Stalled => {
                tracing::warn!(
                    remaining = response.progress.remaining_to_create,
                    linked = response.batch.linked,
                    errors = response.batch.errors,
                    "Remaining count did not drop, stopping"
                );
                break;
            }
        }
        previous_remaining = Some(response.progress.remaining_to_create);
        if is_shutdown_requested() {
            tracing::warn!(calls, "Stopping after current batch");
            break;
        }
    }

    if until_complete && session.is_tty {
        println!("\n{} call(s) made", calls);
    }
    Ok(())
}

/// Handle `topicsync dry-run`.
pub(crate) async fn handle_dry_run(
    args: SyncArgs,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = args.request(SyncAction::DryRun.as_str(), config)?;
    let session = session(&args, config, database_url).await?;

    let result = session.ctx.handle(request).await;
    session.reporter.finish();

    match result? {
        SyncOutcome::DryRun(response) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_dry_run_summary(&response, session.is_tty);
            }
            Ok(())
        }
        SyncOutcome::Sync(_) => Err("unexpected sync response".into()),
    }
}

fn print_sync_summary(response: &SyncResponse, is_tty: bool) {
    let batch = &response.batch;
    let progress = &response.progress;

    if !is_tty {
        tracing::info!(
            processed = batch.processed,
            created = batch.created,
            linked = batch.linked,
            errors = batch.errors,
            partial = batch.partial,
            remaining = progress.remaining_to_create,
            complete = response.complete,
            "Sync batch complete"
        );
        return;
    }

    let mark = if response.success {
        style("✓").green().bold()
    } else {
        style("⚠").yellow().bold()
    };
    println!(
        "\n{} Processed {} question(s): {} created, {} linked, {} error(s), {} partial",
        mark, batch.processed, batch.created, batch.linked, batch.errors, batch.partial
    );
    println!(
        "  {} question(s) in scope, {} remaining",
        progress.total_questions, progress.remaining_to_create
    );

    for item in &response.details {
        match item.status {
            ItemStatus::Error | ItemStatus::Partial => {
                let label = if item.status == ItemStatus::Partial {
                    "partial"
                } else {
                    "error"
                };
                println!(
                    "  {} {} ({}): {}",
                    style("✗").red(),
                    style(&item.question_id).cyan(),
                    label,
                    item.error.as_deref().unwrap_or("unknown error")
                );
            }
            ItemStatus::Created | ItemStatus::Linked => {}
        }
    }

    if response.complete {
        println!("{}", style("All questions have topics.").green());
    } else if let Some(next) = &response.next_action {
        println!("{}", style(next).dim());
    }
}

fn print_dry_run_summary(response: &DryRunResponse, is_tty: bool) {
    let summary = &response.summary;

    if !is_tty {
        tracing::info!(
            total = summary.total_questions,
            to_create = summary.total_to_create,
            existing = summary.total_existing,
            batches = summary.estimated_batches,
            estimated_time = %summary.estimated_time,
            "Dry run complete"
        );
        return;
    }

    println!(
        "\n{} {} question(s): {} to create, {} existing",
        style("Dry run:").bold(),
        summary.total_questions,
        style(summary.total_to_create).cyan(),
        summary.total_existing
    );
    println!(
        "  {} batch(es) of {}, about {}",
        summary.estimated_batches, summary.batch_size, summary.estimated_time
    );

    for category in &response.categories {
        println!(
            "\n  {} ({}, id {}): {} to create, {} existing",
            style(category.license).bold(),
            category.category_slug,
            category.category_id,
            category.to_create,
            category.existing
        );
        for example in &category.examples {
            println!("    {} {}", style(&example.question_id).cyan(), example.title);
        }
    }

    if response.to_create_ids.truncated {
        println!(
            "\n  First {} of {} to create: {}",
            response.to_create_ids.ids.len(),
            response.to_create_ids.total,
            response.to_create_ids.ids.join(", ")
        );
    } else if !response.to_create_ids.ids.is_empty() {
        println!("\n  To create: {}", response.to_create_ids.ids.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topicsync::sync::{BatchSummary, ProgressSummary};

    fn response(created: usize, linked: usize, remaining: usize) -> SyncResponse {
        SyncResponse {
            success: true,
            complete: remaining == 0,
            batch: BatchSummary {
                processed: created + linked,
                created,
                linked,
                ..BatchSummary::default()
            },
            progress: ProgressSummary {
                remaining_to_create: remaining,
                ..ProgressSummary::default()
            },
            details: Vec::new(),
            next_action: None,
        }
    }

    #[test]
    fn test_first_call_with_progress_continues() {
        assert_eq!(next_step(None, &response(2, 0, 3)), NextStep::Continue);
    }

    #[test]
    fn test_complete_stops() {
        assert_eq!(next_step(Some(2), &response(2, 0, 0)), NextStep::Complete);
    }

    #[test]
    fn test_shrinking_remainder_continues() {
        assert_eq!(next_step(Some(3), &response(2, 0, 1)), NextStep::Continue);
    }

    #[test]
    fn test_relinking_without_shrinking_stalls() {
        // Two topics linked outside the category on every call.
        assert_eq!(next_step(None, &response(0, 2, 1)), NextStep::Continue);
        assert_eq!(next_step(Some(1), &response(0, 2, 1)), NextStep::Stalled);
    }

    #[test]
    fn test_batch_of_errors_stalls() {
        let mut failed = response(0, 0, 4);
        failed.batch.errors = 2;
        failed.success = false;
        assert_eq!(next_step(None, &failed), NextStep::Stalled);
    }
}
