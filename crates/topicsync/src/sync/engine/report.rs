//! Progress arithmetic and caller instructions.

use crate::sync::response::ProgressSummary;

/// Instruction returned while questions remain.
pub const NEXT_ACTION_CONTINUE: &str =
    "More questions remain. Call sync again with the same parameters to process the next batch.";

/// Number of calls needed for `remaining` questions.
pub fn remaining_batches(remaining: usize, batch_size: usize) -> usize {
    remaining.div_ceil(batch_size.max(1))
}

/// Human readable duration estimate, e.g. `~45 seconds` or `~2 minutes`.
pub fn estimate_sync_time(seconds: u64) -> String {
    if seconds < 60 {
        let unit = if seconds == 1 { "second" } else { "seconds" };
        return format!("~{} {}", seconds, unit);
    }
    let minutes = seconds.div_ceil(60);
    let unit = if minutes == 1 { "minute" } else { "minutes" };
    format!("~{} {}", minutes, unit)
}

pub fn next_action(remaining: usize) -> Option<String> {
    (remaining > 0).then(|| NEXT_ACTION_CONTINUE.to_string())
}

/// Progress after this call's batch.
pub fn build_progress(
    total_questions: usize,
    already_synced: usize,
    to_create: usize,
    processed: usize,
    batch_size: usize,
) -> ProgressSummary {
    let remaining = to_create.saturating_sub(processed);
    ProgressSummary {
        total_questions,
        already_synced,
        remaining_to_create: remaining,
        estimated_batches_remaining: remaining_batches(remaining, batch_size),
        batch_size,
    }
}
