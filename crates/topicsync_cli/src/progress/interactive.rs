use std::collections::BTreeMap;
use std::sync::Mutex;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use topicsync::LicenseTier;
use topicsync::sync::SyncProgress;

/// Consolidated progress state to avoid multiple mutex locks.
#[derive(Default)]
struct ProgressState {
    /// Scan spinners by tier.
    scan_bars: BTreeMap<LicenseTier, ProgressBar>,
    /// Spinner for the question store read.
    load_bar: Option<ProgressBar>,
    /// Bar for topic creation.
    create_bar: Option<ProgressBar>,
}

/// Interactive progress reporter using indicatif.
pub struct InteractiveReporter {
    multi: MultiProgress,
    state: Mutex<ProgressState>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            state: Mutex::new(ProgressState::default()),
        }
    }

    fn spinner(&self, prefix: &str, message: String) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(Self::spinner_style());
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        bar.set_prefix(format!("{:12}", prefix));
        bar.set_message(message);
        bar
    }

    pub fn handle(&self, event: SyncProgress) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };

        match event {
            SyncProgress::ScanningCategory { license, category } => {
                let bar = self.spinner(license.as_str(), format!("Scanning '{}'...", category));
                state.scan_bars.insert(license, bar);
            }

            SyncProgress::ScannedPage {
                license,
                page,
                found_so_far,
                ..
            } => {
                if let Some(bar) = state.scan_bars.get(&license) {
                    bar.set_message(format!(
                        "Page {} ({} question topics)",
                        page + 1,
                        found_so_far
                    ));
                }
            }

            SyncProgress::ScanComplete { existing } => {
                for bar in state.scan_bars.values() {
                    if !bar.is_finished() {
                        bar.finish_with_message("done");
                    }
                }
                self.multi
                    .println(format!("Found {} existing question topics", existing))
                    .ok();
            }

            SyncProgress::LoadingQuestions => {
                state.load_bar = Some(self.spinner("questions", "Loading...".to_string()));
            }

            SyncProgress::QuestionsLoaded { total } => {
                if let Some(bar) = state.load_bar.take() {
                    bar.finish_with_message(format!("{} loaded", total));
                }
            }

            SyncProgress::BatchPlanned {
                to_create,
                batch,
                existing,
            } => {
                let bar = self.multi.add(ProgressBar::new(batch as u64));
                bar.set_style(Self::bar_style());
                bar.set_prefix(format!("{:12}", "topics"));
                bar.set_message(format!(
                    "{} to create, {} already on the forum",
                    to_create, existing
                ));
                state.create_bar = Some(bar);
            }

            SyncProgress::CreatingTopic { question_id, .. } => {
                if let Some(ref bar) = state.create_bar {
                    bar.set_message(question_id);
                }
            }

            SyncProgress::TopicCreated { .. } | SyncProgress::TopicLinked { .. } => {
                if let Some(ref bar) = state.create_bar {
                    bar.inc(1);
                }
            }

            SyncProgress::TopicError { question_id, error } => {
                if let Some(ref bar) = state.create_bar {
                    bar.inc(1);
                }
                self.multi
                    .println(format!("  ✗ {}: {}", question_id, error))
                    .ok();
            }

            SyncProgress::PersistRetry {
                question_id,
                retry_after_ms,
                attempt,
            } => {
                if let Some(ref bar) = state.create_bar {
                    bar.set_message(format!(
                        "{}: database busy, retry {} in {}ms",
                        question_id, attempt, retry_after_ms
                    ));
                }
            }

            SyncProgress::PersistPartial { question_id, error } => {
                self.multi
                    .println(format!("  ! {}: topic created but not saved: {}", question_id, error))
                    .ok();
            }

            SyncProgress::BatchComplete {
                created,
                linked,
                errors,
                partial,
                remaining,
            } => {
                if let Some(bar) = state.create_bar.take() {
                    bar.finish_with_message(format!(
                        "{} created, {} linked, {} errors, {} partial, {} remaining",
                        created, linked, errors, partial, remaining
                    ));
                }
            }

            SyncProgress::Warning { message } => {
                self.multi.println(format!("  ⚠ {}", message)).ok();
            }

            _ => {}
        }
    }

    pub fn finish(&self) {
        let Ok(state) = self.state.lock() else {
            return;
        };
        let bars = state
            .scan_bars
            .values()
            .chain(state.load_bar.iter())
            .chain(state.create_bar.iter());
        for bar in bars {
            if !bar.is_finished() {
                bar.finish();
            }
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}/{len:3} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░")
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}
