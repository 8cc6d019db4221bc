//! Log and tty progress subscribers (spec §4.7), grounded on the original's
//! `infrastructure/reporting/{log_progress,tdqm_progress}.py`. The db
//! persister lives alongside the step tree in `step.rs` since it needs the
//! `TaskStatusRepository`.

use std::collections::HashMap;
use std::sync::Mutex;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing::{error, info};

use crate::domain::entities::StepState;

use super::step::{ProgressSubscriber, StepSnapshot};

/// Structured logger subscriber, throttled to state transitions and
/// percent-point progress changes rather than every tick.
pub struct LogProgressSubscriber {
    last_logged_percent: Mutex<HashMap<String, u64>>,
}

impl LogProgressSubscriber {
    pub fn new() -> Self {
        Self {
            last_logged_percent: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for LogProgressSubscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSubscriber for LogProgressSubscriber {
    fn on_update(&self, snapshot: &StepSnapshot) {
        let percent = if snapshot.total == 0 {
            0
        } else {
            (snapshot.current * 100) / snapshot.total
        };
        let key = format!("{}:{}:{}", snapshot.trackable_type, snapshot.trackable_id, snapshot.name);

        if snapshot.state.is_terminal() {
            self.last_logged_percent.lock().expect("lock poisoned").remove(&key);
            match snapshot.state {
                StepState::Failed => error!(step = %snapshot.name, error = ?snapshot.error, "step failed"),
                StepState::Skipped => info!(step = %snapshot.name, "step skipped"),
                _ => info!(step = %snapshot.name, "step completed"),
            }
            return;
        }

        let mut last = self.last_logged_percent.lock().expect("lock poisoned");
        let should_log = last.get(&key).copied() != Some(percent);
        if should_log {
            last.insert(key, percent);
            info!(step = %snapshot.name, current = snapshot.current, total = snapshot.total, "step progress");
        }
    }
}

/// Tty renderer backed by `indicatif`, one bar per distinct step name seen.
pub struct TtyProgressSubscriber {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
}

impl TtyProgressSubscriber {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for TtyProgressSubscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSubscriber for TtyProgressSubscriber {
    fn on_update(&self, snapshot: &StepSnapshot) {
        let key = format!("{}:{}:{}", snapshot.trackable_type, snapshot.trackable_id, snapshot.name);
        let mut bars = self.bars.lock().expect("lock poisoned");

        let bar = bars.entry(key.clone()).or_insert_with(|| {
            let bar = self.multi.add(ProgressBar::new(snapshot.total.max(1)));
            bar.set_style(
                ProgressStyle::with_template("{prefix} [{bar:40}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar.set_prefix(snapshot.name.clone());
            bar
        });

        bar.set_length(snapshot.total.max(1));
        bar.set_position(snapshot.current);
        if let Some(message) = &snapshot.message {
            bar.set_message(message.clone());
        }

        if snapshot.state.is_terminal() {
            bar.finish_with_message(format!("{:?}", snapshot.state));
            bars.remove(&key);
        }
    }
}
