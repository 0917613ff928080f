//! Time-throttled progress line, emitted to stderr at most once per second
//! (§4.7). A no-op under `--quiet`.

use std::time::{Duration, Instant};

pub struct Progress {
    quiet: bool,
    total: u64,
    last_emit: Instant,
}

const THROTTLE: Duration = Duration::from_secs(1);

impl Progress {
    pub fn new(quiet: bool, total: u64) -> Self {
        Progress {
            quiet,
            total,
            last_emit: Instant::now() - THROTTLE,
        }
    }

    /// `phase` is one of `scanning`, `hashing`, `confirming`. `file_pct` is
    /// progress within the current file/pair, `0..=100`.
    pub fn tick(&mut self, done: u64, pairs: u64, phase: &str, file_pct: u8) {
        if self.quiet {
            return;
        }
        let now = Instant::now();
        if now.duration_since(self.last_emit) < THROTTLE {
            return;
        }
        self.last_emit = now;
        let pct = done.saturating_mul(100).checked_div(self.total).unwrap_or(0);
        eprintln!(
            "Progress [{done}/{total}, {pairs} pairs] {pct}%  ({phase}: {file_pct}%)",
            total = self.total
        );
    }

    pub fn finish(&mut self) {
        if !self.quiet {
            eprintln!();
        }
    }
}
