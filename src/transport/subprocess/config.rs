//! Configuration constants and shared state for subprocess transport

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::watch;

/// Dangerous environment variables that should not be passed to subprocess
///
/// These variables can affect how the subprocess loads and executes code.
pub const DANGEROUS_ENV_VARS: &[&str] = &[
    "LD_PRELOAD",
    "LD_LIBRARY_PATH",
    "DYLD_INSERT_LIBRARIES",
    "DYLD_LIBRARY_PATH",
    "PATH",
    "NODE_OPTIONS",
    "PYTHONPATH",
    "PERL5LIB",
    "RUBYLIB",
];

/// Allowed extra CLI flags
///
/// Only these flags can be passed through the `extra_args` option.
pub const ALLOWED_EXTRA_FLAGS: &[&str] = &["timeout", "retries", "log-level", "cache-dir", "debug-to-stderr"];

/// Bounded record of the most recent stderr lines
///
/// Attached to the process error when the CLI exits abnormally.
pub(crate) struct StderrTail {
    lines: Mutex<VecDeque<String>>,
    capacity: usize,
    finished: watch::Sender<bool>,
}

impl StderrTail {
    pub(crate) fn new(capacity: usize) -> Self {
        let (finished, _) = watch::channel(false);
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
            finished,
        }
    }

    pub(crate) fn push(&self, line: String) {
        if self.capacity == 0 {
            return;
        }
        let mut lines = self.lines.lock();
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// Mark stderr as fully read
    pub(crate) fn finish(&self) {
        self.finished.send_replace(true);
    }

    /// Wait until stderr reached end of file, or `limit` elapsed
    pub(crate) async fn wait_finished(&self, limit: std::time::Duration) {
        let mut finished = self.finished.subscribe();
        let _ = tokio::time::timeout(limit, finished.wait_for(|done| *done)).await;
    }

    /// The captured lines joined by newlines, `None` if nothing was captured
    pub(crate) fn snapshot(&self) -> Option<String> {
        let lines = self.lines.lock();
        if lines.is_empty() {
            return None;
        }
        Some(lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n"))
    }
}
