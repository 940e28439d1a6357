//! Process-wide warning collector.
//!
//! Warnings are advisory (a dropped sprite, an oversized hull); errors abort the
//! job and go through [`crate::error::PackError`] instead. Consecutive duplicate
//! messages are coalesced with an `(N x)` multiplier and total emission is
//! capped, so a misconfigured job with thousands of sprites cannot flood the log.

use std::sync::Mutex;

const MAX_WARNINGS: usize = 20;

struct Collector {
    last_message: Option<String>,
    repeat_count: usize,
    emitted: usize,
    log: Vec<String>,
}

static COLLECTOR: Mutex<Collector> = Mutex::new(Collector {
    last_message: None,
    repeat_count: 0,
    emitted: 0,
    log: Vec::new(),
});

impl Collector {
    fn flush(&mut self) {
        if let Some(message) = self.last_message.take() {
            let line = if self.repeat_count > 1 {
                format!("{} ({}x)", message, self.repeat_count)
            } else {
                message
            };
            tracing::warn!("{line}");
            self.log.push(line);
            self.repeat_count = 0;
        }
    }

    fn add(&mut self, message: &str) {
        if self.last_message.as_deref() == Some(message) {
            self.repeat_count += 1;
            return;
        }
        if self.emitted >= MAX_WARNINGS {
            return;
        }
        self.flush();
        self.last_message = Some(message.to_string());
        self.repeat_count = 1;
        self.emitted += 1;
    }
}

/// Records a warning. Thread-safe; callable from parallel workers.
pub fn warning(message: impl AsRef<str>) {
    let mut collector = COLLECTOR.lock().unwrap();
    collector.add(message.as_ref());
}

/// True when any warning was recorded since the last [`take_warnings`].
pub fn has_warnings() -> bool {
    let mut collector = COLLECTOR.lock().unwrap();
    collector.flush();
    !collector.log.is_empty()
}

/// Flushes pending repeats and drains the warning log, resetting the cap.
pub fn take_warnings() -> Vec<String> {
    let mut collector = COLLECTOR.lock().unwrap();
    collector.flush();
    collector.emitted = 0;
    std::mem::take(&mut collector.log)
}
