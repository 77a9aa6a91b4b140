use std::fmt::Display;
use tracing::info;

/// Sequential progress indicator, emits one event per processed item.
#[derive(Debug)]
pub struct Progress<'a> {
    label: &'a str,
    total: usize,
    done: usize,
}

impl<'a> Progress<'a> {
    /// create a progress of `total` items.
    pub fn new(label: &'a str, total: usize) -> Self {
        Progress {
            label,
            total,
            done: 0,
        }
    }

    /// Record one finished item with its `status`.
    pub fn tick(&mut self, status: impl Display) {
        self.done += 1;
        info!(
            label = self.label,
            done = self.done,
            total = self.total,
            percent = self.percent(),
            %status,
            "progress"
        );
    }

    /// finished items.
    pub fn done(&self) -> usize {
        self.done
    }

    /// completion in percent, an empty progress counts as complete.
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            100
        } else {
            self.done * 100 / self.total
        }
    }
}
