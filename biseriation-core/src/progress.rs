// biseriation-core/src/progress.rs
//! Progress callbacks for the order-construction heuristics.

use log::debug;

pub trait ProgressReporter {
    /// Called after each placement with the number of placed elements.
    fn placed(&mut self, count: usize);

    fn finished(&mut self, _count: usize) {}
}

/// Emits a debug line every `every` placements.
#[derive(Debug, Clone, Copy)]
pub struct LogProgress {
    every: usize,
}

impl LogProgress {
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl ProgressReporter for LogProgress {
    fn placed(&mut self, count: usize) {
        if count % self.every == 0 {
            debug!("  {} elements placed", count);
        }
    }

    fn finished(&mut self, count: usize) {
        debug!("  done: {} elements placed", count);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn placed(&mut self, _count: usize) {}
}

impl<F: FnMut(usize)> ProgressReporter for F {
    fn placed(&mut self, count: usize) {
        self(count)
    }
}
