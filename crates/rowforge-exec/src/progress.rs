use std::sync::atomic::{AtomicU8, Ordering};

/// Advisory percent-complete indicator.
///
/// Workers publish without coordination, so the last writer wins and the value
/// may not land exactly on 100.
#[derive(Debug, Default)]
pub struct Progress {
    percent: AtomicU8,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn percent(&self) -> u8 {
        self.percent.load(Ordering::Relaxed)
    }

    pub(crate) fn publish(&self, percent: u8) {
        self.percent.store(percent.min(100), Ordering::Relaxed);
    }
}

/// Truncated `part / whole * 100`, capped at 100.
pub(crate) fn ratio_percent(part: f64, whole: f64) -> u8 {
    if whole <= 0.0 {
        return 100;
    }
    (part / whole * 100.0).clamp(0.0, 100.0) as u8
}
