use std::sync::atomic::{AtomicU64, Ordering};

const FIRST: u64 = 1;

/// Round-number supplier, independent of the row and insert counters.
///
/// Shared by reference (usually behind an `Arc`) rather than held globally.
#[derive(Debug)]
pub struct SequenceSupplier {
    next: AtomicU64,
}

impl SequenceSupplier {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(FIRST),
        }
    }

    /// Issue the next sequence number; the first call returns 1.
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// Next number to be issued. Advisory only under concurrent `next` calls.
    pub fn current(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }

    /// Restart numbering at 1.
    ///
    /// Not synchronized with in-flight `next` calls: a concurrent caller may
    /// receive a number issued before the reset, so callers must quiesce
    /// their workers first.
    pub fn reset(&self) {
        self.next.store(FIRST, Ordering::SeqCst);
    }
}

impl Default for SequenceSupplier {
    fn default() -> Self {
        Self::new()
    }
}
