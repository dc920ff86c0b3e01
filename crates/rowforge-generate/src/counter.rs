use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe non-negative counter starting at zero.
#[derive(Debug, Default)]
pub struct AtomicCounter {
    value: AtomicU64,
}

impl AtomicCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial(initial: u64) -> Self {
        Self {
            value: AtomicU64::new(initial),
        }
    }

    /// Read the current value without modifying it.
    pub fn peek(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }

    /// Increment and return the new value. Concurrent callers observe a
    /// gap-free sequence with no duplicates.
    pub fn get_next(&self) -> u64 {
        self.value.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn increment(&self) {
        self.value.fetch_add(1, Ordering::SeqCst);
    }

    pub fn add(&self, delta: u64) {
        self.value.fetch_add(delta, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_next_returns_incremented_value() {
        let counter = AtomicCounter::with_initial(5);
        assert_eq!(counter.get_next(), 6);
        counter.increment();
        counter.add(3);
        assert_eq!(counter.peek(), 10);
    }
}
