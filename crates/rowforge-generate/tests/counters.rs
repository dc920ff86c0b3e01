use std::sync::Arc;
use std::thread;

use rowforge_generate::{AtomicCounter, SequenceSupplier};

#[test]
fn concurrent_get_next_is_a_permutation() {
    const THREADS: u64 = 16;
    const PER_THREAD: u64 = 250;
    let initial = 40;
    let counter = Arc::new(AtomicCounter::with_initial(initial));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let counter = Arc::clone(&counter);
            thread::spawn(move || (0..PER_THREAD).map(|_| counter.get_next()).collect::<Vec<_>>())
        })
        .collect();

    let mut seen: Vec<u64> = handles
        .into_iter()
        .flat_map(|handle| handle.join().expect("worker thread"))
        .collect();
    seen.sort_unstable();

    let expected: Vec<u64> = (initial + 1..=initial + THREADS * PER_THREAD).collect();
    assert_eq!(seen, expected);
    assert_eq!(counter.peek(), initial + THREADS * PER_THREAD);
}

#[test]
fn concurrent_increment_loses_nothing() {
    let counter = Arc::new(AtomicCounter::new());

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..1_000 {
                    counter.increment();
                }
            });
        }
    });

    assert_eq!(counter.peek(), 8_000);
}

#[test]
fn sequence_numbers_are_unique_across_threads() {
    let supplier = SequenceSupplier::new();

    let mut issued: Vec<u64> = thread::scope(|scope| {
        let workers: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| (0..100).map(|_| supplier.next()).collect::<Vec<_>>()))
            .collect();
        workers
            .into_iter()
            .flat_map(|worker| worker.join().expect("worker thread"))
            .collect()
    });
    issued.sort_unstable();

    assert_eq!(issued, (1..=400).collect::<Vec<_>>());
    assert_eq!(supplier.current(), 401);
}
