//! Outstanding task counter.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Count of tasks that have not yet finished writing their result.
///
/// Exactly one call to [`complete_one`](Self::complete_one) observes the
/// transition to zero.
#[derive(Debug)]
pub struct PendingCounter {
    remaining: AtomicUsize,
}

impl PendingCounter {
    /// Creates a counter for `total` tasks.
    pub fn new(total: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(total),
        }
    }

    /// Marks one task finished. Returns true for the task that finished last.
    ///
    /// Calls beyond the initial total are ignored and return false.
    pub fn complete_one(&self) -> bool {
        let previous = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        matches!(previous, Ok(1))
    }

    /// Tasks still outstanding.
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }
}

/// Decrements a shared counter when dropped and runs `on_last` if this was
/// the final outstanding task. Dropping during a panic still counts.
pub(crate) struct PendingGuard<F: FnOnce()> {
    counter: Arc<PendingCounter>,
    on_last: Option<F>,
}

impl<F: FnOnce()> PendingGuard<F> {
    pub(crate) fn new(counter: Arc<PendingCounter>, on_last: F) -> Self {
        Self {
            counter,
            on_last: Some(on_last),
        }
    }
}

impl<F: FnOnce()> Drop for PendingGuard<F> {
    fn drop(&mut self) {
        if self.counter.complete_one() {
            if let Some(on_last) = self.on_last.take() {
                on_last();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_last_completion_reported_once() {
        let counter = PendingCounter::new(3);
        assert!(!counter.complete_one());
        assert!(!counter.complete_one());
        assert!(counter.complete_one());
        assert_eq!(counter.remaining(), 0);
    }

    #[test]
    fn test_extra_completions_ignored() {
        let counter = PendingCounter::new(1);
        assert!(counter.complete_one());
        assert!(!counter.complete_one());
        assert_eq!(counter.remaining(), 0);
    }

    #[test]
    fn test_concurrent_exactly_once() {
        let total = 64;
        let counter = Arc::new(PendingCounter::new(total));
        let fired = Arc::new(AtomicUsize::new(0));

        let threads: Vec<_> = (0..total)
            .map(|_| {
                let counter = Arc::clone(&counter);
                let fired = Arc::clone(&fired);
                std::thread::spawn(move || {
                    if counter.complete_one() {
                        fired.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(counter.remaining(), 0);
    }

    #[test]
    fn test_guard_fires_on_panic() {
        let counter = Arc::new(PendingCounter::new(1));
        let fired = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&counter);
        let f = Arc::clone(&fired);
        let result = std::thread::spawn(move || {
            let _guard = PendingGuard::new(c, move || {
                f.fetch_add(1, Ordering::SeqCst);
            });
            panic!("task blew up");
        })
        .join();

        assert!(result.is_err());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(counter.remaining(), 0);
    }
}
