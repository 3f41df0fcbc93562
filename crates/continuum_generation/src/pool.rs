//! Fixed-size round-robin worker pool shared by concurrent stories.

use continuum_error::{ContinuumResult, GenerationError, GenerationErrorKind};
use continuum_interface::WorkerId;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::trace;

/// Hands out worker ids round robin.
///
/// Checkout is a single atomic increment, so any number of orchestrators may
/// share one pool behind an `Arc`.
#[derive(Debug)]
pub struct WorkerPool {
    size: usize,
    next: AtomicUsize,
}

impl WorkerPool {
    /// Creates a pool of `size` workers.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationErrorKind::EmptyPool`] when `size` is zero.
    pub fn new(size: usize) -> ContinuumResult<Self> {
        if size == 0 {
            return Err(GenerationError::new(GenerationErrorKind::EmptyPool).into());
        }
        Ok(Self {
            size,
            next: AtomicUsize::new(0),
        })
    }

    /// Number of workers.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the next worker.
    pub fn checkout(&self) -> WorkerId {
        let ticket = self.next.fetch_add(1, Ordering::Relaxed);
        let worker = WorkerId(ticket % self.size);
        trace!(%worker, ticket, "Checked out worker");
        worker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[test]
    fn empty_pool_is_rejected() {
        let err = WorkerPool::new(0).unwrap_err();
        assert_eq!(err.generation_kind(), Some(&GenerationErrorKind::EmptyPool));
    }

    #[test]
    fn checkout_cycles() {
        let pool = WorkerPool::new(3).unwrap();
        let ids: Vec<usize> = (0..7).map(|_| pool.checkout().0).collect();
        assert_eq!(ids, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn concurrent_checkout_is_balanced() {
        let pool = Arc::new(WorkerPool::new(4).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || (0..100).map(|_| pool.checkout().0).collect::<Vec<_>>())
            })
            .collect();

        let mut counts: HashMap<usize, usize> = HashMap::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                *counts.entry(id).or_default() += 1;
            }
        }
        assert_eq!(counts.len(), 4);
        assert!(counts.values().all(|&n| n == 200));
    }
}
