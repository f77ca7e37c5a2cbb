use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{Result, TallyError};

/// Process-wide admission gate for outstanding fetches.
///
/// Cloning shares the same pool, so one limiter created at startup can be
/// handed to every batch runner and request handler.
#[derive(Clone, Debug)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// A reserved fetch slot. The slot is returned to the pool when dropped.
#[derive(Debug)]
pub struct Slot {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyLimiter {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 || capacity > Semaphore::MAX_PERMITS {
            return Err(TallyError::InvalidConfig(format!(
                "limiter capacity must be between 1 and {}, got {}",
                Semaphore::MAX_PERMITS,
                capacity
            )));
        }

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        })
    }

    /// Wait for a free slot. Returns `None` once the limiter has been closed.
    pub async fn acquire(&self) -> Option<Slot> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .ok()
            .map(|permit| Slot { _permit: permit })
    }

    /// Take a slot only if one is free right now.
    pub fn try_acquire(&self) -> Option<Slot> {
        self.semaphore
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| Slot { _permit: permit })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn in_flight(&self) -> usize {
        self.capacity - self.available()
    }

    /// Wake every waiter with `None` and refuse new acquisitions.
    /// Slots already handed out stay valid until dropped.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_zero_capacity_is_rejected() {
        assert!(matches!(
            ConcurrencyLimiter::new(0),
            Err(TallyError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_slot_is_released_on_drop() {
        let limiter = ConcurrencyLimiter::new(2).unwrap();

        let first = limiter.acquire().await.unwrap();
        let second = limiter.acquire().await.unwrap();
        assert_eq!(limiter.in_flight(), 2);
        assert!(limiter.try_acquire().is_none());

        drop(first);
        assert_eq!(limiter.available(), 1);
        drop(second);
        assert_eq!(limiter.available(), 2);
    }

    #[tokio::test]
    async fn test_clones_share_the_pool() {
        let limiter = ConcurrencyLimiter::new(1).unwrap();
        let shared = limiter.clone();

        let _slot = limiter.acquire().await.unwrap();
        assert!(shared.try_acquire().is_none());
        assert_eq!(shared.in_flight(), 1);
    }

    #[tokio::test]
    async fn test_never_exceeds_capacity() {
        let limiter = ConcurrencyLimiter::new(3).unwrap();
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..30 {
            let limiter = limiter.clone();
            let current = current.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                let _slot = limiter.acquire().await.unwrap();
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                current.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 3);
        assert_eq!(limiter.available(), 3);
    }

    #[tokio::test]
    async fn test_slot_is_released_when_task_is_aborted() {
        let limiter = ConcurrencyLimiter::new(1).unwrap();
        let held = limiter.clone();

        let handle = tokio::spawn(async move {
            let _slot = held.acquire().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        while limiter.in_flight() == 0 {
            tokio::task::yield_now().await;
        }

        handle.abort();
        let _ = handle.await;
        assert_eq!(limiter.available(), 1);
    }

    #[tokio::test]
    async fn test_close_wakes_waiters() {
        let limiter = ConcurrencyLimiter::new(1).unwrap();
        let _slot = limiter.acquire().await.unwrap();

        let waiter = {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.acquire().await.is_none() })
        };
        tokio::task::yield_now().await;

        limiter.close();
        assert!(waiter.await.unwrap());
        assert!(limiter.is_closed());
    }
}
