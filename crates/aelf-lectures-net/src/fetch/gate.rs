//! One-shot completion signal.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tokio::sync::Notify;

/// A signal released exactly once, observable any number of times.
///
/// Waiting does not consume the release: every waiter, present or future,
/// returns as soon as the gate has been released. Both blocking threads and
/// async tasks can wait on the same gate.
#[derive(Debug, Default)]
pub struct CompletionGate {
    released: Mutex<bool>,
    condvar: Condvar,
    notify: Notify,
}

impl CompletionGate {
    /// Create a gate in the outstanding state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Release the gate and wake every waiter.
    ///
    /// Returns `true` for the call that released it, `false` afterwards.
    pub fn release(&self) -> bool {
        {
            // The flag is set under the lock so a waiter cannot check it and
            // then miss the notification.
            let mut released = self.released.lock();
            if *released {
                return false;
            }
            *released = true;
            self.condvar.notify_all();
        }
        self.notify.notify_waiters();
        true
    }

    /// Returns `true` once the gate has been released.
    pub fn is_released(&self) -> bool {
        *self.released.lock()
    }

    /// Block the current thread until the gate is released.
    pub fn wait(&self) {
        let mut released = self.released.lock();
        while !*released {
            self.condvar.wait(&mut released);
        }
    }

    /// Block until the gate is released or `timeout` elapses.
    ///
    /// Returns `true` if the gate was released.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut released = self.released.lock();
        while !*released {
            if self.condvar.wait_until(&mut released, deadline).timed_out() {
                return *released;
            }
        }
        true
    }

    /// Wait asynchronously until the gate is released.
    pub async fn released(&self) {
        loop {
            let mut notified = std::pin::pin!(self.notify.notified());
            // Register before checking the flag so a release between the
            // check and the await is not lost.
            notified.as_mut().enable();
            if self.is_released() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_release_once() {
        let gate = CompletionGate::new();
        assert!(!gate.is_released());
        assert!(gate.release());
        assert!(!gate.release());
        assert!(gate.is_released());
    }

    #[test]
    fn test_wait_is_repeatable() {
        let gate = CompletionGate::new();
        gate.release();
        gate.wait();
        gate.wait();
        assert!(gate.wait_timeout(Duration::from_millis(1)));
    }

    #[test]
    fn test_wait_timeout_elapses() {
        let gate = CompletionGate::new();
        assert!(!gate.wait_timeout(Duration::from_millis(20)));
        assert!(!gate.is_released());
    }

    #[test]
    fn test_release_wakes_blocked_threads() {
        let gate = Arc::new(CompletionGate::new());
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let gate = Arc::clone(&gate);
                thread::spawn(move || gate.wait_timeout(Duration::from_secs(5)))
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        gate.release();

        for waiter in waiters {
            assert!(waiter.join().unwrap());
        }
    }

    #[tokio::test]
    async fn test_async_waiter() {
        let gate = Arc::new(CompletionGate::new());
        let waiter = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.released().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        gate.release();

        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
        // Already released: returns immediately.
        gate.released().await;
    }
}
