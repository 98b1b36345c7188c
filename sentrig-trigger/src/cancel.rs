use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::Duration;

/// One-way shutdown signal shared by every task of a session. Once set it
/// stays set.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag and wakes every waiter. Returns true only for the call
    /// that performed the transition.
    pub fn cancel(&self) -> bool {
        let (lock, cvar) = &*self.inner;
        let mut cancelled = lock.lock();
        if *cancelled {
            return false;
        }
        *cancelled = true;
        cvar.notify_all();
        true
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock()
    }

    /// Blocks for at most `timeout`, returning early once the flag is set.
    /// Returns the flag state on wake-up.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let mut cancelled = lock.lock();
        if !*cancelled {
            let _ = cvar.wait_for(&mut cancelled, timeout);
        }
        *cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn transition_is_one_way() {
        let flag = CancellationFlag::new();
        assert!(!flag.is_cancelled());
        assert!(flag.cancel());
        assert!(!flag.cancel());
        assert!(flag.is_cancelled());
    }

    #[test]
    fn wait_times_out_when_not_cancelled() {
        let flag = CancellationFlag::new();
        let start = Instant::now();
        assert!(!flag.wait_timeout(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn cancel_wakes_waiter_early() {
        let flag = CancellationFlag::new();
        let waiter = flag.clone();
        let handle = thread::spawn(move || {
            let start = Instant::now();
            let woke = waiter.wait_timeout(Duration::from_secs(10));
            (woke, start.elapsed())
        });
        thread::sleep(Duration::from_millis(20));
        flag.cancel();
        let (woke, elapsed) = handle.join().unwrap();
        assert!(woke);
        assert!(elapsed < Duration::from_secs(5));
    }
}
