// Modbridge Pending Signal
// Counting semaphore tracking how many transport slots are ready

use parking_lot::{Condvar, Mutex};

/// Counting readiness signal.
///
/// Producers `post` after publishing an entry; the consumer `wait`s until the
/// count is positive and takes one unit.
#[derive(Debug, Default)]
pub struct PendingSignal {
    count: Mutex<usize>,
    ready: Condvar,
}

impl PendingSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit and wake a waiter
    pub fn post(&self) {
        let mut count = self.count.lock();
        *count += 1;
        self.ready.notify_one();
    }

    /// Block until a unit is available, then take it
    pub fn wait(&self) {
        let mut count = self.count.lock();
        while *count == 0 {
            self.ready.wait(&mut count);
        }
        *count -= 1;
    }

    /// Take a unit if one is available without blocking
    pub fn try_wait(&self) -> bool {
        let mut count = self.count.lock();
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }

    /// Reset the count to zero, returning how many units were discarded
    pub fn drain(&self) -> usize {
        std::mem::take(&mut *self.count.lock())
    }

    pub fn value(&self) -> usize {
        *self.count.lock()
    }
}
