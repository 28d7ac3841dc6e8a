//! Poison-recovering mutex access.
//!
//! The fakes are shared between the caller and detached announcement
//! threads. A panic on one of those threads must not turn every later
//! assertion into a `PoisonError`, so the guarded data is recovered instead.

use std::sync::{Mutex, MutexGuard};

pub trait MutexExt<T> {
    /// Acquire the mutex, recovering from a poisoned state.
    fn lock_poisoned(&self) -> MutexGuard<'_, T>;
}

impl<T> MutexExt<T> for Mutex<T> {
    fn lock_poisoned(&self) -> MutexGuard<'_, T> {
        self.lock().unwrap_or_else(|e| {
            log::warn!("Recovered poisoned Mutex (a thread panicked while holding this lock)");
            e.into_inner()
        })
    }
}
