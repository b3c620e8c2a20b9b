use crate::errors::Result;
use perro::permanent_failure;
use std::sync::{Mutex, MutexGuard};

pub(crate) trait Locker<T> {
    fn lock_or_fail(&self) -> Result<MutexGuard<'_, T>>;
}

impl<T> Locker<T> for Mutex<T> {
    fn lock_or_fail(&self) -> Result<MutexGuard<'_, T>> {
        self.lock()
            .map_err(|_| permanent_failure("A thread panicked while holding the lock"))
    }
}
