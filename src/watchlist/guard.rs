use std::sync::atomic::{AtomicBool, Ordering};

use crate::core::{FlipperError, Result};

/// Advisory flag against overlapping watchlist mutations, e.g. a save
/// triggered twice in quick succession. Not reentrant.
#[derive(Debug, Default)]
pub struct SaveFlag {
    busy: AtomicBool,
}

impl SaveFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the flag, or fail with `SaveInProgress` if it is held.
    pub fn acquire(&self) -> Result<SaveGuard<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Save in progress, skipping...");
            return Err(FlipperError::SaveInProgress);
        }
        Ok(SaveGuard { flag: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the flag when dropped, on success and failure paths alike.
#[derive(Debug)]
pub struct SaveGuard<'a> {
    flag: &'a SaveFlag,
}

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        self.flag.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_is_exclusive_and_released_on_drop() {
        let flag = SaveFlag::new();
        let guard = flag.acquire().unwrap();
        assert!(flag.is_busy());
        assert!(matches!(flag.acquire(), Err(FlipperError::SaveInProgress)));

        drop(guard);
        assert!(!flag.is_busy());
        assert!(flag.acquire().is_ok());
    }

    #[test]
    fn test_flag_released_on_error_path() {
        fn failing(flag: &SaveFlag) -> Result<()> {
            let _guard = flag.acquire()?;
            Err(FlipperError::validation("boom"))
        }

        let flag = SaveFlag::new();
        assert!(failing(&flag).is_err());
        assert!(!flag.is_busy());
    }
}
