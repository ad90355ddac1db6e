// ── Screen wake hold ──
//
// Drive tests keep the device awake for the whole sequence. The hold is an
// RAII guard: dropping it releases the underlying resource.

use std::fmt;

use futures_util::future::BoxFuture;

use crate::error::CoreError;

/// Source of wake holds.
pub trait WakeLock: Send + Sync {
    fn acquire(&self) -> BoxFuture<'_, Result<WakeHold, CoreError>>;
}

/// An active wake hold. Released on [`release`](Self::release) or drop,
/// whichever comes first.
pub struct WakeHold {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl WakeHold {
    /// Wrap a release action.
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for WakeHold {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl fmt::Debug for WakeHold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WakeHold")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Platform without a wake facility.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWakeLock;

impl WakeLock for NoWakeLock {
    fn acquire(&self) -> BoxFuture<'_, Result<WakeHold, CoreError>> {
        Box::pin(async {
            Err(CoreError::WakeHoldUnavailable {
                reason: "no wake facility on this platform".into(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counted() -> (WakeHold, Arc<AtomicUsize>) {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        let hold = WakeHold::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (hold, released)
    }

    #[test]
    fn release_runs_once() {
        let (hold, released) = counted();
        hold.release();
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_releases() {
        let (hold, released) = counted();
        drop(hold);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_wake_lock_is_unavailable() {
        assert!(matches!(
            NoWakeLock.acquire().await,
            Err(CoreError::WakeHoldUnavailable { .. })
        ));
    }
}
