//! Deferred UX pacing. The original site faked processing time with fixed
//! setTimeout callbacks that could never be cancelled; this keeps the fixed
//! delay but exposes cancellation so real asynchronous work can slot in
//! later without changing call sites.

use std::time::Duration;
use tokio::task::JoinHandle;

pub struct Deferred {
    handle: JoinHandle<()>,
}

/// Runs `f` after `delay` on the runtime. The returned handle can cancel the
/// callback before it fires or be awaited for completion.
pub fn defer<F>(delay: Duration, f: F) -> Deferred
where
    F: FnOnce() + Send + 'static,
{
    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        f();
    });
    Deferred { handle }
}

impl Deferred {
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Waits for the callback to fire (or the cancellation to land).
    pub async fn finished(self) {
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn deferred_callback_fires_after_delay() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let deferred = defer(Duration::from_millis(10), move || {
            flag.store(true, Ordering::SeqCst);
        });
        deferred.finished().await;
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn cancelled_callback_never_fires() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let deferred = defer(Duration::from_millis(50), move || {
            flag.store(true, Ordering::SeqCst);
        });
        deferred.cancel();
        deferred.finished().await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
