//! Cancellation tokens and the one-request-at-a-time controller used by feeds.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

/// Cooperative cancellation flag shared between a request and its owner.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`CancellationToken::cancel`] has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Handle for one logical fetch issued by a [`RequestController`].
#[derive(Debug, Clone)]
pub struct RequestHandle {
    id: u64,
    token: CancellationToken,
}

impl RequestHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Debug, Default)]
struct ControllerState {
    current: Option<RequestHandle>,
}

/// Keeps at most one live request per feed instance.
///
/// Starting a request cancels the previous one. Results must only be committed
/// while [`RequestController::is_current`] holds for their handle.
#[derive(Debug, Default)]
pub struct RequestController {
    next_id: AtomicU64,
    state: Mutex<ControllerState>,
}

impl RequestController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_request(&self) -> RequestHandle {
        let handle = RequestHandle {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            token: CancellationToken::new(),
        };
        let mut state = self.lock();
        if let Some(previous) = state.current.replace(handle.clone()) {
            previous.token.cancel();
        }
        handle
    }

    pub fn is_current(&self, handle: &RequestHandle) -> bool {
        if handle.is_cancelled() {
            return false;
        }
        self.lock()
            .current
            .as_ref()
            .map(|current| current.id == handle.id)
            .unwrap_or(false)
    }

    /// Releases the slot if `handle` still owns it.
    pub fn finish(&self, handle: &RequestHandle) {
        let mut state = self.lock();
        if state.current.as_ref().map(|c| c.id) == Some(handle.id) {
            state.current = None;
        }
    }

    /// Cancels whatever is in flight. Called on category change and on close.
    pub fn cancel(&self) {
        if let Some(current) = self.lock().current.take() {
            current.token.cancel();
        }
    }

    pub fn in_flight(&self) -> bool {
        self.lock().current.is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ControllerState> {
        // Guarded sections never panic, so a poisoned lock still holds valid state.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_a_request_cancels_the_previous_one() {
        let controller = RequestController::new();
        let first = controller.start_request();
        let second = controller.start_request();

        assert!(first.is_cancelled());
        assert!(!controller.is_current(&first));
        assert!(controller.is_current(&second));
    }

    #[test]
    fn finish_only_releases_the_owner() {
        let controller = RequestController::new();
        let first = controller.start_request();
        let second = controller.start_request();

        controller.finish(&first);
        assert!(controller.in_flight());
        controller.finish(&second);
        assert!(!controller.in_flight());
    }

    #[test]
    fn cancel_invalidates_current_request() {
        let controller = RequestController::new();
        let handle = controller.start_request();
        controller.cancel();
        assert!(handle.is_cancelled());
        assert!(!controller.is_current(&handle));
    }

    #[tokio::test]
    async fn cancelled_future_resolves_after_cancel() {
        let token = CancellationToken::new();
        let waiter = {
            let token = token.clone();
            tokio::spawn(async move { token.cancelled().await })
        };
        token.cancel();
        waiter.await.unwrap();
        assert!(token.is_cancelled());
    }
}
