//! Toast notifications.
//!
//! A single toast is visible at a time. Showing a new one replaces the current one
//! immediately (no queue) and starts its own dismiss timer; a timer that belonged to a
//! replaced toast never closes its successor.

use crate::constants::TOAST_DURATION;
use crate::envelope::Severity;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// What the toast area currently shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToastState {
    pub open: bool,
    pub message: String,
    pub severity: Severity,
}

impl Default for ToastState {
    fn default() -> Self {
        Self {
            open: false,
            message: String::new(),
            severity: Severity::Info,
        }
    }
}

struct ToasterInner {
    state: watch::Sender<ToastState>,
    generation: AtomicU64,
}

/// Cloneable handle on the toast area.
#[derive(Clone)]
pub struct Toaster {
    inner: Arc<ToasterInner>,
}

impl Default for Toaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Toaster {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ToastState::default());
        Self {
            inner: Arc::new(ToasterInner {
                state,
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Show `message`, replacing whatever is open, and dismiss it after five seconds.
    ///
    /// The dismiss timer runs on the current tokio runtime. Outside a runtime the toast stays
    /// open until replaced or dismissed manually.
    pub fn show(&self, message: impl Into<String>, severity: Severity) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.state.send_replace(ToastState {
            open: true,
            message: message.into(),
            severity,
        });

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("no runtime for toast timer; toast stays open");
            return;
        };

        let inner = Arc::clone(&self.inner);
        handle.spawn(async move {
            tokio::time::sleep(TOAST_DURATION).await;
            if inner.generation.load(Ordering::SeqCst) == generation {
                inner.state.send_modify(|s| s.open = false);
            }
        });
    }

    pub fn dismiss(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.state.send_modify(|s| s.open = false);
    }

    pub fn current(&self) -> ToastState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ToastState> {
        self.inner.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn toast_closes_after_timeout() {
        let toaster = Toaster::new();
        toaster.show("Patient created", Severity::Success);

        let shown = toaster.current();
        assert!(shown.open);
        assert_eq!(shown.message, "Patient created");
        assert_eq!(shown.severity, Severity::Success);

        tokio::time::sleep(TOAST_DURATION - Duration::from_millis(1)).await;
        assert!(toaster.current().open);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(!toaster.current().open);
    }

    #[tokio::test(start_paused = true)]
    async fn later_toast_replaces_and_keeps_its_own_window() {
        let toaster = Toaster::new();
        toaster.show("first", Severity::Info);

        tokio::time::sleep(Duration::from_secs(3)).await;
        toaster.show("second", Severity::Error);
        assert_eq!(toaster.current().message, "second");

        // The first toast's timer fires here and must not close the second.
        tokio::time::sleep(Duration::from_secs(3)).await;
        let current = toaster.current();
        assert!(current.open);
        assert_eq!(current.severity, Severity::Error);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!toaster.current().open);
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_closes_immediately() {
        let toaster = Toaster::new();
        let mut rx = toaster.subscribe();
        toaster.show("saved", Severity::Success);
        toaster.dismiss();

        rx.changed().await.expect("sender alive");
        assert!(!rx.borrow_and_update().open);
    }

    #[test]
    fn show_outside_runtime_still_displays() {
        let toaster = Toaster::new();
        toaster.show("offline", Severity::Warning);
        assert!(toaster.current().open);
    }
}
