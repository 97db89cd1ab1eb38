//! Per-instance set of active subscriptions.

use parking_lot::Mutex;

/// Guard for one active subscription. Dropping it cancels the work it
/// keeps alive.
pub(crate) struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Holds a container's subscriptions for the container's lifetime.
///
/// There is no explicit teardown: the bag lives in associated storage, so
/// it is dropped (cancelling everything it holds) once its owner is gone
/// and the storage sweeps the entry.
#[derive(Default)]
pub(crate) struct CancellationBag {
    subscriptions: Mutex<Vec<Subscription>>,
}

impl CancellationBag {
    pub(crate) fn store(&self, subscription: Subscription) {
        self.subscriptions.lock().push(subscription);
    }
}
