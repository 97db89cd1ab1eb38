//! Hot multicast distribution of state snapshots.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Hot broadcast channel with a one-slot replay buffer.
///
/// The underlying computation runs independently of subscriber count: the
/// pipeline pump publishes here whether or not anyone is listening, and a
/// subscriber count of zero never tears anything down. Every new
/// subscriber immediately receives the buffered last value, then each
/// subsequent value in publish order. Values emitted before a subscriber
/// attached are never redelivered beyond that one buffered slot.
pub(crate) struct StateChannel<S> {
    inner: Mutex<ChannelInner<S>>,
}

struct ChannelInner<S> {
    last: S,
    subscribers: Vec<mpsc::UnboundedSender<S>>,
}

impl<S: Clone> StateChannel<S> {
    /// Creates the channel with its replay slot already holding `seed`,
    /// so the very first subscriber observes a value synchronously.
    pub(crate) fn new(seed: S) -> Self {
        Self {
            inner: Mutex::new(ChannelInner {
                last: seed,
                subscribers: Vec::new(),
            }),
        }
    }

    /// The buffered last value.
    pub(crate) fn last(&self) -> S {
        self.inner.lock().last.clone()
    }

    /// Updates the replay slot and fans the value out to all live
    /// subscribers, dropping the ones that have gone away.
    pub(crate) fn publish(&self, state: S) {
        let mut inner = self.inner.lock();
        inner.last = state.clone();
        inner
            .subscribers
            .retain(|subscriber| subscriber.send(state.clone()).is_ok());
    }

    pub(crate) fn subscribe(&self) -> StateStream<S> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();
        let _ = tx.send(inner.last.clone());
        inner.subscribers.push(tx);
        StateStream {
            inner: UnboundedReceiverStream::new(rx),
        }
    }
}

/// A live subscription to a container's state sequence.
///
/// Yields the buffered current value first, then every subsequent
/// snapshot. The sequence never yields an error and keeps going for as
/// long as the container is alive.
pub struct StateStream<S> {
    inner: UnboundedReceiverStream<S>,
}

impl<S> Stream for StateStream<S> {
    type Item = S;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
