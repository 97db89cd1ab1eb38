//! Lazy, per-instance assembly of the state stream.
//!
//! Everything a container needs at runtime lives in associated storage,
//! one side table per slot kind, mirroring the shape a container would
//! otherwise declare as fields: its action channel, its state channel,
//! its cached current state, and its cancellation bag.
//!
//! Construction is insert-once: whichever access wins the state-channel
//! slot builds the pipeline, so exactly one pipeline and one action
//! channel exist for a container's lifetime. The pump task that drives
//! the composed stream captures only a `Weak` handle to the container;
//! it is the internal keep-alive sink that makes the sequence hot, and
//! its abort guard is held by the cancellation bag.

use std::sync::{Arc, LazyLock, Weak};

use futures::future;
use futures::stream::{BoxStream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::assoc::AssocTable;
use crate::bag::{CancellationBag, Subscription};
use crate::delivery::Delivery;
use crate::distributor::{StateChannel, StateStream};
use crate::mutations;
use crate::reactor::{ActionStream, Reactor};

static CANCELLATIONS: LazyLock<AssocTable> = LazyLock::new(AssocTable::new);
static CURRENT_STATE: LazyLock<AssocTable> = LazyLock::new(AssocTable::new);
static ACTIONS: LazyLock<AssocTable> = LazyLock::new(AssocTable::new);
static STATES: LazyLock<AssocTable> = LazyLock::new(AssocTable::new);

/// Cloneable handle that feeds actions into one container's pipeline.
///
/// Unbounded: `send` always accepts. Actions sent after the container is
/// gone are dropped, never queued.
pub struct ActionSender<A> {
    tx: mpsc::UnboundedSender<A>,
}

impl<A: Send + 'static> ActionSender<A> {
    pub fn send(&self, action: A) {
        if self.tx.send(action).is_err() {
            tracing::trace!("action dropped (container gone)");
        }
    }
}

impl<A> Clone for ActionSender<A> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

pub(crate) fn action_sender<R: Reactor>(owner: &Arc<R>) -> ActionSender<R::Action> {
    // Forcing the state channel first guarantees the pipeline exists
    // before any action is accepted; an earlier send would be silently
    // lost.
    let _ = state_channel(owner);
    ACTIONS
        .value(owner)
        .expect("pipeline construction stores the action sender")
}

pub(crate) fn observe_state<R: Reactor>(owner: &Arc<R>) -> StateStream<R::State> {
    state_channel(owner).subscribe()
}

pub(crate) fn current_state<R: Reactor>(owner: &Arc<R>) -> R::State {
    CURRENT_STATE
        .value_or_insert_with(owner, || owner.initial_state())
        .0
}

/// Returns the container's state channel, assembling the whole pipeline
/// on first access. `Uninitialized → Active` is one-way: the winning
/// insert is the only construction this container will ever get.
fn state_channel<R: Reactor>(owner: &Arc<R>) -> Arc<StateChannel<R::State>> {
    let mut pending_actions = None;
    let (channel, created) = STATES.value_or_insert_with(owner, || {
        let (tx, rx) = mpsc::unbounded_channel();
        let (_, fresh) = ACTIONS.value_or_insert_with(owner, || ActionSender { tx });
        debug_assert!(fresh, "one action channel per container instance");
        pending_actions = Some(rx);
        Arc::new(StateChannel::new(owner.initial_state()))
    });
    if created {
        let rx = pending_actions.expect("winning insert carries the action receiver");
        start_pipeline(owner, channel.clone(), rx);
    }
    channel
}

/// Composes the five pipeline stages over the action channel and spawns
/// the pump that drives them.
///
/// The transform hooks run here, once, with the container still live.
/// Per-item continuations capture only a `Weak`; once the container is
/// gone they produce nothing and the composed stream winds down.
fn start_pipeline<R: Reactor>(
    owner: &Arc<R>,
    channel: Arc<StateChannel<R::State>>,
    actions: mpsc::UnboundedReceiver<R::Action>,
) {
    let actions: ActionStream<R::Action> = match owner.delivery() {
        Delivery::Immediate => UnboundedReceiverStream::new(actions).boxed(),
        Delivery::Queued => UnboundedReceiverStream::new(actions)
            .then(|action| async move {
                tokio::task::yield_now().await;
                action
            })
            .boxed(),
    };
    let actions = owner.transform_action(actions);

    let weak = Arc::downgrade(owner);
    let mutations = actions
        .map(move |action| match weak.upgrade() {
            Some(live) => live.mutate(action),
            None => mutations::none(),
        })
        .flatten_unordered(None)
        .boxed();
    let mutations = owner.transform_mutation(mutations);

    let weak = Arc::downgrade(owner);
    let states = mutations
        .scan(channel.last(), move |state, mutation| {
            let Some(live) = weak.upgrade() else {
                return future::ready(None);
            };
            let next = live.reduce(state.clone(), mutation);
            *state = next.clone();
            future::ready(Some(next))
        })
        .boxed();
    let states = owner.transform_state(states);

    let (bag, _) =
        CANCELLATIONS.value_or_insert_with(owner, || Arc::new(CancellationBag::default()));
    let task = tokio::spawn(pump(Arc::downgrade(owner), states, channel));
    let abort = task.abort_handle();
    bag.store(Subscription::new(move || abort.abort()));
    tracing::trace!("state pipeline constructed");
}

/// Internal keep-alive sink: consumes the composed stream regardless of
/// subscriber count, updating the current-state cache before each value
/// becomes observable.
async fn pump<R: Reactor>(
    owner: Weak<R>,
    mut states: BoxStream<'static, R::State>,
    channel: Arc<StateChannel<R::State>>,
) {
    while let Some(state) = states.next().await {
        let Some(live) = owner.upgrade() else {
            tracing::trace!("state dropped (container gone)");
            break;
        };
        CURRENT_STATE.set_value(&live, state.clone());
        channel.publish(state);
    }
    tracing::trace!("state pipeline stopped");
}
