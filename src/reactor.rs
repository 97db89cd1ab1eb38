//! The container trait and its public surface.

use std::sync::Arc;

use futures::stream::BoxStream;

use crate::delivery::Delivery;
use crate::distributor::StateStream;
use crate::mutations;
use crate::pipeline::{self, ActionSender};

/// Sequence of actions flowing into a pipeline.
pub type ActionStream<A> = BoxStream<'static, A>;

/// Sequence of mutations produced by one `mutate` invocation, or the
/// merged sequence handed to `transform_mutation`.
pub type MutationStream<M> = BoxStream<'static, M>;

/// A reactive, unidirectional state container.
///
/// Implementors declare the three pipeline types and the initial state;
/// every hook has a default body, so a container overrides only what it
/// needs. The composition order is fixed:
///
/// ```text
/// action → transform_action → mutate → transform_mutation
///        → reduce (seeded by initial_state) → transform_state
/// ```
///
/// The pipeline holds no strong reference to the container. Every
/// per-item continuation checks liveness first and produces nothing for a
/// dead container, so effects still in flight after the container is
/// dropped are discarded rather than delivered.
pub trait Reactor: Send + Sync + Sized + 'static {
    /// External intents submitted to the container.
    type Action: Send + 'static;

    /// Internal effect descriptors derived from actions; consumed only by
    /// [`reduce`](Reactor::reduce).
    type Mutation: Send + 'static;

    /// The immutable, observable snapshot folded from mutations.
    type State: Clone + Send + Sync + 'static;

    /// The state every subscriber observes before any mutation arrives.
    fn initial_state(&self) -> Self::State;

    /// Transforms the action sequence once, at pipeline construction.
    ///
    /// Override to filter, reorder, merge in other sources, or prepend a
    /// synthetic action (e.g. an initial load).
    fn transform_action(&self, actions: ActionStream<Self::Action>) -> ActionStream<Self::Action> {
        actions
    }

    /// Derives a sequence of mutations from one action.
    ///
    /// The returned sequence may suspend and may yield any number of
    /// mutations; sequences from concurrent actions are merged without
    /// cross-action ordering, while mutations from one invocation keep
    /// their relative order.
    ///
    /// The default produces nothing, making every action a no-op until
    /// overridden. Containers where `Action` and `Mutation` coincide can
    /// use [`mutations::passthrough`] as the body.
    fn mutate(&self, action: Self::Action) -> MutationStream<Self::Mutation> {
        let _ = action;
        mutations::none()
    }

    /// Transforms the merged mutation sequence once, at construction.
    fn transform_mutation(
        &self,
        mutations: MutationStream<Self::Mutation>,
    ) -> MutationStream<Self::Mutation> {
        mutations
    }

    /// Folds one mutation into the running state.
    ///
    /// Pure by contract and the only place `State` should be built from
    /// inputs. Invoked strictly sequentially, in mutation arrival order,
    /// never concurrently with itself.
    fn reduce(&self, state: Self::State, mutation: Self::Mutation) -> Self::State {
        let _ = mutation;
        state
    }

    /// Transforms the folded state sequence once, at construction.
    ///
    /// The initial state is seeded straight into the replay buffer so it
    /// is observable synchronously; this hook sees only mutation-driven
    /// states, never that seed.
    fn transform_state(
        &self,
        states: BoxStream<'static, Self::State>,
    ) -> BoxStream<'static, Self::State> {
        states
    }

    /// The execution-context policy for action delivery. Read once, at
    /// pipeline construction.
    fn delivery(&self) -> Delivery {
        Delivery::Immediate
    }
}

/// Public contract of a running container.
///
/// Implemented for every [`Reactor`] held in an `Arc`; the `Arc` is the
/// container's identity, and all per-instance storage is keyed on it.
/// First use of [`send`](ReactorExt::send),
/// [`action_sender`](ReactorExt::action_sender) or
/// [`observe_state`](ReactorExt::observe_state) assembles the pipeline;
/// repeated use never assembles a second one. These methods must be
/// called from within a tokio runtime, which the pipeline pump runs on.
pub trait ReactorExt {
    type Action;
    type State;

    /// Enqueues an action. Fire-and-forget: there is no backpressure and
    /// no result; an action sent to a dead container is dropped.
    fn send(&self, action: Self::Action);

    /// A cloneable handle feeding actions into this container.
    fn action_sender(&self) -> ActionSender<Self::Action>;

    /// Subscribes to the state sequence: the buffered current value
    /// arrives immediately, followed by every subsequent snapshot.
    fn observe_state(&self) -> StateStream<Self::State>;

    /// Synchronous snapshot of the most recently emitted state, without
    /// subscribing. Falls back to [`initial_state`](Reactor::initial_state)
    /// while no pipeline exists; reading it never constructs one.
    fn current_state(&self) -> Self::State;
}

impl<R: Reactor> ReactorExt for Arc<R> {
    type Action = R::Action;
    type State = R::State;

    fn send(&self, action: R::Action) {
        pipeline::action_sender(self).send(action);
    }

    fn action_sender(&self) -> ActionSender<R::Action> {
        pipeline::action_sender(self)
    }

    fn observe_state(&self) -> StateStream<R::State> {
        pipeline::observe_state(self)
    }

    fn current_state(&self) -> R::State {
        pipeline::current_state(self)
    }
}
