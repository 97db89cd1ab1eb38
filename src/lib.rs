//! Reactive unidirectional state containers.
//!
//! A container exposes an [`Action`](Reactor::Action) input, routes it
//! through a [`Mutation`](Reactor::Mutation) computation stage, folds
//! mutations into an immutable [`State`](Reactor::State) snapshot, and
//! republishes that snapshot to any number of observers.
//!
//! # Architecture
//!
//! ```text
//! Action ──→ mutate ──→ Mutation ──→ reduce ──→ State ──→ observers
//!    ↑                                             │
//!    └─────────────────────────────────────────────┘
//! ```
//!
//! - **Action**: external intents submitted to the container
//! - **Mutation**: internal effect descriptors, consumed only by `reduce`
//! - **State**: the immutable snapshot folded from mutations
//!
//! Implement [`Reactor`] on any type, hold it in an [`Arc`](std::sync::Arc),
//! and the [`ReactorExt`] methods attach the whole pipeline externally: the
//! type itself declares no stored fields for it. The pipeline is assembled
//! lazily, at most once per instance, on first access to the action input
//! or the state output, and it runs on the ambient tokio runtime.

mod assoc;
mod bag;
mod delivery;
mod distributor;
pub mod mutations;
mod pipeline;
mod reactor;

pub use delivery::Delivery;
pub use distributor::StateStream;
pub use pipeline::ActionSender;
pub use reactor::{ActionStream, MutationStream, Reactor, ReactorExt};
