//! Builders for the mutation sequences returned by
//! [`Reactor::mutate`](crate::Reactor::mutate).

use std::future::Future;

use futures::stream::{self, StreamExt};

use crate::reactor::MutationStream;

/// No mutations: the action is a deliberate no-op.
pub fn none<M: Send + 'static>() -> MutationStream<M> {
    stream::empty().boxed()
}

/// A single, immediately available mutation.
pub fn just<M: Send + 'static>(mutation: M) -> MutationStream<M> {
    stream::once(std::future::ready(mutation)).boxed()
}

/// Mutations emitted in order from an iterator.
pub fn from_iter<M, I>(mutations: I) -> MutationStream<M>
where
    M: Send + 'static,
    I: IntoIterator<Item = M>,
    I::IntoIter: Send + 'static,
{
    stream::iter(mutations).boxed()
}

/// A single mutation produced by an asynchronous effect.
pub fn future<M, F>(effect: F) -> MutationStream<M>
where
    M: Send + 'static,
    F: Future<Output = M> + Send + 'static,
{
    stream::once(effect).boxed()
}

/// A single mutation folded from a fallible asynchronous effect.
///
/// The state sequence itself cannot fail, so effect outcomes have to
/// travel as data: `embed` turns the `Result` into whatever variant of
/// the mutation type records success or failure.
pub fn result<M, T, E, F, Map>(effect: F, embed: Map) -> MutationStream<M>
where
    M: Send + 'static,
    F: Future<Output = Result<T, E>> + Send + 'static,
    Map: FnOnce(Result<T, E>) -> M + Send + 'static,
{
    stream::once(async move { embed(effect.await) }).boxed()
}

/// Emits the action unchanged as its single mutation.
///
/// For containers where `Action` and `Mutation` are the same type this is
/// the natural one-line `mutate` body.
pub fn passthrough<M: Send + 'static>(action: M) -> MutationStream<M> {
    just(action)
}
