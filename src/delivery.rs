//! Execution-context policy for action delivery.

/// Controls which execution context actions are marshaled through before
/// they enter the pipeline.
///
/// Selected once, at pipeline construction, via
/// [`Reactor::delivery`](crate::Reactor::delivery).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delivery {
    /// Deliver each action as soon as the pipeline pulls it, with no
    /// extra hop.
    #[default]
    Immediate,
    /// Re-enqueue each action through the runtime before delivery, so
    /// other scheduled work runs first.
    Queued,
}
