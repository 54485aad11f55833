//! Error types for channel and coordination operations

/// A send or close was attempted on a channel that is already closed.
///
/// A sender that was still parked when the channel closed also gets this
/// error; its value is dropped and never reaches a receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("channel closed")]
pub struct ChannelClosed;

/// The channel is closed and every buffered value has been received.
///
/// This is a terminal state rather than a failure: once a receive has
/// returned `Closed`, all later receives return it immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("channel closed and drained")]
pub struct Closed;

/// Error returned by [`Channel::try_recv`](crate::Channel::try_recv)
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TryRecvError {
    /// Nothing buffered and no sender waiting
    #[error("channel empty")]
    Empty,
    /// Closed with nothing left to drain
    #[error("channel closed and drained")]
    Closed,
}

/// Error returned by [`Channel::recv_timeout`](crate::Channel::recv_timeout)
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RecvTimeoutError {
    /// The deadline passed before a value arrived
    #[error("timed out waiting on channel")]
    Timeout,
    /// Closed with nothing left to drain
    #[error("channel closed and drained")]
    Closed,
}

impl From<Closed> for RecvTimeoutError {
    fn from(_: Closed) -> Self {
        Self::Closed
    }
}

/// Error types for coordination patterns
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// The producer closed its channel before sending every value
    #[error("producer exited after {received} of {expected} values")]
    ProducerExited {
        /// Values the coordinator was waiting for
        expected: usize,
        /// Values that arrived before the channel closed
        received: usize,
    },
    /// A fixed-size result array does not match the input count
    #[error("{slots} result slots for {inputs} inputs")]
    ArityMismatch {
        /// Length of the requested result array
        slots: usize,
        /// Number of inputs handed to the producer
        inputs: usize,
    },
    /// The gate task ended without sending its signal
    #[error("gate task exited without signalling")]
    GateAbandoned,
    /// A timed wait on a producer or gate expired
    #[error("timed out waiting on producer")]
    Timeout,
    /// A send or close hit a closed channel
    #[error("channel error: {0}")]
    Channel(#[from] ChannelClosed),
    /// Scheduler configuration could not be loaded or applied
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for coordination patterns
pub type TaskResult<T> = Result<T, TaskError>;
