//! # Channel-Based Task Coordination
//!
//! Lightweight tasks on Tokio plus a typed channel with Go-style rendezvous
//! semantics, and three coordination patterns built on top of it:
//! fire-and-forget notification, fixed-arity ordered fan-in and a
//! done-signal gate.
//!
//! Tasks never share mutable state except through channels. There is no
//! deadlock detection and no task cancellation: always spawn the other side
//! of a synchronous exchange before blocking on it. The [`PatternBuilder`]
//! constructors enforce that ordering.

pub mod channel;
pub mod config;
pub mod error;
pub mod logging;
pub mod patterns;
pub mod task;

pub use channel::{make_channel, Channel, SignalChannel};
pub use config::SchedulerConfig;
pub use error::{ChannelClosed, Closed, RecvTimeoutError, TaskError, TaskResult, TryRecvError};
pub use patterns::{AsyncPattern, FanIn, Gate, Inbox, Outbox, PatternBuilder};
pub use task::{spawn, spawn_blocking, spawn_on, TaskId, TaskState};
