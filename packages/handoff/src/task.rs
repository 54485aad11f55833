//! Lightweight task spawning
//!
//! Tasks are fire-and-forget: spawning returns a [`TaskId`] for log
//! correlation but no join or cancel handle. A task reports progress or
//! results only through channels it was given.
//!
//! ```text
//! Spawned -> Running -> Completed
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use pin_project_lite::pin_project;
use tokio::runtime::Handle;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier assigned to every spawned task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        Self(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Numeric value of the id
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Task lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Handed to the scheduler but not yet polled
    Spawned,
    /// Polled at least once
    Running,
    /// Ran to completion
    Completed,
}

impl TaskState {
    /// Check if the task is in its terminal state
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }
}

pin_project! {
    /// Future wrapper that traces lifecycle transitions of a task
    struct Tracked<F> {
        #[pin]
        inner: F,
        id: TaskId,
        state: TaskState,
    }
}

impl<F> Tracked<F> {
    fn new(id: TaskId, inner: F) -> Self {
        tracing::trace!(task = %id, state = ?TaskState::Spawned, "task spawned");
        Self {
            inner,
            id,
            state: TaskState::Spawned,
        }
    }
}

impl<F: Future<Output = ()>> Future for Tracked<F> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.project();
        if *this.state == TaskState::Spawned {
            *this.state = TaskState::Running;
            tracing::trace!(task = %this.id, state = ?TaskState::Running, "task running");
        }
        match this.inner.poll(cx) {
            Poll::Ready(()) => {
                *this.state = TaskState::Completed;
                tracing::trace!(task = %this.id, state = ?TaskState::Completed, "task completed");
                Poll::Ready(())
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Spawn a task onto the current Tokio runtime and return immediately
///
/// The task may itself spawn further tasks. Its outcome is observable only
/// through channels it holds.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime, like [`tokio::spawn`].
pub fn spawn<F>(future: F) -> TaskId
where
    F: Future<Output = ()> + Send + 'static,
{
    let id = TaskId::next();
    drop(tokio::spawn(Tracked::new(id, future)));
    id
}

/// Spawn a task onto the runtime behind `handle`
///
/// Usable from threads that are not inside a runtime context.
pub fn spawn_on<F>(handle: &Handle, future: F) -> TaskId
where
    F: Future<Output = ()> + Send + 'static,
{
    let id = TaskId::next();
    drop(handle.spawn(Tracked::new(id, future)));
    id
}

/// Spawn a synchronous closure on the blocking thread pool
///
/// The closure may use [`Channel::blocking_send`](crate::Channel::blocking_send)
/// and [`Channel::blocking_recv`](crate::Channel::blocking_recv) freely.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
pub fn spawn_blocking<F>(f: F) -> TaskId
where
    F: FnOnce() + Send + 'static,
{
    let id = TaskId::next();
    tracing::trace!(task = %id, state = ?TaskState::Spawned, "blocking task spawned");
    drop(tokio::task::spawn_blocking(move || {
        tracing::trace!(task = %id, state = ?TaskState::Running, "blocking task running");
        f();
        tracing::trace!(task = %id, state = ?TaskState::Completed, "blocking task completed");
    }));
    id
}
