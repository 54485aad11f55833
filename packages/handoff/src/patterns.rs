//! Channel-based coordination patterns
//!
//! Every pattern spawns the producing side before handing the coordinator
//! anything it could block on. [`PatternBuilder::producer`] is the building
//! block: it takes the producer first and only then returns the receive-only
//! [`Inbox`], so a coordinator cannot end up waiting on a channel whose
//! sender was never started.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::time::Duration;

use crate::channel::{Channel, SignalChannel};
use crate::error::{ChannelClosed, Closed, RecvTimeoutError, TaskError, TaskResult, TryRecvError};
use crate::task::{self, TaskId};

/// Pattern builder for channel coordination shapes
pub struct PatternBuilder;

impl PatternBuilder {
    /// Fire-and-forget notification
    ///
    /// Spawns a task that waits `delay` and then runs `effect`. The caller
    /// continues immediately; nothing guarantees the effect runs if the
    /// runtime shuts down first.
    pub fn notify<F>(delay: Duration, effect: F) -> TaskId
    where
        F: FnOnce() + Send + 'static,
    {
        task::spawn(async move {
            tokio::time::sleep(delay).await;
            effect();
            tracing::debug!(?delay, "notification delivered");
        })
    }

    /// Spawn a producer and return the receiving end of its channel
    ///
    /// `produce` receives the send-only [`Outbox`]. The channel is closed
    /// when the producer finishes (or panics), so the coordinator sees
    /// [`Closed`] rather than hanging on a producer that is gone.
    pub fn producer<T, F, Fut>(capacity: usize, produce: F) -> Inbox<T>
    where
        T: Send + 'static,
        F: FnOnce(Outbox<T>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let channel = Channel::new(capacity);
        let outbox = Outbox {
            channel: channel.clone(),
        };
        let task = task::spawn(produce(outbox));
        Inbox { channel, task }
    }

    /// Fixed-arity ordered fan-in
    ///
    /// One producer applies `transform` to each input in order and sends
    /// every result on a single unbuffered channel; the coordinator receives
    /// exactly as many values as there are inputs.
    #[must_use]
    pub fn fan_in<I, O, F>(inputs: impl IntoIterator<Item = I>, transform: F) -> FanIn<I, O, F>
    where
        F: FnMut(I) -> O,
    {
        FanIn {
            inputs: inputs.into_iter().collect(),
            capacity: 0,
            transform,
            _output: PhantomData,
        }
    }

    /// Done-signal gate
    ///
    /// Spawns a task that runs `prepare` to completion and then sends one
    /// signal token. Everything `prepare` did is visible to the coordinator
    /// once [`Gate::wait`] returns.
    pub fn gate<F, Fut>(prepare: F) -> Gate
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let signal = SignalChannel::unbuffered();
        let outbox = Outbox {
            channel: signal.clone(),
        };
        let work = prepare();
        let task = task::spawn(async move {
            work.await;
            if outbox.send(()).await.is_err() {
                tracing::debug!("gate dropped before the signal was taken");
            }
        });
        Gate { signal, task }
    }

    /// Done-signal gate around a synchronous closure
    ///
    /// `prepare` runs on the blocking thread pool.
    pub fn gate_blocking<F>(prepare: F) -> Gate
    where
        F: FnOnce() + Send + 'static,
    {
        let signal = SignalChannel::unbuffered();
        let outbox = Outbox {
            channel: signal.clone(),
        };
        let task = task::spawn_blocking(move || {
            prepare();
            if outbox.blocking_send(()).is_err() {
                tracing::debug!("gate dropped before the signal was taken");
            }
        });
        Gate { signal, task }
    }
}

/// Send-only end of a producer's channel
///
/// Dropping the outbox closes the channel.
pub struct Outbox<T> {
    channel: Channel<T>,
}

impl<T> Outbox<T> {
    /// Send a value to the coordinator
    ///
    /// # Errors
    ///
    /// Returns `ChannelClosed` if the coordinator dropped its [`Inbox`].
    pub async fn send(&self, value: T) -> Result<(), ChannelClosed> {
        self.channel.send(value).await
    }

    /// Send from a synchronous producer
    ///
    /// # Errors
    ///
    /// Returns `ChannelClosed` if the coordinator dropped its [`Inbox`].
    pub fn blocking_send(&self, value: T) -> Result<(), ChannelClosed> {
        self.channel.blocking_send(value)
    }
}

impl<T> Drop for Outbox<T> {
    fn drop(&mut self) {
        if self.channel.close().is_ok() {
            tracing::trace!("producer finished, channel closed");
        }
    }
}

/// Receive-only end of a producer's channel
///
/// Dropping the inbox closes the channel, so a producer still parked on a
/// send is released with [`ChannelClosed`].
pub struct Inbox<T> {
    channel: Channel<T>,
    task: TaskId,
}

impl<T> Inbox<T> {
    /// Id of the producer task
    #[must_use]
    pub fn task_id(&self) -> TaskId {
        self.task
    }

    /// Receive the next value
    ///
    /// # Errors
    ///
    /// Returns `Closed` once the producer has finished and every value has
    /// been received.
    pub async fn recv(&self) -> Result<T, Closed> {
        self.channel.recv().await
    }

    /// Receive a value if one is ready
    ///
    /// # Errors
    ///
    /// See [`Channel::try_recv`].
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.channel.try_recv()
    }

    /// Receive with an upper bound on the wait
    ///
    /// # Errors
    ///
    /// See [`Channel::recv_timeout`].
    pub async fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        self.channel.recv_timeout(timeout).await
    }

    /// Receive exactly `n` values, in the order they were sent
    ///
    /// # Errors
    ///
    /// Returns `TaskError::ProducerExited` if the producer finished after
    /// sending fewer than `n` values.
    pub async fn recv_exact(&self, n: usize) -> TaskResult<Vec<T>> {
        let mut slots = Vec::with_capacity(n);
        while slots.len() < n {
            match self.channel.recv().await {
                Ok(value) => slots.push(value),
                Err(Closed) => {
                    tracing::warn!(
                        task = %self.task,
                        expected = n,
                        received = slots.len(),
                        "producer exited before sending every value"
                    );
                    return Err(TaskError::ProducerExited {
                        expected: n,
                        received: slots.len(),
                    });
                }
            }
        }
        Ok(slots)
    }
}

impl<T> Drop for Inbox<T> {
    fn drop(&mut self) {
        let _ = self.channel.close();
    }
}

/// Fixed-arity ordered fan-in, built by [`PatternBuilder::fan_in`]
pub struct FanIn<I, O, F> {
    inputs: Vec<I>,
    capacity: usize,
    transform: F,
    _output: PhantomData<fn() -> O>,
}

impl<I, O, F> FanIn<I, O, F>
where
    I: Send + 'static,
    O: Send + 'static,
    F: FnMut(I) -> O + Send + 'static,
{
    /// Let the producer run ahead of the coordinator by up to `capacity` values
    #[must_use]
    pub fn buffered(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Number of values the coordinator will receive
    #[must_use]
    pub fn arity(&self) -> usize {
        self.inputs.len()
    }

    /// Run the producer and collect one result per input, in input order
    ///
    /// # Errors
    ///
    /// Returns `TaskError::ProducerExited` if the producer panicked before
    /// sending every value.
    pub async fn run(self) -> TaskResult<Vec<O>> {
        let Self {
            inputs,
            capacity,
            mut transform,
            ..
        } = self;
        let expected = inputs.len();

        let inbox = PatternBuilder::producer(capacity, move |outbox| async move {
            for item in inputs {
                if outbox.send(transform(item)).await.is_err() {
                    tracing::debug!("fan-in coordinator went away, producer stopping");
                    break;
                }
            }
        });
        inbox.recv_exact(expected).await
    }

    /// Run into a fixed-size result array
    ///
    /// # Errors
    ///
    /// Returns `TaskError::ArityMismatch` if the number of inputs differs
    /// from `N`, or any error from [`FanIn::run`].
    pub async fn run_array<const N: usize>(self) -> TaskResult<[O; N]> {
        if self.inputs.len() != N {
            return Err(TaskError::ArityMismatch {
                slots: N,
                inputs: self.inputs.len(),
            });
        }
        let slots = self.run().await?;
        let received = slots.len();
        slots
            .try_into()
            .map_err(|_: Vec<O>| TaskError::ProducerExited {
                expected: N,
                received,
            })
    }
}

/// Done-signal gate, built by [`PatternBuilder::gate`]
///
/// Dropping the gate without waiting closes the signal channel and releases
/// the task.
pub struct Gate {
    signal: SignalChannel,
    task: TaskId,
}

impl Gate {
    /// Id of the preparing task
    #[must_use]
    pub fn task_id(&self) -> TaskId {
        self.task
    }

    /// Block until the preparing task signals
    ///
    /// # Errors
    ///
    /// Returns `TaskError::GateAbandoned` if the task exited (for example by
    /// panicking) without signalling.
    pub async fn wait(self) -> TaskResult<()> {
        self.signal.wait().await.map_err(|Closed| {
            tracing::warn!(task = %self.task, "gate task exited without signalling");
            TaskError::GateAbandoned
        })
    }

    /// Block until the preparing task signals or `timeout` elapses
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Timeout` if the signal did not arrive in time, or
    /// `TaskError::GateAbandoned` as for [`Gate::wait`].
    pub async fn wait_timeout(self, timeout: Duration) -> TaskResult<()> {
        match self.signal.recv_timeout(timeout).await {
            Ok(()) => Ok(()),
            Err(RecvTimeoutError::Timeout) => Err(TaskError::Timeout),
            Err(RecvTimeoutError::Closed) => Err(TaskError::GateAbandoned),
        }
    }
}

impl Drop for Gate {
    fn drop(&mut self) {
        let _ = self.signal.close();
    }
}

/// Base trait for coordination patterns (avoiding `async_trait`)
pub trait AsyncPattern {
    /// What the coordinator gets once the pattern completes
    type Output;

    /// Drive the pattern to completion
    fn execute(self) -> Pin<Box<dyn Future<Output = Self::Output> + Send>>;
}

impl<I, O, F> AsyncPattern for FanIn<I, O, F>
where
    I: Send + 'static,
    O: Send + 'static,
    F: FnMut(I) -> O + Send + 'static,
{
    type Output = TaskResult<Vec<O>>;

    fn execute(self) -> Pin<Box<dyn Future<Output = Self::Output> + Send>> {
        Box::pin(self.run())
    }
}

impl AsyncPattern for Gate {
    type Output = TaskResult<()>;

    fn execute(self) -> Pin<Box<dyn Future<Output = Self::Output> + Send>> {
        Box::pin(self.wait())
    }
}
