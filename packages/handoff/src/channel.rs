//! Typed rendezvous and bounded channels
//!
//! A [`Channel`] with capacity 0 is a rendezvous point: `send` completes only
//! once a receiver has taken the value. With capacity `C > 0` up to `C`
//! values are buffered without a waiting receiver and `send` suspends only
//! while the buffer is full.
//!
//! Senders that cannot complete immediately park their value as an *offer*.
//! Receivers drain the buffer first and then take offers in the order they
//! were made, so values from a single sender always arrive in send order.
//! Taking an offer from a full buffer promotes the oldest offer into the
//! freed slot, which is the moment its sender is released.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::Notify;

use crate::error::{ChannelClosed, Closed, RecvTimeoutError, TryRecvError};

/// A value parked by a sender that could not complete immediately
struct Offer<T> {
    ticket: u64,
    value: T,
}

struct State<T> {
    /// Accepted values, never longer than the channel capacity
    buffer: VecDeque<T>,
    offers: VecDeque<Offer<T>>,
    /// Tickets whose offer was taken while the sender was still parked
    taken: HashSet<u64>,
    next_ticket: u64,
    closed: bool,
}

struct Shared<T> {
    capacity: usize,
    state: Mutex<State<T>>,
    /// Woken when a value is offered or buffered, and on close
    not_empty: Notify,
    /// Woken when an offer is taken, and on close
    offer_taken: Notify,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => {
                tracing::warn!("channel state lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

/// Typed, thread-safe channel shared by every clone of the handle
///
/// All clones refer to the same queue. Dropping handles never closes the
/// channel; only [`Channel::close`] does.
pub struct Channel<T> {
    shared: Arc<Shared<T>>,
}

/// Channel used purely to signal that an event occurred
pub type SignalChannel = Channel<()>;

/// Create a channel with the given capacity (0 for a rendezvous channel)
#[must_use]
pub fn make_channel<T>(capacity: usize) -> Channel<T> {
    Channel::new(capacity)
}

impl<T> Channel<T> {
    /// Create a new channel
    ///
    /// A capacity of 0 creates an unbuffered channel where every send waits
    /// for a matching receive.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                capacity,
                state: Mutex::new(State {
                    buffer: VecDeque::with_capacity(capacity),
                    offers: VecDeque::new(),
                    taken: HashSet::new(),
                    next_ticket: 0,
                    closed: false,
                }),
                not_empty: Notify::new(),
                offer_taken: Notify::new(),
            }),
        }
    }

    /// Create an unbuffered (rendezvous) channel
    #[must_use]
    pub fn unbuffered() -> Self {
        Self::new(0)
    }

    /// Send a value, suspending until the channel accepts it
    ///
    /// On an unbuffered channel this returns once a receiver has taken the
    /// value. Dropping the returned future before it completes withdraws the
    /// value if no receiver has taken it yet.
    ///
    /// # Errors
    ///
    /// Returns `ChannelClosed` if the channel was closed before the send, or
    /// while the sender was waiting. In the latter case the value is dropped.
    pub async fn send(&self, value: T) -> Result<(), ChannelClosed> {
        let ticket = {
            let mut state = self.shared.lock();
            if state.closed {
                return Err(ChannelClosed);
            }
            if state.offers.is_empty() && state.buffer.len() < self.shared.capacity {
                state.buffer.push_back(value);
                drop(state);
                self.shared.not_empty.notify_waiters();
                return Ok(());
            }
            let ticket = state.next_ticket;
            state.next_ticket = state.next_ticket.wrapping_add(1);
            state.offers.push_back(Offer { ticket, value });
            ticket
        };
        self.shared.not_empty.notify_waiters();

        let mut parked = ParkedSender {
            shared: &self.shared,
            ticket,
            settled: false,
        };
        parked.wait().await
    }

    /// Receive the next value, suspending until one is available
    ///
    /// # Errors
    ///
    /// Returns `Closed` once the channel is closed and every buffered value
    /// has been received. Later calls return `Closed` without suspending.
    pub async fn recv(&self) -> Result<T, Closed> {
        loop {
            // Registered before the state check so a send in between is not missed
            let notified = self.shared.not_empty.notified();
            match self.try_recv() {
                Ok(value) => return Ok(value),
                Err(TryRecvError::Closed) => return Err(Closed),
                Err(TryRecvError::Empty) => notified.await,
            }
        }
    }

    /// Receive a value if one is immediately available
    ///
    /// # Errors
    ///
    /// Returns `TryRecvError::Empty` if no value is ready and the channel is
    /// open, `TryRecvError::Closed` if it is closed and drained.
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        let mut state = self.shared.lock();
        let (value, released) = if let Some(value) = state.buffer.pop_front() {
            let released = match state.offers.pop_front() {
                Some(offer) => {
                    state.buffer.push_back(offer.value);
                    state.taken.insert(offer.ticket);
                    true
                }
                None => false,
            };
            (value, released)
        } else if let Some(offer) = state.offers.pop_front() {
            state.taken.insert(offer.ticket);
            (offer.value, true)
        } else if state.closed {
            return Err(TryRecvError::Closed);
        } else {
            return Err(TryRecvError::Empty);
        };
        drop(state);

        if released {
            self.shared.offer_taken.notify_waiters();
        }
        Ok(value)
    }

    /// Receive with an upper bound on the wait
    ///
    /// # Errors
    ///
    /// Returns `RecvTimeoutError::Timeout` if nothing arrived within
    /// `timeout`, or `RecvTimeoutError::Closed` if the channel is closed and
    /// drained.
    pub async fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        match tokio::time::timeout(timeout, self.recv()).await {
            Ok(received) => received.map_err(RecvTimeoutError::from),
            Err(_) => Err(RecvTimeoutError::Timeout),
        }
    }

    /// Close the channel
    ///
    /// Buffered values stay available to receivers. Senders still parked
    /// with an untaken offer fail with `ChannelClosed`.
    ///
    /// # Errors
    ///
    /// Returns `ChannelClosed` if the channel was already closed.
    pub fn close(&self) -> Result<(), ChannelClosed> {
        let withdrawn = {
            let mut state = self.shared.lock();
            if state.closed {
                return Err(ChannelClosed);
            }
            state.closed = true;
            std::mem::take(&mut state.offers)
        };
        tracing::debug!(
            capacity = self.shared.capacity,
            withdrawn = withdrawn.len(),
            "channel closed"
        );
        drop(withdrawn);

        self.shared.not_empty.notify_waiters();
        self.shared.offer_taken.notify_waiters();
        Ok(())
    }

    /// Send from synchronous code, blocking the current thread
    ///
    /// Intended for closures run with [`spawn_blocking`](crate::spawn_blocking)
    /// or plain threads. Calling it from inside an async task stalls that
    /// task's worker thread.
    ///
    /// # Errors
    ///
    /// Same as [`Channel::send`].
    pub fn blocking_send(&self, value: T) -> Result<(), ChannelClosed> {
        futures::executor::block_on(self.send(value))
    }

    /// Receive from synchronous code, blocking the current thread
    ///
    /// # Errors
    ///
    /// Same as [`Channel::recv`].
    pub fn blocking_recv(&self) -> Result<T, Closed> {
        futures::executor::block_on(self.recv())
    }

    /// Capacity the channel was created with
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Number of buffered values
    ///
    /// Offers from parked senders are not counted, so this never exceeds
    /// [`Channel::capacity`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.lock().buffer.len()
    }

    /// Whether no values are buffered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of senders currently parked with an untaken offer
    #[must_use]
    pub fn parked_senders(&self) -> usize {
        self.shared.lock().offers.len()
    }

    /// Whether [`Channel::close`] has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }
}

impl Channel<()> {
    /// Signal that the event occurred
    ///
    /// # Errors
    ///
    /// Returns `ChannelClosed` if the channel is closed.
    pub async fn signal(&self) -> Result<(), ChannelClosed> {
        self.send(()).await
    }

    /// Wait for one signal
    ///
    /// # Errors
    ///
    /// Returns `Closed` if the channel closed without a pending signal.
    pub async fn wait(&self) -> Result<(), Closed> {
        self.recv().await
    }
}

/// Sender parked until its offer is taken or the channel closes
struct ParkedSender<'a, T> {
    shared: &'a Shared<T>,
    ticket: u64,
    settled: bool,
}

impl<T> ParkedSender<'_, T> {
    async fn wait(&mut self) -> Result<(), ChannelClosed> {
        loop {
            let notified = self.shared.offer_taken.notified();
            {
                let mut state = self.shared.lock();
                if state.taken.remove(&self.ticket) {
                    self.settled = true;
                    return Ok(());
                }
                if state.closed {
                    self.settled = true;
                    return Err(ChannelClosed);
                }
            }
            notified.await;
        }
    }
}

impl<T> Drop for ParkedSender<'_, T> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        // Cancelled mid-send: withdraw the offer, or forget that it was taken
        let withdrawn = {
            let mut state = self.shared.lock();
            match state.offers.iter().position(|offer| offer.ticket == self.ticket) {
                Some(index) => state.offers.remove(index),
                None => {
                    state.taken.remove(&self.ticket);
                    None
                }
            }
        };
        drop(withdrawn);
    }
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::unbuffered()
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("Channel")
            .field("capacity", &self.shared.capacity)
            .field("len", &state.buffer.len())
            .field("parked_senders", &state.offers.len())
            .field("closed", &state.closed)
            .finish()
    }
}
