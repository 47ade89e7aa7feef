// Modbridge Event Queue
// Fixed-capacity ring buffer with a producer lock and a consumer wait signal

use parking_lot::{Condvar, Mutex};
use serde::Deserialize;

use super::signal::PendingSignal;
use crate::event::RawEvent;

/// Default ring size, large enough to absorb key-repeat bursts between
/// consumer wake-ups.
pub const DEFAULT_CAPACITY: usize = 1 << 18;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// What `push` does when the ring is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Report `TransportError::Overflow`; the caller treats it as fatal
    #[default]
    Abort,
    /// Park the producer until the consumer frees a slot
    Block,
}

impl OverflowPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverflowPolicy::Abort => "abort",
            OverflowPolicy::Block => "block",
        }
    }
}

/// Errors raised by the transport
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport capacity must be a power of two of at least 2, got {0}")]
    InvalidCapacity(usize),

    #[error("keyboard event buffer overflow (head={head}, tail={tail}) while pushing {event}")]
    Overflow {
        head: usize,
        tail: usize,
        event: RawEvent,
    },
}

#[derive(Debug)]
struct Ring {
    slots: Box<[RawEvent]>,
    /// Next slot to write. Advanced by producers only.
    head: usize,
    /// Next slot to read. Advanced by the consumer only.
    tail: usize,
}

/// Bounded multi-producer, single-consumer event queue.
///
/// One slot is always left empty so a full ring (`head + 1 == tail`) can be
/// told apart from an empty one (`head == tail`); the usable capacity is
/// therefore `capacity() - 1`.
#[derive(Debug)]
pub struct EventTransport {
    ring: Mutex<Ring>,
    pending: PendingSignal,
    space: Condvar,
    mask: usize,
    policy: OverflowPolicy,
}

impl EventTransport {
    /// Create a transport with `capacity` slots (a power of two).
    pub fn new(capacity: usize, policy: OverflowPolicy) -> TransportResult<Self> {
        if capacity < 2 || !capacity.is_power_of_two() {
            return Err(TransportError::InvalidCapacity(capacity));
        }

        Ok(Self::build(capacity, policy))
    }

    /// Create a transport with the default capacity and abort-on-overflow
    pub fn with_default_capacity() -> Self {
        Self::build(DEFAULT_CAPACITY, OverflowPolicy::Abort)
    }

    fn build(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            ring: Mutex::new(Ring {
                slots: vec![RawEvent::default(); capacity].into_boxed_slice(),
                head: 0,
                tail: 0,
            }),
            pending: PendingSignal::new(),
            space: Condvar::new(),
            mask: capacity - 1,
            policy,
        }
    }

    /// Enqueue an event.
    ///
    /// A full ring is never resolved by dropping: under `Abort` the event is
    /// returned inside `TransportError::Overflow`, under `Block` the caller
    /// parks until `pop` or `purge` frees a slot.
    pub fn push(&self, event: RawEvent) -> TransportResult<()> {
        let mut ring = self.ring.lock();
        while (ring.head + 1) & self.mask == ring.tail {
            match self.policy {
                OverflowPolicy::Abort => {
                    log::error!(
                        "Keyboard event buffer full (head={}, tail={}, pending={}): {}",
                        ring.head,
                        ring.tail,
                        self.pending.value(),
                        event
                    );
                    return Err(TransportError::Overflow {
                        head: ring.head,
                        tail: ring.tail,
                        event,
                    });
                }
                OverflowPolicy::Block => {
                    log::debug!("Keyboard event buffer full, producer waiting for space");
                    self.space.wait(&mut ring);
                }
            }
        }

        let head = ring.head;
        ring.slots[head] = event;
        ring.head = (head + 1) & self.mask;
        drop(ring);

        self.pending.post();
        Ok(())
    }

    /// Dequeue the next event, blocking until one is available.
    ///
    /// Must only be called from the single consumer thread.
    pub fn pop(&self) -> RawEvent {
        loop {
            self.pending.wait();
            // A post that raced a purge leaves the count ahead of the ring
            if let Some(event) = self.take_next() {
                return event;
            }
        }
    }

    /// Dequeue the next event if one is ready
    pub fn try_pop(&self) -> Option<RawEvent> {
        if self.pending.try_wait() {
            self.take_next()
        } else {
            None
        }
    }

    fn take_next(&self) -> Option<RawEvent> {
        let mut ring = self.ring.lock();
        if ring.head == ring.tail {
            return None;
        }

        let tail = ring.tail;
        let event = ring.slots[tail];
        ring.tail = (tail + 1) & self.mask;
        drop(ring);

        if self.policy == OverflowPolicy::Block {
            self.space.notify_one();
        }
        Some(event)
    }

    /// Discard every pending entry and reset the readiness count.
    ///
    /// Returns the number of entries abandoned.
    pub fn purge(&self) -> usize {
        let mut ring = self.ring.lock();
        let discarded = ring.head.wrapping_sub(ring.tail) & self.mask;
        ring.head = ring.tail;
        self.pending.drain();
        drop(ring);

        if self.policy == OverflowPolicy::Block {
            self.space.notify_all();
        }
        log::info!("Keyboard event buffer cleared ({} pending events discarded)", discarded);
        discarded
    }

    /// Number of entries stored in the ring
    pub fn len(&self) -> usize {
        let ring = self.ring.lock();
        ring.head.wrapping_sub(ring.tail) & self.mask
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current value of the readiness count
    pub fn pending(&self) -> usize {
        self.pending.value()
    }

    /// Number of slots in the ring (one more than can be filled)
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }
}
