//! Bounded Coordinator Mailboxes
//!
//! ## Overview
//!
//! Each coordinator owns exactly one mailbox: a fixed-capacity, lock-free
//! ring the bus posts events into and the coordinator's own thread drains.
//! This is the only channel between coordinators, which gives the whole
//! system its concurrency contract:
//!
//! - **Producers never block.** [`Mailbox::post`] either enqueues or drops
//!   that single delivery, counts the drop, and returns. A slow consumer
//!   degrades its own delivery, never the publisher.
//! - **The consumer blocks only here.** Under `std`, [`Mailbox::recv`]
//!   parks the consumer thread until an event arrives, re-expressing a
//!   kernel message queue's wait-forever receive.
//!
//! ```text
//! publisher A ──post──┐
//! publisher B ──post──┼──► ring (MAILBOX_CAPACITY) ──recv──► owning thread
//! timer thread ─post──┘         │
//!                               └── full? drop + count + warn
//! ```
//!
//! ## Why a Lock-Free Ring
//!
//! Posts happen from whichever thread is publishing, including timer
//! expiry; a mutex here would let a preempted publisher stall every other
//! publisher. The multi-producer ring keeps `post` wait-free for the
//! producers, and the consumer side needs no coordination because each
//! mailbox has exactly one owner.
//!
//! ## Overflow Semantics
//!
//! Delivery is best-effort, not at-least-once: a full mailbox costs that
//! one subscriber that one event. The [`MailboxStats`] counters make the
//! loss observable without adding any synchronization to the hot path.

use core::sync::atomic::{AtomicU32, Ordering};

use heapless::mpmc::MpMcQueue;

use crate::events::Event;

/// Events a mailbox can hold. Must be a power of two for the ring; sized
/// to cover a burst of one full publish from every producer with room to
/// spare.
pub const MAILBOX_CAPACITY: usize = 32;

const _: () = assert!(
    MAILBOX_CAPACITY.is_power_of_two(),
    "mailbox capacity must be a power of 2"
);

/// Mailbox delivery statistics
///
/// Track mailbox health without impacting the post path.
#[derive(Debug)]
pub struct MailboxStats {
    posted: AtomicU32,
    consumed: AtomicU32,
    dropped: AtomicU32,
}

impl MailboxStats {
    const fn new() -> Self {
        Self {
            posted: AtomicU32::new(0),
            consumed: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Total events accepted into the ring
    pub fn posted(&self) -> u32 {
        self.posted.load(Ordering::Relaxed)
    }

    /// Total events taken out by the consumer
    pub fn consumed(&self) -> u32 {
        self.consumed.load(Ordering::Relaxed)
    }

    /// Deliveries dropped because the ring was full
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// A coordinator-private bounded event queue
pub struct Mailbox {
    ring: MpMcQueue<Event, MAILBOX_CAPACITY>,
    stats: MailboxStats,
    /// Consumer thread to wake on post; set once by the first `recv`.
    #[cfg(feature = "std")]
    waiter: std::sync::OnceLock<std::thread::Thread>,
}

impl Mailbox {
    /// Create an empty mailbox
    pub const fn new() -> Self {
        Self {
            ring: MpMcQueue::new(),
            stats: MailboxStats::new(),
            #[cfg(feature = "std")]
            waiter: std::sync::OnceLock::new(),
        }
    }

    /// Enqueue one event without blocking.
    ///
    /// Returns `false` when the mailbox is full; the event is dropped for
    /// this mailbox only and the drop is counted.
    pub fn post(&self, event: Event) -> bool {
        match self.ring.enqueue(event) {
            Ok(()) => {
                self.stats.posted.fetch_add(1, Ordering::Relaxed);
                self.wake();
                true
            }
            Err(_) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Take the next pending event, if any
    pub fn try_recv(&self) -> Option<Event> {
        let event = self.ring.dequeue();
        if event.is_some() {
            self.stats.consumed.fetch_add(1, Ordering::Relaxed);
        }
        event
    }

    /// Block the calling thread until an event arrives.
    ///
    /// Only the single owning thread may call this; the first caller is
    /// registered as the thread `post` wakes.
    #[cfg(feature = "std")]
    pub fn recv(&self) -> Event {
        let _ = self.waiter.set(std::thread::current());
        loop {
            if let Some(event) = self.try_recv() {
                return event;
            }
            std::thread::park();
        }
    }

    /// Block until an event arrives or the timeout elapses
    #[cfg(feature = "std")]
    pub fn recv_timeout(&self, timeout: core::time::Duration) -> Option<Event> {
        use std::time::Instant;

        let _ = self.waiter.set(std::thread::current());
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(event) = self.try_recv() {
                return Some(event);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            std::thread::park_timeout(deadline - now);
        }
    }

    /// Delivery statistics for this mailbox
    pub fn stats(&self) -> &MailboxStats {
        &self.stats
    }

    #[cfg(feature = "std")]
    fn wake(&self) {
        if let Some(thread) = self.waiter.get() {
            thread.unpark();
        }
    }

    #[cfg(not(feature = "std"))]
    fn wake(&self) {}
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}
