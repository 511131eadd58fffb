//! Static Fan-Out Event Bus
//!
//! ## Overview
//!
//! The bus is the only coupling between coordinators. A publish clones the
//! event into the mailbox of every subscriber whose source filter matches,
//! then returns — it never waits on a consumer and never suspends the
//! publisher:
//!
//! ```text
//!                    ┌─► app mailbox       (app | modem | cloud)
//! publish(event) ────┼─► modem mailbox     (all sources)
//!   filter + post    ├─► location mailbox  (all sources)
//!   per subscriber   ├─► cloud mailbox     (all sources)
//!                    └─► led mailbox       (all sources)
//! ```
//!
//! ## Static Subscriptions
//!
//! Subscribers are attached once while the bus is wired, each with a fixed
//! [`SourceSet`]; the built [`Bus`] is immutable. There is no unsubscribe,
//! no event priority, and no delivery-order guarantee across subscribers —
//! every event must be self-contained.
//!
//! ## Degraded Delivery
//!
//! A full mailbox costs that one subscriber that one event. The drop is
//! counted on the mailbox and logged here with the subscriber's name;
//! everything else proceeds.

use heapless::Vec;

use crate::events::{Event, SourceSet};
use crate::mailbox::Mailbox;

/// Maximum number of attachable subscribers
pub const MAX_SUBSCRIBERS: usize = 8;

/// Anything events can be published into.
///
/// The bus is the production implementation; tests substitute recording
/// sinks to observe a single coordinator in isolation.
pub trait EventSink {
    /// Deliver one event to every interested party.
    fn publish(&self, event: Event);
}

/// Handle identifying one attached subscriber's mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberId(usize);

struct Slot {
    name: &'static str,
    filter: SourceSet,
    mailbox: Mailbox,
}

/// Wiring-time builder for the bus
///
/// Attach every coordinator, then [`BusBuilder::build`]; the subscriber
/// set is frozen from that point on.
pub struct BusBuilder {
    slots: Vec<Slot, MAX_SUBSCRIBERS>,
}

impl BusBuilder {
    /// Start wiring a bus with no subscribers
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Attach one subscriber with its fixed source filter.
    ///
    /// The subscriber set is compile-time-known; exceeding
    /// [`MAX_SUBSCRIBERS`] is a wiring bug and panics at startup.
    pub fn attach(&mut self, name: &'static str, filter: SourceSet) -> SubscriberId {
        let id = SubscriberId(self.slots.len());
        if self
            .slots
            .push(Slot {
                name,
                filter,
                mailbox: Mailbox::new(),
            })
            .is_err()
        {
            panic!("subscriber table full (max {MAX_SUBSCRIBERS})");
        }
        id
    }

    /// Freeze the subscriber set
    pub fn build(self) -> Bus {
        Bus { slots: self.slots }
    }
}

impl Default for BusBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide fan-out dispatcher
pub struct Bus {
    slots: Vec<Slot, MAX_SUBSCRIBERS>,
}

impl Bus {
    /// Mailbox of an attached subscriber, for the owning consumer thread
    pub fn mailbox(&self, id: SubscriberId) -> &Mailbox {
        &self.slots[id.0].mailbox
    }
}

impl EventSink for Bus {
    fn publish(&self, event: Event) {
        let source = event.source();
        for slot in &self.slots {
            if !slot.filter.contains(source) {
                continue;
            }
            if !slot.mailbox.post(event.clone()) {
                log::warn!("{}: mailbox full, dropped {}", slot.name, event.name());
            }
        }
    }
}
