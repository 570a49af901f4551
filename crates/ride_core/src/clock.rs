//! Virtual-time event queue driving every delayed or periodic ride effect.
//!
//! Time is measured in simulation milliseconds and only moves when the runner
//! pops an event or advances to a deadline. Every scheduled event is identified
//! by a [TimerHandle]; cancelled handles are skipped when popped, so a timer
//! that was torn down can never reach a system.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use bevy_ecs::prelude::Resource;
use serde::Serialize;

pub const ONE_SEC_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EventKind {
    /// Driver side: a simulated incoming request is due.
    RequestArrival,
    /// Passenger side: dispatch has found a driver.
    MatchFound,
    /// Passenger side: the matched driver starts heading to the pickup.
    DispatchDeparted,
    /// One interpolation tick of the running sweep.
    MoveStep,
}

/// Identifies one scheduled event so it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub timestamp: u64,
    pub kind: EventKind,
    pub handle: TimerHandle,
    /// Session generation the event was scheduled for.
    pub epoch: u64,
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap a min-heap by timestamp; ties fire in scheduling order.
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| other.handle.cmp(&self.handle))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The event being handled by the current schedule run.
#[derive(Debug, Clone, Copy, Resource)]
pub struct CurrentEvent(pub Event);

#[derive(Debug, Default, Resource)]
pub struct SimulationClock {
    now: u64,
    next_handle: u64,
    events: BinaryHeap<Event>,
    live: HashSet<TimerHandle>,
}

impl SimulationClock {
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Schedules `kind` at an absolute timestamp and returns its handle.
    pub fn schedule_at(&mut self, timestamp: u64, kind: EventKind, epoch: u64) -> TimerHandle {
        debug_assert!(
            timestamp >= self.now,
            "event timestamp must be >= current time"
        );
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.events.push(Event {
            timestamp: timestamp.max(self.now),
            kind,
            handle,
            epoch,
        });
        self.live.insert(handle);
        handle
    }

    /// Schedules `kind` `delay_ms` after the current time.
    pub fn schedule_in(&mut self, delay_ms: u64, kind: EventKind, epoch: u64) -> TimerHandle {
        self.schedule_at(self.now.saturating_add(delay_ms), kind, epoch)
    }

    /// Cancels one timer. Returns `false` when it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.live.remove(&handle)
    }

    /// Drops every outstanding timer at once. Returns how many were live.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.live.len();
        self.live.clear();
        self.events.clear();
        cancelled
    }

    pub fn is_live(&self, handle: TimerHandle) -> bool {
        self.live.contains(&handle)
    }

    /// Number of timers that are scheduled and not cancelled.
    pub fn pending_count(&self) -> usize {
        self.live.len()
    }

    /// Timestamp of the next live event, discarding cancelled ones on the way.
    pub fn next_event_time(&mut self) -> Option<u64> {
        self.discard_cancelled();
        self.events.peek().map(|event| event.timestamp)
    }

    /// Pops the next live event and moves the clock to its timestamp.
    pub fn pop_next(&mut self) -> Option<Event> {
        self.discard_cancelled();
        let event = self.events.pop()?;
        self.live.remove(&event.handle);
        self.now = event.timestamp;
        Some(event)
    }

    /// Moves the clock forward without firing anything. Never moves backwards.
    pub fn advance_to(&mut self, timestamp: u64) {
        self.now = self.now.max(timestamp);
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    fn discard_cancelled(&mut self) {
        while let Some(top) = self.events.peek() {
            if self.live.contains(&top.handle) {
                break;
            }
            self.events.pop();
        }
    }
}
