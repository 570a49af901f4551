//! Telemetry: transition log, dropped-timer counters and the read-only
//! snapshot handed to the presentation layer.

use bevy_ecs::prelude::Resource;
use serde::Serialize;

use crate::ecs::{Driver, IncomingRequest, RideSession, RideStatus, Role};
use crate::pricing::{FareBreakdown, RideOptionId};
use crate::spatial::Position;

/// One accepted status change. Self-loops (choosing a destination while idle)
/// are not recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionRecord {
    pub at_ms: u64,
    pub epoch: u64,
    pub from: RideStatus,
    pub to: RideStatus,
}

#[derive(Debug, Default, Resource)]
pub struct SessionTelemetry {
    pub transitions: Vec<TransitionRecord>,
    /// Fired timers ignored because the session had moved on.
    pub stale_events_dropped: u64,
    /// Commands rejected by a guard.
    pub rejected_commands: u64,
    pub requests_generated: u64,
    pub sweep_ticks: u64,
}

impl SessionTelemetry {
    pub fn record_transition(&mut self, record: TransitionRecord) {
        self.transitions.push(record);
    }

    /// Transitions that happened at or after `at_ms`.
    pub fn transitions_since(&self, at_ms: u64) -> impl Iterator<Item = &TransitionRecord> {
        self.transitions
            .iter()
            .filter(move |record| record.at_ms >= at_ms)
    }

    pub fn last_transition(&self) -> Option<&TransitionRecord> {
        self.transitions.last()
    }
}

/// Immutable copy of a session for rendering. Every UI branch is a pure
/// function of this value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub role: Role,
    pub now_ms: u64,
    pub epoch: u64,
    pub status: RideStatus,
    pub passenger_position: Position,
    pub destination: Option<Position>,
    pub driver: Option<Driver>,
    pub pending_request: Option<IncomingRequest>,
    pub online: bool,
    pub ride_option: Option<RideOptionId>,
    pub fare: FareBreakdown,
    pub fare_total: f64,
    pub rating: Option<u8>,
    pub sweep_active: bool,
}

impl SessionSnapshot {
    pub fn capture(role: Role, now_ms: u64, session: &RideSession) -> Self {
        Self {
            role,
            now_ms,
            epoch: session.epoch,
            status: session.status,
            passenger_position: session.passenger_position,
            destination: session.destination,
            driver: session.driver.clone(),
            pending_request: session.pending_request.clone(),
            online: session.online,
            ride_option: session.ride_option,
            fare: session.fare.clone(),
            fare_total: session.fare.total(),
            rating: session.rating,
            sweep_active: session.sweep_active(),
        }
    }

    pub fn driver_position(&self) -> Option<Position> {
        self.driver.as_ref().map(Driver::position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_since_filters_by_time() {
        let mut telemetry = SessionTelemetry::default();
        for (at_ms, to) in [(0, RideStatus::Searching), (2500, RideStatus::Matched)] {
            telemetry.record_transition(TransitionRecord {
                at_ms,
                epoch: 0,
                from: RideStatus::Idle,
                to,
            });
        }
        assert_eq!(telemetry.transitions_since(1000).count(), 1);
        assert_eq!(
            telemetry.last_transition().map(|r| r.to),
            Some(RideStatus::Matched)
        );
    }

    #[test]
    fn snapshot_serializes_for_presentation() {
        let session = RideSession::new(Position::new(50.0, 50.0));
        let snapshot = SessionSnapshot::capture(Role::Passenger, 0, &session);
        let json = serde_json::to_value(&snapshot).expect("json");
        assert_eq!(json["status"], "Idle");
        assert_eq!(json["destination"], serde_json::Value::Null);
        assert_eq!(json["sweep_active"], false);
    }
}
