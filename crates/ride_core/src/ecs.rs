use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::clock::{Event, EventKind, TimerHandle};
use crate::pricing::{FareBreakdown, RideOptionId};
use crate::spatial::{Position, PositionInterpolator};

/// Which side of the ride a session simulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Passenger,
    Driver,
}

/// The role a session's world simulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Resource)]
pub struct SessionRole(pub Role);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RideStatus {
    Idle,
    Searching,
    Matched,
    PickupWay,
    ArrivedPickup,
    InProgress,
    Completed,
    Rated,
}

impl RideStatus {
    pub const ALL: [RideStatus; 8] = [
        RideStatus::Idle,
        RideStatus::Searching,
        RideStatus::Matched,
        RideStatus::PickupWay,
        RideStatus::ArrivedPickup,
        RideStatus::InProgress,
        RideStatus::Completed,
        RideStatus::Rated,
    ];

    /// Whether a driver must be assigned while in this status.
    pub fn has_driver(self) -> bool {
        !matches!(self, RideStatus::Idle | RideStatus::Searching)
    }
}

/// Star rating bounded to 0.0–5.0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Rating(f32);

impl Rating {
    pub const MAX: f32 = 5.0;

    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, Self::MAX))
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub rating: Rating,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub model: String,
    pub plate: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub actor: Actor,
    pub vehicle: Vehicle,
    pub trips: u32,
}

impl Driver {
    pub fn position(&self) -> Position {
        self.actor.position
    }
}

/// A simulated job offer shown to an online driver until accepted, declined,
/// or withdrawn by going offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingRequest {
    pub distance_mi: f64,
    pub duration_min: u32,
    pub fare_quote: f64,
    pub pickup_label: String,
    pub pickup: Position,
    /// Simulation time the request was generated.
    pub generated_at: u64,
}

/// The single scheduled effect a session may own at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingEffect {
    pub kind: EventKind,
    pub handle: TimerHandle,
}

/// Aggregate root of one role's ride. Only the state machine and the
/// availability model mutate it; everyone else reads snapshots.
#[derive(Debug, Clone, Resource)]
pub struct RideSession {
    /// Generation counter; bumped whenever the session is reset or torn down.
    pub epoch: u64,
    pub status: RideStatus,
    pub passenger_position: Position,
    pub destination: Option<Position>,
    pub driver: Option<Driver>,
    pub ride_option: Option<RideOptionId>,
    pub fare: FareBreakdown,
    /// Stars given by the passenger after completion.
    pub rating: Option<u8>,
    pub pending_request: Option<IncomingRequest>,
    /// Driver side only.
    pub online: bool,
    pub(crate) pending_effect: Option<PendingEffect>,
    /// Vehicle sweep in flight; advanced by each `MoveStep` tick.
    pub(crate) sweep: Option<PositionInterpolator>,
}

impl RideSession {
    pub fn new(passenger_position: Position) -> Self {
        Self {
            epoch: 0,
            status: RideStatus::Idle,
            passenger_position,
            destination: None,
            driver: None,
            ride_option: None,
            fare: FareBreakdown::default(),
            rating: None,
            pending_request: None,
            online: false,
            pending_effect: None,
            sweep: None,
        }
    }

    pub fn pending_effect(&self) -> Option<PendingEffect> {
        self.pending_effect
    }

    pub fn sweep(&self) -> Option<&PositionInterpolator> {
        self.sweep.as_ref()
    }

    pub fn sweep_active(&self) -> bool {
        matches!(
            self.pending_effect,
            Some(PendingEffect {
                kind: EventKind::MoveStep,
                ..
            })
        )
    }

    /// Whether a fired event still belongs to this incarnation of the session.
    pub fn owns(&self, event: &Event) -> bool {
        event.epoch == self.epoch
            && self
                .pending_effect
                .is_some_and(|effect| effect.handle == event.handle && effect.kind == event.kind)
    }
}
