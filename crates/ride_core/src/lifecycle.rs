//! Ride transition graph for both roles.
//!
//! The graph is pure data: which event moves which status where. Guards that
//! depend on session contents (a destination must be chosen, a request must be
//! pending, ...) and the side effects of entering a state live in
//! [crate::machine].

use crate::ecs::{Driver, RideStatus, Role};
use crate::pricing::RideOptionId;
use crate::spatial::Position;

/// Events the state machine understands, with their payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum RideEvent {
    ChooseDestination(Position),
    /// Back out of the route preview.
    ClearDestination,
    ConfirmRide(RideOptionId),
    CancelSearch,
    MatchFound(Driver),
    DispatchDeparted,
    AcceptRequest,
    ArrivedAtPickup,
    /// Passenger confirms boarding, or the driver starts the trip.
    StartTrip,
    /// Simulated drop-off arrival, or the driver completing the trip.
    ArrivedAtDestination,
    Rate(u8),
    Reset,
}

/// Payload-free discriminant of [RideEvent], used as the graph's edge label.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RideEventKind {
    ChooseDestination,
    ClearDestination,
    ConfirmRide,
    CancelSearch,
    MatchFound,
    DispatchDeparted,
    AcceptRequest,
    ArrivedAtPickup,
    StartTrip,
    ArrivedAtDestination,
    Rate,
    Reset,
}

impl RideEvent {
    pub fn kind(&self) -> RideEventKind {
        match self {
            RideEvent::ChooseDestination(_) => RideEventKind::ChooseDestination,
            RideEvent::ClearDestination => RideEventKind::ClearDestination,
            RideEvent::ConfirmRide(_) => RideEventKind::ConfirmRide,
            RideEvent::CancelSearch => RideEventKind::CancelSearch,
            RideEvent::MatchFound(_) => RideEventKind::MatchFound,
            RideEvent::DispatchDeparted => RideEventKind::DispatchDeparted,
            RideEvent::AcceptRequest => RideEventKind::AcceptRequest,
            RideEvent::ArrivedAtPickup => RideEventKind::ArrivedAtPickup,
            RideEvent::StartTrip => RideEventKind::StartTrip,
            RideEvent::ArrivedAtDestination => RideEventKind::ArrivedAtDestination,
            RideEvent::Rate(_) => RideEventKind::Rate,
            RideEvent::Reset => RideEventKind::Reset,
        }
    }
}

/// Directed transition edge.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TransitionEdge {
    pub start: RideStatus,
    pub event: RideEventKind,
    pub goal: RideStatus,
}

const fn edge(start: RideStatus, event: RideEventKind, goal: RideStatus) -> TransitionEdge {
    TransitionEdge { start, event, goal }
}

const PASSENGER_EDGES: [TransitionEdge; 12] = [
    edge(RideStatus::Idle, RideEventKind::ChooseDestination, RideStatus::Idle),
    edge(RideStatus::Idle, RideEventKind::ClearDestination, RideStatus::Idle),
    edge(RideStatus::Idle, RideEventKind::ConfirmRide, RideStatus::Searching),
    edge(RideStatus::Searching, RideEventKind::MatchFound, RideStatus::Matched),
    edge(RideStatus::Searching, RideEventKind::CancelSearch, RideStatus::Idle),
    edge(RideStatus::Matched, RideEventKind::DispatchDeparted, RideStatus::PickupWay),
    edge(RideStatus::PickupWay, RideEventKind::ArrivedAtPickup, RideStatus::ArrivedPickup),
    edge(RideStatus::ArrivedPickup, RideEventKind::StartTrip, RideStatus::InProgress),
    edge(RideStatus::InProgress, RideEventKind::ArrivedAtDestination, RideStatus::Completed),
    edge(RideStatus::Completed, RideEventKind::Rate, RideStatus::Rated),
    edge(RideStatus::Completed, RideEventKind::Reset, RideStatus::Idle),
    edge(RideStatus::Rated, RideEventKind::Reset, RideStatus::Idle),
];

const DRIVER_EDGES: [TransitionEdge; 5] = [
    edge(RideStatus::Idle, RideEventKind::AcceptRequest, RideStatus::PickupWay),
    edge(RideStatus::PickupWay, RideEventKind::ArrivedAtPickup, RideStatus::ArrivedPickup),
    edge(RideStatus::ArrivedPickup, RideEventKind::StartTrip, RideStatus::InProgress),
    edge(RideStatus::InProgress, RideEventKind::ArrivedAtDestination, RideStatus::Completed),
    edge(RideStatus::Completed, RideEventKind::Reset, RideStatus::Idle),
];

/// All legal edges for `role`.
pub fn transition_graph(role: Role) -> &'static [TransitionEdge] {
    match role {
        Role::Passenger => &PASSENGER_EDGES,
        Role::Driver => &DRIVER_EDGES,
    }
}

/// Where `event` leads from `start`, or `None` when the graph has no such edge.
pub fn goal_status(role: Role, start: RideStatus, event: RideEventKind) -> Option<RideStatus> {
    transition_graph(role)
        .iter()
        .find(|edge| edge.start == start && edge.event == event)
        .map(|edge| edge.goal)
}

/// Events accepted from `start`.
pub fn available_events(role: Role, start: RideStatus) -> Vec<RideEventKind> {
    transition_graph(role)
        .iter()
        .filter(|edge| edge.start == start)
        .map(|edge| edge.event)
        .collect()
}

/// Statuses a role can ever be in.
pub fn reachable_statuses(role: Role) -> Vec<RideStatus> {
    RideStatus::ALL
        .into_iter()
        .filter(|status| {
            *status == RideStatus::Idle
                || transition_graph(role).iter().any(|edge| edge.goal == *status)
        })
        .collect()
}
