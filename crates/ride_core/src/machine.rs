//! The ride state machine: guards, payload application and entry/exit effects.
//!
//! Every status change goes through [RideStateMachine::fire]. A change is
//! applied only when the transition graph has an edge for the current status
//! and the event's preconditions hold; anything else is a silent no-op.
//!
//! A session owns at most one scheduled effect. Leaving a status cancels the
//! effect that status scheduled, and entering a status schedules its own.

use bevy_ecs::prelude::{Mut, World};
use tracing::{debug, trace};

use crate::availability;
use crate::clock::{EventKind, SimulationClock};
use crate::config::RideConfig;
use crate::ecs::{PendingEffect, RideSession, RideStatus, Role, SessionRole};
use crate::lifecycle::{goal_status, RideEvent};
use crate::pricing::{driver_payout, passenger_quote};
use crate::spatial::{ApproachProfile, Position, PositionInterpolator};
use crate::telemetry::{SessionTelemetry, TransitionRecord};

pub struct RideStateMachine<'a> {
    role: Role,
    session: &'a mut RideSession,
    clock: &'a mut SimulationClock,
    config: &'a RideConfig,
    telemetry: &'a mut SessionTelemetry,
}

impl<'a> RideStateMachine<'a> {
    pub fn new(
        role: Role,
        session: &'a mut RideSession,
        clock: &'a mut SimulationClock,
        config: &'a RideConfig,
        telemetry: &'a mut SessionTelemetry,
    ) -> Self {
        Self {
            role,
            session,
            clock,
            config,
            telemetry,
        }
    }

    pub fn status(&self) -> RideStatus {
        self.session.status
    }

    /// Applies `event` if it is legal right now. Returns whether anything changed.
    pub fn fire(&mut self, event: RideEvent) -> bool {
        let from = self.session.status;
        let Some(goal) = goal_status(self.role, from, event.kind()) else {
            trace!(role = ?self.role, status = ?from, event = ?event.kind(), "transition rejected");
            self.telemetry.rejected_commands += 1;
            return false;
        };
        if !self.precondition_holds(&event) {
            trace!(role = ?self.role, status = ?from, event = ?event.kind(), "precondition failed");
            self.telemetry.rejected_commands += 1;
            return false;
        }

        if goal == from {
            // Self-loop: only the payload changes, effects stay untouched.
            self.apply_payload(event);
            return true;
        }

        self.exit(from);
        self.apply_payload(event);
        self.session.status = goal;
        self.telemetry.record_transition(TransitionRecord {
            at_ms: self.clock.now(),
            epoch: self.session.epoch,
            from,
            to: goal,
        });
        debug!(role = ?self.role, ?from, to = ?goal, at_ms = self.clock.now(), "ride transition");
        self.enter(goal);
        true
    }

    /// Tears the session down to a fresh, offline `Idle` regardless of status
    /// and cancels every outstanding timer in one step.
    pub fn teardown(&mut self) {
        let cancelled = self.clock.cancel_all();
        let previous = self.session.status;
        let next_epoch = self.session.epoch + 1;
        *self.session = RideSession::new(self.config.passenger_home);
        self.session.epoch = next_epoch;
        if previous != RideStatus::Idle {
            self.telemetry.record_transition(TransitionRecord {
                at_ms: self.clock.now(),
                epoch: next_epoch,
                from: previous,
                to: RideStatus::Idle,
            });
        }
        debug!(role = ?self.role, epoch = next_epoch, cancelled, "session torn down");
    }

    /// Flips the driver's online flag. Always changes something.
    pub fn toggle_online(&mut self) -> bool {
        if self.role != Role::Driver {
            self.telemetry.rejected_commands += 1;
            return false;
        }
        availability::toggle_online(&mut *self.session, &mut *self.clock, self.config);
        true
    }

    /// Drops the pending request; the availability model re-arms.
    pub fn decline_request(&mut self) -> bool {
        if self.role != Role::Driver
            || !availability::decline(&mut *self.session, &mut *self.clock, self.config)
        {
            self.telemetry.rejected_commands += 1;
            return false;
        }
        true
    }

    fn precondition_holds(&self, event: &RideEvent) -> bool {
        match event {
            RideEvent::ConfirmRide(_) | RideEvent::ClearDestination => {
                self.session.destination.is_some()
            }
            RideEvent::Rate(stars) => (1..=5).contains(stars),
            RideEvent::AcceptRequest => self.session.pending_request.is_some(),
            _ => true,
        }
    }

    fn apply_payload(&mut self, event: RideEvent) {
        match event {
            RideEvent::ChooseDestination(position) => {
                self.session.destination = Some(position);
            }
            RideEvent::ClearDestination => {
                self.session.destination = None;
            }
            RideEvent::ConfirmRide(option) => {
                self.session.ride_option = Some(option);
                self.session.fare = passenger_quote(option);
            }
            RideEvent::CancelSearch => {
                self.session.driver = None;
            }
            RideEvent::MatchFound(driver) => {
                self.session.driver = Some(driver);
            }
            RideEvent::AcceptRequest => {
                if let Some(request) = self.session.pending_request.take() {
                    self.session.passenger_position = request.pickup;
                }
                self.session.destination = Some(self.config.driver_dropoff);
                self.session.driver = Some(availability::self_as_driver(self.config));
                self.session.fare = driver_payout();
            }
            RideEvent::Rate(stars) => {
                self.session.rating = Some(stars);
            }
            RideEvent::Reset => {
                self.clock.cancel_all();
                let online = self.session.online;
                let epoch = self.session.epoch + 1;
                *self.session = RideSession::new(self.config.passenger_home);
                self.session.epoch = epoch;
                self.session.online = online;
            }
            RideEvent::DispatchDeparted
            | RideEvent::ArrivedAtPickup
            | RideEvent::StartTrip
            | RideEvent::ArrivedAtDestination => {}
        }
    }

    fn exit(&mut self, from: RideStatus) {
        self.session.sweep = None;
        if let Some(effect) = self.session.pending_effect.take() {
            self.clock.cancel(effect.handle);
            trace!(status = ?from, kind = ?effect.kind, "cancelled effect on exit");
        }
    }

    fn enter(&mut self, status: RideStatus) {
        match (self.role, status) {
            (Role::Passenger, RideStatus::Searching) => {
                self.arm(EventKind::MatchFound, self.config.match_delay_ms);
            }
            (Role::Passenger, RideStatus::Matched) => {
                self.arm(EventKind::DispatchDeparted, self.config.matched_advance_ms);
            }
            (Role::Passenger, RideStatus::PickupWay) => {
                let pickup = self.session.passenger_position;
                self.start_sweep(pickup, self.config.pickup_approach);
            }
            (Role::Passenger, RideStatus::InProgress) => {
                if let Some(destination) = self.session.destination {
                    self.start_sweep(destination, self.config.dropoff_approach);
                }
            }
            (Role::Driver, RideStatus::Idle) => {
                availability::sync(&mut *self.session, &mut *self.clock, self.config);
            }
            _ => {}
        }
    }

    /// Sends the matched vehicle toward `target`. No driver, no sweep.
    fn start_sweep(&mut self, target: Position, profile: ApproachProfile) {
        let Some(driver) = self.session.driver.as_ref() else {
            return;
        };
        let sweep = PositionInterpolator::new(driver.position(), target, profile);
        self.session.sweep = Some(sweep);
        self.arm(EventKind::MoveStep, self.config.move_tick_ms);
    }

    fn arm(&mut self, kind: EventKind, delay_ms: u64) {
        arm_effect(&mut *self.session, &mut *self.clock, kind, delay_ms);
    }
}

/// Runs `f` with a state machine borrowing the session resources of `world`.
pub fn with_machine<R>(world: &mut World, f: impl FnOnce(&mut RideStateMachine<'_>) -> R) -> R {
    let role = world.resource::<SessionRole>().0;
    let config = *world.resource::<RideConfig>();
    world.resource_scope(|world, mut session: Mut<RideSession>| {
        world.resource_scope(|world, mut clock: Mut<SimulationClock>| {
            let mut telemetry = world.resource_mut::<SessionTelemetry>();
            let mut machine =
                RideStateMachine::new(role, &mut session, &mut clock, &config, &mut telemetry);
            f(&mut machine)
        })
    })
}

/// Schedules `kind` as the session's single pending effect, replacing
/// (and cancelling) whatever was armed before.
pub(crate) fn arm_effect(
    session: &mut RideSession,
    clock: &mut SimulationClock,
    kind: EventKind,
    delay_ms: u64,
) {
    if let Some(previous) = session.pending_effect.take() {
        clock.cancel(previous.handle);
    }
    let handle = clock.schedule_in(delay_ms, kind, session.epoch);
    session.pending_effect = Some(PendingEffect { kind, handle });
    debug!(?kind, due_at = clock.now() + delay_ms, "effect armed");
}
