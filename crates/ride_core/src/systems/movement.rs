//! Movement system: advances the matched vehicle one interpolation step per
//! `MoveStep` tick.
//!
//! The state machine starts the session's sweep on entering `PickupWay` (toward
//! the passenger) or `InProgress` (toward the destination, carrying the
//! passenger along). A step that lands on the target fires the matching arrival event; any other
//! step re-arms the next tick.

use bevy_ecs::prelude::{Res, ResMut};
use tracing::trace;

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::config::RideConfig;
use crate::ecs::{RideSession, RideStatus, SessionRole};
use crate::lifecycle::RideEvent;
use crate::machine::{arm_effect, RideStateMachine};
use crate::spatial::Step;
use crate::telemetry::SessionTelemetry;

use super::claim_effect;

pub fn movement_system(
    event: Res<CurrentEvent>,
    role: Res<SessionRole>,
    config: Res<RideConfig>,
    mut clock: ResMut<SimulationClock>,
    mut session: ResMut<RideSession>,
    mut telemetry: ResMut<SessionTelemetry>,
) {
    if event.0.kind != EventKind::MoveStep {
        return;
    }
    if !claim_effect(&event.0, &mut session, &mut telemetry) {
        return;
    }

    let arrival = match session.status {
        RideStatus::PickupWay => RideEvent::ArrivedAtPickup,
        RideStatus::InProgress => RideEvent::ArrivedAtDestination,
        _ => return,
    };
    let Some(mut sweep) = session.sweep.take() else {
        return;
    };

    let step = sweep.tick();
    if let Some(driver) = session.driver.as_mut() {
        driver.actor.position = step.position();
    }
    if session.status == RideStatus::InProgress {
        session.passenger_position = step.position();
    }
    telemetry.sweep_ticks += 1;
    trace!(
        status = ?session.status,
        position = ?step.position(),
        tick = sweep.ticks(),
        "sweep tick"
    );

    match step {
        Step::Moved(_) => {
            session.sweep = Some(sweep);
            arm_effect(&mut session, &mut clock, EventKind::MoveStep, config.move_tick_ms);
        }
        Step::Arrived(_) => {
            RideStateMachine::new(role.0, &mut session, &mut clock, &config, &mut telemetry)
                .fire(arrival);
        }
    }
}
