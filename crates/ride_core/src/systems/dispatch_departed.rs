use bevy_ecs::prelude::{Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::config::RideConfig;
use crate::ecs::{RideSession, SessionRole};
use crate::lifecycle::RideEvent;
use crate::machine::RideStateMachine;
use crate::telemetry::SessionTelemetry;

use super::claim_effect;

pub fn dispatch_departed_system(
    event: Res<CurrentEvent>,
    role: Res<SessionRole>,
    config: Res<RideConfig>,
    mut clock: ResMut<SimulationClock>,
    mut session: ResMut<RideSession>,
    mut telemetry: ResMut<SessionTelemetry>,
) {
    if event.0.kind != EventKind::DispatchDeparted {
        return;
    }
    if !claim_effect(&event.0, &mut session, &mut telemetry) {
        return;
    }

    RideStateMachine::new(role.0, &mut session, &mut clock, &config, &mut telemetry)
        .fire(RideEvent::DispatchDeparted);
}
