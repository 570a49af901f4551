use bevy_ecs::prelude::{Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::config::RideConfig;
use crate::dispatch::DispatchResource;
use crate::ecs::{RideSession, RideStatus, SessionRole};
use crate::lifecycle::RideEvent;
use crate::machine::RideStateMachine;
use crate::telemetry::SessionTelemetry;

use super::claim_effect;

/// The matching delay elapsed: ask dispatch for a driver and move to `Matched`.
#[allow(clippy::too_many_arguments)]
pub fn match_found_system(
    event: Res<CurrentEvent>,
    role: Res<SessionRole>,
    config: Res<RideConfig>,
    mut clock: ResMut<SimulationClock>,
    mut session: ResMut<RideSession>,
    mut telemetry: ResMut<SessionTelemetry>,
    mut dispatch: ResMut<DispatchResource>,
) {
    if event.0.kind != EventKind::MatchFound {
        return;
    }
    if !claim_effect(&event.0, &mut session, &mut telemetry) {
        return;
    }
    if session.status != RideStatus::Searching {
        return;
    }

    let driver = dispatch.request_match(session.passenger_position);
    RideStateMachine::new(role.0, &mut session, &mut clock, &config, &mut telemetry)
        .fire(RideEvent::MatchFound(driver));
}
