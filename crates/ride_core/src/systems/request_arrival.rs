use bevy_ecs::prelude::{Res, ResMut};
use tracing::debug;

use crate::availability::{generate_request, is_eligible};
use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::config::RideConfig;
use crate::ecs::RideSession;
use crate::telemetry::SessionTelemetry;

use super::claim_effect;

/// The request delay elapsed for an eligible driver: present one request.
/// Nothing is re-armed until the request is declined or the ride ends.
pub fn request_arrival_system(
    event: Res<CurrentEvent>,
    config: Res<RideConfig>,
    clock: Res<SimulationClock>,
    mut session: ResMut<RideSession>,
    mut telemetry: ResMut<SessionTelemetry>,
) {
    if event.0.kind != EventKind::RequestArrival {
        return;
    }
    if !claim_effect(&event.0, &mut session, &mut telemetry) {
        return;
    }
    if !is_eligible(&session) {
        return;
    }

    let request = generate_request(&config, clock.now());
    debug!(at_ms = clock.now(), pickup = ?request.pickup, "incoming request");
    session.pending_request = Some(request);
    telemetry.requests_generated += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    use crate::availability::toggle_online;

    #[test]
    fn request_arrives_for_online_driver() {
        let mut world = World::new();
        let config = RideConfig::default();
        let mut session = RideSession::new(config.passenger_home);
        let mut clock = SimulationClock::default();
        toggle_online(&mut session, &mut clock, &config);
        let event = clock.pop_next().expect("request event");

        world.insert_resource(clock);
        world.insert_resource(session);
        world.insert_resource(config);
        world.insert_resource(SessionTelemetry::default());
        world.insert_resource(CurrentEvent(event));

        let mut schedule = Schedule::default();
        schedule.add_systems(request_arrival_system);
        schedule.run(&mut world);

        let session = world.resource::<RideSession>();
        let request = session.pending_request.as_ref().expect("request");
        assert_eq!(request.generated_at, 3000);
        assert!(session.pending_effect().is_none());
        assert!(world.resource::<SimulationClock>().is_empty());
        assert_eq!(world.resource::<SessionTelemetry>().requests_generated, 1);
    }
}
