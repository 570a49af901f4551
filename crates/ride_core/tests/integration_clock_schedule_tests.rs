mod support;

use bevy_ecs::prelude::World;
use ride_core::clock::{EventKind, SimulationClock};
use ride_core::config::RideConfig;
use ride_core::dispatch::DispatchResource;
use ride_core::ecs::{RideSession, RideStatus, Role, SessionRole};
use ride_core::lifecycle::RideEvent;
use ride_core::machine::with_machine;
use ride_core::pricing::RideOptionId;
use ride_core::runner::{run_next_event, run_until, simulation_schedule};
use ride_core::telemetry::SessionTelemetry;
use ride_core::test_helpers::TEST_DESTINATION;

fn session_world(role: Role) -> World {
    let config = RideConfig::default();
    let mut world = World::new();
    world.insert_resource(SimulationClock::default());
    world.insert_resource(RideSession::new(config.passenger_home));
    world.insert_resource(config);
    world.insert_resource(SessionRole(role));
    world.insert_resource(SessionTelemetry::default());
    world.insert_resource(DispatchResource::default());
    world
}

fn searching_world() -> World {
    let mut world = session_world(Role::Passenger);
    with_machine(&mut world, |machine| {
        machine.fire(RideEvent::ChooseDestination(TEST_DESTINATION));
        machine.fire(RideEvent::ConfirmRide(RideOptionId::Eco));
    });
    world
}

#[test]
fn timer_from_previous_epoch_is_dropped() {
    let mut world = searching_world();
    let mut schedule = simulation_schedule();

    // A match timer that outlived its session, e.g. one raced past a reset.
    world
        .resource_mut::<SimulationClock>()
        .schedule_in(100, EventKind::MatchFound, 41);
    assert!(run_next_event(&mut world, &mut schedule));

    assert_eq!(world.resource::<RideSession>().status, RideStatus::Searching);
    assert_eq!(world.resource::<SessionTelemetry>().stale_events_dropped, 1);

    run_until(&mut world, &mut schedule, 2500);
    assert_eq!(world.resource::<RideSession>().status, RideStatus::Matched);
}

#[test]
fn superseded_timer_in_current_epoch_is_dropped() {
    let mut world = searching_world();
    let mut schedule = simulation_schedule();

    let epoch = world.resource::<RideSession>().epoch;
    world
        .resource_mut::<SimulationClock>()
        .schedule_in(10, EventKind::DispatchDeparted, epoch);
    run_until(&mut world, &mut schedule, 100);

    assert_eq!(world.resource::<RideSession>().status, RideStatus::Searching);
    assert_eq!(world.resource::<SessionTelemetry>().stale_events_dropped, 1);
    assert!(world.resource::<RideSession>().pending_effect().is_some());
}

#[test]
fn reset_cancels_pending_timers_in_one_step() {
    let mut world = searching_world();
    let mut schedule = simulation_schedule();
    with_machine(&mut world, |machine| machine.teardown());

    assert!(world.resource::<SimulationClock>().is_empty());
    assert_eq!(run_until(&mut world, &mut schedule, 60_000), 0);
    assert_eq!(world.resource::<SessionTelemetry>().stale_events_dropped, 0);
    assert_eq!(world.resource::<RideSession>().status, RideStatus::Idle);
}

#[test]
fn driver_world_only_schedules_request_arrival() {
    let mut world = session_world(Role::Driver);
    let mut schedule = simulation_schedule();
    with_machine(&mut world, |machine| machine.toggle_online());

    let effect = world
        .resource::<RideSession>()
        .pending_effect()
        .expect("request timer");
    assert_eq!(effect.kind, EventKind::RequestArrival);
    assert_eq!(run_until(&mut world, &mut schedule, 3000), 1);
    assert!(world.resource::<RideSession>().pending_request.is_some());
    assert!(world.resource_mut::<SimulationClock>().next_event_time().is_none());
}
