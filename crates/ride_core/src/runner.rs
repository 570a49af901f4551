//! Simulation runner: advances the clock and routes events into the ECS.
//!
//! Clock progression and event routing happen here, outside systems. Each step
//! pops the next live event from [SimulationClock], inserts it as
//! [CurrentEvent], then runs the schedule.

use bevy_ecs::prelude::Res;
use bevy_ecs::prelude::{Schedule, World};
use bevy_ecs::schedule::IntoSystemConfigs;

use crate::clock::{CurrentEvent, Event, EventKind, SimulationClock};
use crate::systems::{
    dispatch_departed::dispatch_departed_system, match_found::match_found_system,
    movement::movement_system, request_arrival::request_arrival_system,
};

fn is_request_arrival(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::RequestArrival)
        .unwrap_or(false)
}

fn is_match_found(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::MatchFound)
        .unwrap_or(false)
}

fn is_dispatch_departed(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::DispatchDeparted)
        .unwrap_or(false)
}

fn is_move_step(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::MoveStep)
        .unwrap_or(false)
}

/// Runs one simulation step: pops the next event, inserts it as [CurrentEvent], then runs the
/// schedule. Returns `false` if no live event was queued.
pub fn run_next_event(world: &mut World, schedule: &mut Schedule) -> bool {
    let event = match world.resource_mut::<SimulationClock>().pop_next() {
        Some(e) => e,
        None => return false,
    };
    world.insert_resource(CurrentEvent(event));
    schedule.run(world);
    true
}

/// Like [run_next_event], but invokes `hook` after the schedule completes.
pub fn run_next_event_with_hook<F>(world: &mut World, schedule: &mut Schedule, mut hook: F) -> bool
where
    F: FnMut(&World, &Event),
{
    let event = match world.resource_mut::<SimulationClock>().pop_next() {
        Some(e) => e,
        None => return false,
    };
    world.insert_resource(CurrentEvent(event));
    schedule.run(world);
    hook(world, &event);
    true
}

/// Fires every event due at or before `deadline_ms`, in timestamp order, then
/// moves the clock to `deadline_ms`. Events scheduled by handlers are fired in
/// the same call when they fall inside the window.
///
/// Returns the number of events processed.
pub fn run_until(world: &mut World, schedule: &mut Schedule, deadline_ms: u64) -> usize {
    run_until_with_hook(world, schedule, deadline_ms, |_, _| {})
}

/// [run_until] with a `hook` invoked after each processed event.
pub fn run_until_with_hook<F>(
    world: &mut World,
    schedule: &mut Schedule,
    deadline_ms: u64,
    mut hook: F,
) -> usize
where
    F: FnMut(&World, &Event),
{
    let mut steps = 0;
    loop {
        let due = world
            .resource_mut::<SimulationClock>()
            .next_event_time()
            .is_some_and(|ts| ts <= deadline_ms);
        if !due || !run_next_event_with_hook(world, schedule, &mut hook) {
            break;
        }
        steps += 1;
    }
    world
        .resource_mut::<SimulationClock>()
        .advance_to(deadline_ms);
    steps
}

/// Runs simulation steps until the event queue is empty or `max_steps` is reached.
/// Returns the number of steps executed.
pub fn run_until_empty(world: &mut World, schedule: &mut Schedule, max_steps: usize) -> usize {
    let mut steps = 0;
    while steps < max_steps && run_next_event(world, schedule) {
        steps += 1;
    }
    steps
}

/// Builds the session schedule. Each system runs only for its own event kind.
pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();

    schedule.add_systems((
        // RequestArrival
        request_arrival_system.run_if(is_request_arrival),
        // MatchFound
        match_found_system.run_if(is_match_found),
        // DispatchDeparted
        dispatch_departed_system.run_if(is_dispatch_departed),
        // MoveStep
        movement_system.run_if(is_move_step),
    ));

    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RideConfig;
    use crate::dispatch::DispatchResource;
    use crate::ecs::{RideSession, RideStatus, Role, SessionRole};
    use crate::lifecycle::RideEvent;
    use crate::machine::with_machine;
    use crate::pricing::RideOptionId;
    use crate::spatial::Position;
    use crate::telemetry::SessionTelemetry;

    fn passenger_world() -> World {
        let config = RideConfig::default();
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        world.insert_resource(RideSession::new(config.passenger_home));
        world.insert_resource(config);
        world.insert_resource(SessionRole(Role::Passenger));
        world.insert_resource(SessionTelemetry::default());
        world.insert_resource(DispatchResource::default());
        world
    }

    fn confirm_eco(world: &mut World) {
        with_machine(world, |machine| {
            machine.fire(RideEvent::ChooseDestination(Position::new(80.0, 30.0)));
            machine.fire(RideEvent::ConfirmRide(RideOptionId::Eco));
        });
    }

    #[test]
    fn run_until_stops_at_deadline() {
        let mut world = passenger_world();
        let mut schedule = simulation_schedule();
        confirm_eco(&mut world);

        assert_eq!(run_until(&mut world, &mut schedule, 2499), 0);
        assert_eq!(world.resource::<RideSession>().status, RideStatus::Searching);
        assert_eq!(world.resource::<SimulationClock>().now(), 2499);

        assert_eq!(run_until(&mut world, &mut schedule, 2500), 1);
        assert_eq!(world.resource::<RideSession>().status, RideStatus::Matched);
        assert_eq!(world.resource::<SimulationClock>().now(), 2500);
    }

    #[test]
    fn run_until_fires_chained_events_inside_window() {
        let mut world = passenger_world();
        let mut schedule = simulation_schedule();
        confirm_eco(&mut world);

        let mut kinds = Vec::new();
        run_until_with_hook(&mut world, &mut schedule, 4000, |_, event| kinds.push(event.kind));

        assert_eq!(
            kinds,
            vec![EventKind::MatchFound, EventKind::DispatchDeparted, EventKind::MoveStep]
        );
        assert_eq!(world.resource::<RideSession>().status, RideStatus::PickupWay);
    }

    #[test]
    fn run_until_empty_drives_to_pickup() {
        let mut world = passenger_world();
        let mut schedule = simulation_schedule();
        confirm_eco(&mut world);

        let steps = run_until_empty(&mut world, &mut schedule, 500);
        assert!(steps > 2 && steps < 500);
        assert_eq!(world.resource::<RideSession>().status, RideStatus::ArrivedPickup);
        assert!(world.resource::<SimulationClock>().is_empty());
    }
}
