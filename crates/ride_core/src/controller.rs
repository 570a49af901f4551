//! Role controllers: the command surface the presentation layer talks to.
//!
//! Each controller owns its own [World] and [Schedule]. Commands go through
//! the state machine and return whether they changed anything; time only moves
//! through [SessionController::advance_by].

use bevy_ecs::prelude::{Schedule, World};
use tracing::debug;

use crate::clock::SimulationClock;
use crate::config::{popular_location, RideConfig};
use crate::dispatch::{DispatchResource, DispatchSimulator, SeededDispatch};
use crate::ecs::{RideSession, Role, SessionRole};
use crate::lifecycle::RideEvent;
use crate::machine::{with_machine, RideStateMachine};
use crate::pricing::RideOptionId;
use crate::runner::{run_until, simulation_schedule};
use crate::spatial::Position;
use crate::telemetry::{SessionSnapshot, SessionTelemetry};

/// World and schedule behind one role's session.
pub struct SessionCore {
    world: World,
    schedule: Schedule,
}

impl SessionCore {
    pub fn new(role: Role, config: RideConfig, dispatch: DispatchResource) -> Self {
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        world.insert_resource(RideSession::new(config.passenger_home));
        world.insert_resource(config);
        world.insert_resource(SessionRole(role));
        world.insert_resource(SessionTelemetry::default());
        world.insert_resource(dispatch);
        Self {
            world,
            schedule: simulation_schedule(),
        }
    }

    pub fn role(&self) -> Role {
        self.world.resource::<SessionRole>().0
    }

    pub fn now(&self) -> u64 {
        self.world.resource::<SimulationClock>().now()
    }

    pub fn config(&self) -> &RideConfig {
        self.world.resource::<RideConfig>()
    }

    pub fn telemetry(&self) -> &SessionTelemetry {
        self.world.resource::<SessionTelemetry>()
    }

    pub fn session(&self) -> &RideSession {
        self.world.resource::<RideSession>()
    }

    /// Read-only access for tests and diagnostics.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(self.role(), self.now(), self.session())
    }

    /// Moves virtual time forward by `ms`, firing every timer that falls due.
    /// Returns the number of timers fired.
    pub fn advance_by(&mut self, ms: u64) -> usize {
        let deadline = self.now().saturating_add(ms);
        let fired = run_until(&mut self.world, &mut self.schedule, deadline);
        if fired > 0 {
            debug!(role = ?self.role(), fired, now_ms = deadline, "advanced");
        }
        fired
    }

    pub fn fire(&mut self, event: RideEvent) -> bool {
        with_machine(&mut self.world, |machine| machine.fire(event))
    }

    pub fn with_machine<R>(&mut self, f: impl FnOnce(&mut RideStateMachine<'_>) -> R) -> R {
        with_machine(&mut self.world, f)
    }

    /// Counts a command that never reached the state machine.
    pub fn reject(&mut self) -> bool {
        self.world.resource_mut::<SessionTelemetry>().rejected_commands += 1;
        false
    }

    pub fn teardown(&mut self) {
        with_machine(&mut self.world, |machine| machine.teardown());
    }
}

/// Commands shared by both roles.
pub trait SessionController {
    fn core(&self) -> &SessionCore;
    fn core_mut(&mut self) -> &mut SessionCore;

    fn role(&self) -> Role {
        self.core().role()
    }

    fn now(&self) -> u64 {
        self.core().now()
    }

    fn snapshot(&self) -> SessionSnapshot {
        self.core().snapshot()
    }

    fn telemetry(&self) -> &SessionTelemetry {
        self.core().telemetry()
    }

    /// Returns whether any timer fired.
    fn advance_by(&mut self, ms: u64) -> bool {
        self.core_mut().advance_by(ms) > 0
    }

    /// Back to `Idle` once the ride is over.
    fn reset(&mut self) -> bool {
        self.core_mut().fire(RideEvent::Reset)
    }

    /// Tears the session down from any status and cancels every timer.
    fn logout(&mut self) -> bool {
        self.core_mut().teardown();
        true
    }
}

pub struct PassengerSession {
    core: SessionCore,
}

impl PassengerSession {
    pub fn new() -> Self {
        Self::with_config(RideConfig::default())
    }

    /// `config` is used as given; load it through [RideConfig::load] or
    /// [RideConfig::from_json_str] to have it validated.
    pub fn with_config(config: RideConfig) -> Self {
        Self::with_dispatch(config, DispatchResource::default())
    }

    /// Uses a [SeededDispatch] seeded from the config.
    pub fn seeded(config: RideConfig) -> Self {
        let dispatch = SeededDispatch::new(config.dispatch_seed);
        Self::with_dispatch(config, DispatchResource::new(Box::new(dispatch)))
    }

    pub fn with_dispatch(config: RideConfig, dispatch: DispatchResource) -> Self {
        Self {
            core: SessionCore::new(Role::Passenger, config, dispatch),
        }
    }

    pub fn with_simulator(config: RideConfig, dispatch: impl DispatchSimulator + 'static) -> Self {
        Self::with_dispatch(config, DispatchResource::new(Box::new(dispatch)))
    }

    pub fn choose_destination(&mut self, destination: Position) -> bool {
        self.core.fire(RideEvent::ChooseDestination(destination))
    }

    /// Picks one of [crate::config::POPULAR_LOCATIONS] by name. Unknown names
    /// are ignored.
    pub fn choose_place(&mut self, name: &str) -> bool {
        match popular_location(name) {
            Some(place) => self.choose_destination(place.position),
            None => self.core.reject(),
        }
    }

    /// Leaves the route preview; the ride can no longer be confirmed.
    pub fn clear_destination(&mut self) -> bool {
        self.core.fire(RideEvent::ClearDestination)
    }

    /// Confirms the ride with a ride option id (`eco`, `plus`, `xl`). Unknown
    /// ids are ignored.
    pub fn confirm_ride(&mut self, option_id: &str) -> bool {
        match RideOptionId::parse(option_id) {
            Some(option) => self.core.fire(RideEvent::ConfirmRide(option)),
            None => self.core.reject(),
        }
    }

    pub fn cancel_search(&mut self) -> bool {
        self.core.fire(RideEvent::CancelSearch)
    }

    pub fn confirm_boarding(&mut self) -> bool {
        self.core.fire(RideEvent::StartTrip)
    }

    pub fn submit_rating(&mut self, stars: u8) -> bool {
        self.core.fire(RideEvent::Rate(stars))
    }
}

impl Default for PassengerSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController for PassengerSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }
}

pub struct DriverSession {
    core: SessionCore,
}

impl DriverSession {
    pub fn new() -> Self {
        Self::with_config(RideConfig::default())
    }

    /// Trusts `config` like [PassengerSession::with_config].
    pub fn with_config(config: RideConfig) -> Self {
        Self {
            core: SessionCore::new(Role::Driver, config, DispatchResource::default()),
        }
    }

    pub fn toggle_online(&mut self) -> bool {
        self.core.with_machine(|machine| machine.toggle_online())
    }

    pub fn accept_request(&mut self) -> bool {
        self.core.fire(RideEvent::AcceptRequest)
    }

    pub fn decline_request(&mut self) -> bool {
        self.core.with_machine(|machine| machine.decline_request())
    }

    pub fn arrived(&mut self) -> bool {
        self.core.fire(RideEvent::ArrivedAtPickup)
    }

    pub fn start_trip(&mut self) -> bool {
        self.core.fire(RideEvent::StartTrip)
    }

    pub fn complete_trip(&mut self) -> bool {
        self.core.fire(RideEvent::ArrivedAtDestination)
    }
}

impl Default for DriverSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController for DriverSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }
}
