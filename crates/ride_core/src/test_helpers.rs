//! Test helpers for driving sessions into a given status.
//!
//! Helpers only use the public command surface and virtual time, so a session
//! they return is indistinguishable from one a user drove by hand.

use crate::config::RideConfig;
use crate::controller::{DriverSession, PassengerSession, SessionController};
use crate::ecs::RideStatus;
use crate::spatial::Position;

/// Destination used by the standard passenger scenario.
pub const TEST_DESTINATION: Position = Position { x: 80.0, y: 30.0 };

/// Upper bound on virtual time spent waiting for a status.
pub const MAX_WAIT_MS: u64 = 120_000;

/// Advances `session` one tick period at a time until it reaches `status`.
/// Returns `false` if [MAX_WAIT_MS] elapses first.
pub fn advance_until<C: SessionController>(session: &mut C, status: RideStatus) -> bool {
    let step = session.core().config().move_tick_ms.max(1);
    let mut waited = 0;
    while session.snapshot().status != status {
        if waited >= MAX_WAIT_MS {
            return false;
        }
        session.advance_by(step);
        waited += step;
    }
    true
}

/// A passenger session driven to `status` with the default config.
pub fn passenger_at(status: RideStatus) -> PassengerSession {
    passenger_at_with(RideConfig::default(), status)
}

/// Drives a fresh passenger session through the happy path until it reaches
/// `status`.
///
/// # Panics
///
/// Panics if the happy path never reaches `status`.
pub fn passenger_at_with(config: RideConfig, status: RideStatus) -> PassengerSession {
    let mut passenger = PassengerSession::with_config(config);
    for next in RideStatus::ALL {
        if passenger.snapshot().status == status {
            break;
        }
        match next {
            RideStatus::Idle => {
                passenger.choose_destination(TEST_DESTINATION);
            }
            RideStatus::Searching => {
                passenger.confirm_ride("eco");
            }
            RideStatus::Matched | RideStatus::PickupWay | RideStatus::ArrivedPickup => {
                assert!(advance_until(&mut passenger, next), "never reached {next:?}");
            }
            RideStatus::InProgress => {
                passenger.confirm_boarding();
            }
            RideStatus::Completed => {
                assert!(advance_until(&mut passenger, next), "never reached {next:?}");
            }
            RideStatus::Rated => {
                passenger.submit_rating(5);
            }
        }
    }
    assert_eq!(passenger.snapshot().status, status);
    passenger
}

/// An online driver session driven to `status` with the default config.
///
/// # Panics
///
/// Panics if the driver flow never reaches `status`. `Searching`, `Matched`
/// and `Rated` are not part of the driver flow.
pub fn driver_at(status: RideStatus) -> DriverSession {
    let mut driver = DriverSession::new();
    driver.toggle_online();
    let steps = [
        RideStatus::PickupWay,
        RideStatus::ArrivedPickup,
        RideStatus::InProgress,
        RideStatus::Completed,
    ];
    for next in steps {
        if driver.snapshot().status == status {
            break;
        }
        match next {
            RideStatus::PickupWay => {
                let delay = driver.core().config().request_arrival_ms;
                driver.advance_by(delay);
                driver.accept_request();
            }
            RideStatus::ArrivedPickup => {
                driver.arrived();
            }
            RideStatus::InProgress => {
                driver.start_trip();
            }
            _ => {
                driver.complete_trip();
            }
        }
    }
    assert_eq!(driver.snapshot().status, status);
    driver
}
