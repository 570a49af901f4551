//! Driver availability: decides when an online driver gets a simulated
//! request.
//!
//! A driver is eligible while online, idle and not already looking at a
//! request. While eligible exactly one request-arrival timer is armed; when
//! eligibility is lost the timer is cancelled.

use tracing::debug;

use crate::clock::{EventKind, SimulationClock};
use crate::config::RideConfig;
use crate::ecs::{Actor, Driver, IncomingRequest, Rating, RideSession, RideStatus, Vehicle};
use crate::machine::arm_effect;
use crate::pricing::{DRIVER_FARE, DRIVER_SURGE_BONUS, DRIVER_TIP};

pub const REQUEST_DISTANCE_MI: f64 = 4.2;
pub const REQUEST_DURATION_MIN: u32 = 12;
pub const REQUEST_PICKUP_LABEL: &str = "Central Mall";

pub fn is_eligible(session: &RideSession) -> bool {
    session.online && session.status == RideStatus::Idle && session.pending_request.is_none()
}

/// Brings the armed request timer in line with the current eligibility.
/// Only touches the session's effect slot while the session is idle, since
/// every other status owns its own effect.
pub fn sync(session: &mut RideSession, clock: &mut SimulationClock, config: &RideConfig) {
    if session.status != RideStatus::Idle {
        return;
    }
    let armed = session
        .pending_effect
        .is_some_and(|effect| effect.kind == EventKind::RequestArrival);
    if is_eligible(session) {
        if !armed {
            arm_effect(session, clock, EventKind::RequestArrival, config.request_arrival_ms);
        }
    } else if let Some(effect) = session.pending_effect.take() {
        clock.cancel(effect.handle);
        debug!(kind = ?effect.kind, "request timer disarmed");
    }
}

/// Flips the online flag. Going offline withdraws any pending request.
pub fn toggle_online(session: &mut RideSession, clock: &mut SimulationClock, config: &RideConfig) {
    session.online = !session.online;
    if !session.online {
        session.pending_request = None;
    }
    debug!(online = session.online, "driver availability toggled");
    sync(session, clock, config);
}

/// Drops the pending request and re-arms. Returns `false` if there was none.
pub fn decline(session: &mut RideSession, clock: &mut SimulationClock, config: &RideConfig) -> bool {
    if session.pending_request.take().is_none() {
        return false;
    }
    debug!("request declined");
    sync(session, clock, config);
    true
}

/// The offer shown to the driver when the request timer fires.
pub fn generate_request(config: &RideConfig, now_ms: u64) -> IncomingRequest {
    IncomingRequest {
        distance_mi: REQUEST_DISTANCE_MI,
        duration_min: REQUEST_DURATION_MIN,
        fare_quote: DRIVER_FARE + DRIVER_SURGE_BONUS + DRIVER_TIP,
        pickup_label: REQUEST_PICKUP_LABEL.to_string(),
        pickup: config.driver_pickup,
        generated_at: now_ms,
    }
}

/// The driver-side session's own profile, attached to the ride on accept.
pub fn self_as_driver(config: &RideConfig) -> Driver {
    Driver {
        actor: Actor {
            id: "me".to_string(),
            name: "You".to_string(),
            rating: Rating::new(4.95),
            position: config.passenger_home,
        },
        vehicle: Vehicle {
            model: "Toyota Prius".to_string(),
            plate: "BLU 2024".to_string(),
            color: "Blue".to_string(),
        },
        trips: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_session() -> (RideSession, SimulationClock, RideConfig) {
        let config = RideConfig::default();
        (
            RideSession::new(config.passenger_home),
            SimulationClock::default(),
            config,
        )
    }

    #[test]
    fn going_online_arms_one_timer() {
        let (mut session, mut clock, config) = idle_session();
        toggle_online(&mut session, &mut clock, &config);
        sync(&mut session, &mut clock, &config);

        assert!(session.online);
        assert_eq!(clock.pending_count(), 1);
        assert_eq!(clock.next_event_time(), Some(3000));
    }

    #[test]
    fn going_offline_disarms_and_withdraws_request() {
        let (mut session, mut clock, config) = idle_session();
        toggle_online(&mut session, &mut clock, &config);
        session.pending_request = Some(generate_request(&config, 0));
        toggle_online(&mut session, &mut clock, &config);

        assert!(!session.online);
        assert!(session.pending_request.is_none());
        assert!(clock.is_empty());
        assert!(session.pending_effect().is_none());
    }

    #[test]
    fn pending_request_blocks_rearming() {
        let (mut session, mut clock, config) = idle_session();
        session.online = true;
        session.pending_request = Some(generate_request(&config, 0));
        sync(&mut session, &mut clock, &config);
        assert!(clock.is_empty());

        assert!(decline(&mut session, &mut clock, &config));
        assert_eq!(clock.pending_count(), 1);
        assert!(!decline(&mut session, &mut clock, &config));
    }

    #[test]
    fn generated_request_uses_configured_pickup() {
        let config = RideConfig::default();
        let request = generate_request(&config, 3000);
        assert_eq!(request.pickup, config.driver_pickup);
        assert_eq!(request.generated_at, 3000);
        assert!((request.fare_quote - 24.0).abs() < 1e-9);
    }
}
