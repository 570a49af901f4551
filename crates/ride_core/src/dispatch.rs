//! Dispatch simulation: stands in for a matching service.
//!
//! A [DispatchSimulator] is consulted once per search, when the matching delay
//! elapses. It always produces a driver; there is no "no drivers available"
//! outcome and no retry.

use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ecs::{Actor, Driver, Rating, Vehicle};
use crate::spatial::Position;

pub trait DispatchSimulator: Send + Sync {
    /// Assigns a driver to a passenger waiting at `pickup`.
    fn request_match(&mut self, pickup: Position) -> Driver;
}

/// Resource wrapper for the dispatch simulator trait object.
#[derive(Resource)]
pub struct DispatchResource(pub Box<dyn DispatchSimulator>);

impl DispatchResource {
    pub fn new(dispatch: Box<dyn DispatchSimulator>) -> Self {
        Self(dispatch)
    }
}

impl Default for DispatchResource {
    fn default() -> Self {
        Self::new(Box::new(FixedDispatch::default()))
    }
}

impl std::ops::Deref for DispatchResource {
    type Target = dyn DispatchSimulator;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl std::ops::DerefMut for DispatchResource {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut()
    }
}

/// The driver every fixed dispatch hands out.
pub fn default_driver() -> Driver {
    Driver {
        actor: Actor {
            id: "d1".to_string(),
            name: "James Wilson".to_string(),
            rating: Rating::new(4.9),
            position: Position::new(40.0, 40.0),
        },
        vehicle: Vehicle {
            model: "Toyota Camry".to_string(),
            plate: "ABC 1234".to_string(),
            color: "White".to_string(),
        },
        trips: 1420,
    }
}

/// Always returns the same driver at the same starting position.
#[derive(Debug, Clone)]
pub struct FixedDispatch {
    driver: Driver,
}

impl FixedDispatch {
    pub fn new(driver: Driver) -> Self {
        Self { driver }
    }
}

impl Default for FixedDispatch {
    fn default() -> Self {
        Self::new(default_driver())
    }
}

impl DispatchSimulator for FixedDispatch {
    fn request_match(&mut self, _pickup: Position) -> Driver {
        self.driver.clone()
    }
}

/// Max distance on each axis between the pickup and a seeded driver's start.
const SEEDED_START_SPREAD: f64 = 15.0;

/// Picks drivers from a roster with a seeded RNG so runs are reproducible per
/// seed. Starting positions are scattered around the pickup.
#[derive(Debug, Clone)]
pub struct SeededDispatch {
    roster: Vec<Driver>,
    rng: StdRng,
}

impl SeededDispatch {
    pub fn new(seed: u64) -> Self {
        Self::with_roster(seed, default_roster())
    }

    pub fn with_roster(seed: u64, roster: Vec<Driver>) -> Self {
        let roster = if roster.is_empty() {
            vec![default_driver()]
        } else {
            roster
        };
        Self {
            roster,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl DispatchSimulator for SeededDispatch {
    fn request_match(&mut self, pickup: Position) -> Driver {
        let index = self.rng.gen_range(0..self.roster.len());
        let mut driver = self.roster[index].clone();
        let dx = self.rng.gen_range(-SEEDED_START_SPREAD..=SEEDED_START_SPREAD);
        let dy = self.rng.gen_range(-SEEDED_START_SPREAD..=SEEDED_START_SPREAD);
        driver.actor.position = Position::new(pickup.x + dx, pickup.y + dy);
        driver
    }
}

fn roster_entry(
    id: &str,
    name: &str,
    rating: f32,
    model: &str,
    plate: &str,
    color: &str,
    trips: u32,
) -> Driver {
    Driver {
        actor: Actor {
            id: id.to_string(),
            name: name.to_string(),
            rating: Rating::new(rating),
            position: Position::new(0.0, 0.0),
        },
        vehicle: Vehicle {
            model: model.to_string(),
            plate: plate.to_string(),
            color: color.to_string(),
        },
        trips,
    }
}

fn default_roster() -> Vec<Driver> {
    vec![
        default_driver(),
        roster_entry("d2", "Amara Okafor", 4.8, "Honda Accord", "KLM 4821", "Silver", 860),
        roster_entry("d3", "Lucas Brandt", 4.7, "Kia Niro", "TRX 0193", "Blue", 312),
        roster_entry("d4", "Mei Tanaka", 5.0, "Tesla Model 3", "EVS 7754", "Black", 2045),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_dispatch_is_deterministic() {
        let mut dispatch = FixedDispatch::default();
        let pickup = Position::new(50.0, 50.0);
        let first = dispatch.request_match(pickup);
        let second = dispatch.request_match(pickup);
        assert_eq!(first, second);
        assert_eq!(first.actor.name, "James Wilson");
        assert_eq!(first.position(), Position::new(40.0, 40.0));
    }

    #[test]
    fn seeded_dispatch_repeats_per_seed() {
        let pickup = Position::new(50.0, 50.0);
        let mut a = SeededDispatch::new(7);
        let mut b = SeededDispatch::new(7);
        for _ in 0..5 {
            assert_eq!(a.request_match(pickup), b.request_match(pickup));
        }
    }

    #[test]
    fn seeded_drivers_start_near_pickup() {
        let pickup = Position::new(95.0, 5.0);
        let mut dispatch = SeededDispatch::new(42);
        for _ in 0..20 {
            let driver = dispatch.request_match(pickup);
            let start = driver.position();
            assert!((start.x - pickup.x).abs() <= SEEDED_START_SPREAD);
            assert!((start.y - pickup.y).abs() <= SEEDED_START_SPREAD);
            assert!(start.x <= 100.0 && start.y >= 0.0);
        }
    }

    #[test]
    fn empty_roster_falls_back_to_default_driver() {
        let mut dispatch = SeededDispatch::with_roster(1, Vec::new());
        let driver = dispatch.request_match(Position::new(10.0, 10.0));
        assert_eq!(driver.actor.id, "d1");
    }
}
