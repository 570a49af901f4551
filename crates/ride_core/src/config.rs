//! Session configuration: delays, approach profiles and the fixed coordinates
//! the simulation uses in place of real geocoding.

use std::path::Path;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::spatial::{ApproachProfile, Position, PLANE_MAX, PLANE_MIN};

#[derive(Debug, Clone, Copy, PartialEq, Resource, Serialize, Deserialize)]
#[serde(default)]
pub struct RideConfig {
    /// Delay before an online, idle driver receives a request.
    pub request_arrival_ms: u64,
    /// Delay between confirming a ride and dispatch finding a driver.
    pub match_delay_ms: u64,
    /// Delay between `Matched` and the driver heading to the pickup.
    pub matched_advance_ms: u64,
    /// Period of one sweep tick.
    pub move_tick_ms: u64,
    pub pickup_approach: ApproachProfile,
    pub dropoff_approach: ApproachProfile,
    /// Where the passenger stands when the app opens.
    pub passenger_home: Position,
    /// Coordinates assigned to whatever destination the passenger picks.
    pub passenger_destination: Position,
    /// Pickup coordinate attached to simulated driver requests.
    pub driver_pickup: Position,
    /// Drop-off coordinate of simulated driver requests.
    pub driver_dropoff: Position,
    /// Seed for [crate::dispatch::SeededDispatch].
    pub dispatch_seed: u64,
}

impl Default for RideConfig {
    fn default() -> Self {
        Self {
            request_arrival_ms: 3000,
            match_delay_ms: 2500,
            matched_advance_ms: 1000,
            move_tick_ms: 500,
            pickup_approach: ApproachProfile::PICKUP,
            dropoff_approach: ApproachProfile::DROPOFF,
            passenger_home: Position::new(50.0, 50.0),
            passenger_destination: Position::new(80.0, 30.0),
            driver_pickup: Position::new(20.0, 80.0),
            driver_dropoff: Position::new(80.0, 30.0),
            dispatch_seed: 0,
        }
    }
}

/// A saved place the passenger can pick instead of typing an address.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PopularLocation {
    pub name: &'static str,
    pub address: &'static str,
    pub position: Position,
}

pub static POPULAR_LOCATIONS: [PopularLocation; 3] = [
    PopularLocation {
        name: "Home",
        address: "123 Maple Street",
        position: Position { x: 20.0, y: 80.0 },
    },
    PopularLocation {
        name: "Office",
        address: "Tech Plaza, Floor 4",
        position: Position { x: 80.0, y: 20.0 },
    },
    PopularLocation {
        name: "Central Mall",
        address: "45 Broad Avenue",
        position: Position { x: 50.0, y: 50.0 },
    },
];

/// Looks a saved place up by name, ignoring case and surrounding blanks.
pub fn popular_location(name: &str) -> Option<&'static PopularLocation> {
    let name = name.trim();
    POPULAR_LOCATIONS
        .iter()
        .find(|place| place.name.eq_ignore_ascii_case(name))
}

impl RideConfig {
    /// Parses a JSON document; omitted fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: RideConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.move_tick_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "move_tick_ms",
                reason: "must be positive".to_string(),
            });
        }
        validate_profile("pickup_approach", self.pickup_approach)?;
        validate_profile("dropoff_approach", self.dropoff_approach)?;
        for (field, position) in [
            ("passenger_home", self.passenger_home),
            ("passenger_destination", self.passenger_destination),
            ("driver_pickup", self.driver_pickup),
            ("driver_dropoff", self.driver_dropoff),
        ] {
            let on_plane = |v: f64| (PLANE_MIN..=PLANE_MAX).contains(&v);
            if !on_plane(position.x) || !on_plane(position.y) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("({}, {}) is outside the map plane", position.x, position.y),
                });
            }
        }
        Ok(())
    }
}

fn validate_profile(field: &'static str, profile: ApproachProfile) -> Result<(), ConfigError> {
    if !(profile.fraction > 0.0 && profile.fraction <= 1.0) {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("fraction {} must be in (0, 1]", profile.fraction),
        });
    }
    // A zero threshold can never be undercut, so the sweep would never arrive.
    if profile.arrival_threshold.is_nan() || profile.arrival_threshold <= 0.0 {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("arrival threshold {} must be > 0", profile.arrival_threshold),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = RideConfig::from_json_str(r#"{ "match_delay_ms": 100 }"#).expect("config");
        assert_eq!(config.match_delay_ms, 100);
        assert_eq!(config.move_tick_ms, 500);
        assert_eq!(config.pickup_approach, ApproachProfile::PICKUP);
    }

    #[test]
    fn rejects_zero_tick_period() {
        let err = RideConfig::from_json_str(r#"{ "move_tick_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "move_tick_ms", .. }));
    }

    #[test]
    fn rejects_fraction_above_one() {
        let json = r#"{ "dropoff_approach": { "fraction": 1.5, "arrival_threshold": 0.5 } }"#;
        let err = RideConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "dropoff_approach", .. }));
    }

    #[test]
    fn rejects_zero_threshold() {
        let json = r#"{ "pickup_approach": { "fraction": 0.1, "arrival_threshold": 0.0 } }"#;
        let err = RideConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "pickup_approach", .. }));

        let mut config = RideConfig::default();
        config.dropoff_approach.arrival_threshold = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn popular_locations_resolve_by_name() {
        let office = popular_location(" office ").expect("office");
        assert_eq!(office.address, "Tech Plaza, Floor 4");
        assert_eq!(office.position, Position::new(80.0, 20.0));
        assert_eq!(
            popular_location("Central Mall").map(|place| place.position),
            Some(Position::new(50.0, 50.0))
        );
        assert!(popular_location("Airport").is_none());
        for place in &POPULAR_LOCATIONS {
            assert_eq!(Position::new(place.position.x, place.position.y), place.position);
        }
    }

    #[test]
    fn rejects_off_plane_coordinates() {
        let json = r#"{ "driver_pickup": { "x": 120.0, "y": 10.0 } }"#;
        let err = RideConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "driver_pickup", .. }));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ride.json");
        std::fs::write(&path, r#"{ "request_arrival_ms": 1200, "dispatch_seed": 9 }"#)
            .expect("write config");

        let config = RideConfig::load(&path).expect("config");
        assert_eq!(config.request_arrival_ms, 1200);
        assert_eq!(config.dispatch_seed, 9);

        let missing = RideConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = RideConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
