//! Ride options and fare breakdowns.
//!
//! Amounts are illustrative constants; the breakdown is still a real mapping of
//! named components so a quote and a payout render the same way.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Base quote in currency units before the ride option's multiplier.
pub const BASE_FARE: f64 = 12.0;

/// Flat booking fee added to every passenger quote.
pub const BOOKING_FEE: f64 = 2.50;

pub const DRIVER_FARE: f64 = 20.0;
pub const DRIVER_SURGE_BONUS: f64 = 2.0;
pub const DRIVER_TIP: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideOptionId {
    Eco,
    Plus,
    Xl,
}

impl RideOptionId {
    /// Parses the identifier the presentation layer sends (`eco`, `plus`, `xl`).
    pub fn parse(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "eco" => Some(Self::Eco),
            "plus" => Some(Self::Plus),
            "xl" => Some(Self::Xl),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RideOption {
    pub id: RideOptionId,
    pub name: &'static str,
    pub multiplier: f64,
    pub eta_min: u32,
    pub seats: u8,
}

pub const RIDE_OPTIONS: [RideOption; 3] = [
    RideOption {
        id: RideOptionId::Eco,
        name: "Blue Eco",
        multiplier: 1.0,
        eta_min: 4,
        seats: 4,
    },
    RideOption {
        id: RideOptionId::Plus,
        name: "Blue Plus",
        multiplier: 1.4,
        eta_min: 8,
        seats: 4,
    },
    RideOption {
        id: RideOptionId::Xl,
        name: "Blue XL",
        multiplier: 1.8,
        eta_min: 12,
        seats: 6,
    },
];

pub fn ride_option(id: RideOptionId) -> &'static RideOption {
    RIDE_OPTIONS
        .iter()
        .find(|option| option.id == id)
        .unwrap_or(&RIDE_OPTIONS[0])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FareComponent {
    Fare,
    BookingFee,
    SurgeBonus,
    Tip,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FareBreakdown(BTreeMap<FareComponent, f64>);

impl FareBreakdown {
    pub fn with(mut self, component: FareComponent, amount: f64) -> Self {
        self.0.insert(component, amount);
        self
    }

    pub fn get(&self, component: FareComponent) -> Option<f64> {
        self.0.get(&component).copied()
    }

    /// `0.0` when empty. `Sum for f64` starts from `-0.0`.
    pub fn total(&self) -> f64 {
        self.0.values().fold(0.0, |acc, amount| acc + amount)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn components(&self) -> impl Iterator<Item = (FareComponent, f64)> + '_ {
        self.0.iter().map(|(component, amount)| (*component, *amount))
    }
}

/// What the passenger is quoted when confirming `option`.
pub fn passenger_quote(option: RideOptionId) -> FareBreakdown {
    FareBreakdown::default()
        .with(FareComponent::Fare, BASE_FARE * ride_option(option).multiplier)
        .with(FareComponent::BookingFee, BOOKING_FEE)
}

/// What the driver earns for an accepted request.
pub fn driver_payout() -> FareBreakdown {
    FareBreakdown::default()
        .with(FareComponent::Fare, DRIVER_FARE)
        .with(FareComponent::SurgeBonus, DRIVER_SURGE_BONUS)
        .with(FareComponent::Tip, DRIVER_TIP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eco_quote_includes_booking_fee() {
        let quote = passenger_quote(RideOptionId::Eco);
        assert_eq!(quote.get(FareComponent::Fare), Some(12.0));
        assert!((quote.total() - 14.50).abs() < 1e-9);
    }

    #[test]
    fn xl_quote_scales_with_multiplier() {
        let quote = passenger_quote(RideOptionId::Xl);
        let fare = quote.get(FareComponent::Fare).expect("fare");
        assert!((fare - 21.6).abs() < 1e-9);
    }

    #[test]
    fn driver_payout_sums_components() {
        let payout = driver_payout();
        assert_eq!(payout.components().count(), 3);
        assert!((payout.total() - 24.0).abs() < 1e-9);
    }

    #[test]
    fn empty_breakdown_totals_positive_zero() {
        let total = FareBreakdown::default().total();
        assert_eq!(total, 0.0);
        assert!(total.is_sign_positive());
        assert_eq!(format!("{total:.2}"), "0.00");
    }

    #[test]
    fn option_ids_parse_case_insensitively() {
        assert_eq!(RideOptionId::parse("eco"), Some(RideOptionId::Eco));
        assert_eq!(RideOptionId::parse(" XL "), Some(RideOptionId::Xl));
        assert_eq!(RideOptionId::parse("limo"), None);
    }
}
