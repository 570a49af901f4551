//! Positions on the normalized 0–100 map plane and the exponential-approach
//! interpolator used for vehicle sweeps.
//!
//! The plane has no physical units; positions only matter relative to each
//! other for rendering and arrival detection.

use serde::{Deserialize, Serialize};

pub const PLANE_MIN: f64 = 0.0;
pub const PLANE_MAX: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Builds a position, clamping both axes onto the plane.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: clamp_axis(x),
            y: clamp_axis(y),
        }
    }

    pub fn distance_to(&self, other: Position) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

fn clamp_axis(value: f64) -> f64 {
    if value.is_nan() {
        PLANE_MIN
    } else {
        value.clamp(PLANE_MIN, PLANE_MAX)
    }
}

/// Closing fraction and arrival threshold for one kind of approach.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApproachProfile {
    /// Share of the remaining gap closed per tick, in (0, 1].
    pub fraction: f64,
    /// Arrival is declared once a step would move less than this.
    pub arrival_threshold: f64,
}

impl ApproachProfile {
    pub const PICKUP: Self = Self {
        fraction: 0.1,
        arrival_threshold: 0.1,
    };

    pub const DROPOFF: Self = Self {
        fraction: 0.05,
        arrival_threshold: 0.5,
    };
}

/// Outcome of one interpolation tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Moved(Position),
    /// The point snapped onto the target.
    Arrived(Position),
}

impl Step {
    pub fn position(&self) -> Position {
        match self {
            Step::Moved(position) | Step::Arrived(position) => *position,
        }
    }
}

/// Advances a point toward `target` one tick at a time.
///
/// `next = current + fraction * (target - current)` on each axis. Because the
/// fraction never exceeds one the point can approach but never pass the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionInterpolator {
    current: Position,
    target: Position,
    profile: ApproachProfile,
    ticks: u32,
    arrived: bool,
}

impl PositionInterpolator {
    pub fn new(current: Position, target: Position, profile: ApproachProfile) -> Self {
        Self {
            current,
            target,
            profile,
            ticks: 0,
            arrived: false,
        }
    }

    pub fn current(&self) -> Position {
        self.current
    }

    pub fn target(&self) -> Position {
        self.target
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn has_arrived(&self) -> bool {
        self.arrived
    }

    /// Runs one tick. After arrival further ticks keep returning the target.
    pub fn tick(&mut self) -> Step {
        if self.arrived {
            return Step::Arrived(self.current);
        }
        self.ticks += 1;
        let step = approach_step(self.current, self.target, self.profile);
        self.current = step.position();
        if matches!(step, Step::Arrived(_)) {
            self.arrived = true;
        }
        step
    }
}

/// One stateless interpolation step; [PositionInterpolator::tick] in terms of
/// plain positions.
pub fn approach_step(current: Position, target: Position, profile: ApproachProfile) -> Step {
    let dx = (target.x - current.x) * profile.fraction;
    let dy = (target.y - current.y) * profile.fraction;
    if dx.hypot(dy) < profile.arrival_threshold {
        return Step::Arrived(target);
    }
    Step::Moved(Position {
        x: current.x + dx,
        y: current.y + dy,
    })
}
