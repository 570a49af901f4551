pub mod availability;
pub mod clock;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod ecs;
pub mod error;
pub mod lifecycle;
pub mod machine;
pub mod pricing;
pub mod runner;
pub mod spatial;
pub mod suggest;
pub mod systems;
pub mod telemetry;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
