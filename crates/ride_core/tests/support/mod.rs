#![allow(dead_code)]

use ride_core::controller::SessionController;
use ride_core::ecs::RideStatus;

/// Advances `session` in `step_ms` increments until `until_ms`, recording the
/// virtual time at which each status was first observed.
pub fn status_timeline<C: SessionController>(
    session: &mut C,
    step_ms: u64,
    until_ms: u64,
) -> Vec<(u64, RideStatus)> {
    let mut timeline = vec![(session.now(), session.snapshot().status)];
    while session.now() < until_ms {
        session.advance_by(step_ms);
        let status = session.snapshot().status;
        if timeline.last().map(|(_, last)| *last) != Some(status) {
            timeline.push((session.now(), status));
        }
    }
    timeline
}

/// Transitions recorded by the session's telemetry, as `(from, to)` pairs.
pub fn transition_pairs<C: SessionController>(session: &C) -> Vec<(RideStatus, RideStatus)> {
    session
        .telemetry()
        .transitions
        .iter()
        .map(|record| (record.from, record.to))
        .collect()
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
