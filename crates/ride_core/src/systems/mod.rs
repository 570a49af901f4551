//! Event-reacting systems. Each one handles a single [EventKind], checks that
//! the fired timer still belongs to the session, and then either drives the
//! state machine or updates session data.

pub mod dispatch_departed;
pub mod match_found;
pub mod movement;
pub mod request_arrival;

use tracing::trace;

use crate::clock::Event;
use crate::ecs::RideSession;
use crate::telemetry::SessionTelemetry;

/// Consumes the session's pending effect if `event` is it. Stale events (from
/// an earlier epoch, or superseded by a later effect) are counted and dropped.
pub(crate) fn claim_effect(
    event: &Event,
    session: &mut RideSession,
    telemetry: &mut SessionTelemetry,
) -> bool {
    if !session.owns(event) {
        telemetry.stale_events_dropped += 1;
        trace!(
            kind = ?event.kind,
            event_epoch = event.epoch,
            session_epoch = session.epoch,
            "dropping stale timer"
        );
        return false;
    }
    session.pending_effect = None;
    true
}
