use std::time::{Duration, Instant};

use crate::config::TabletProfile;

use super::{
    encoder::ReportKind,
    state::{Mode, TabletState},
};

/// Decide whether a report must be sent on this poll of the pen endpoint and
/// which one. Updates the dirty flags, proximity and the last report time.
/// Returns `None` if the host should be told there is no data.
pub fn schedule(
    state: &mut TabletState,
    profile: &TabletProfile,
    now: Instant,
) -> Option<ReportKind> {
    if state.mode != Mode::Active {
        return None;
    }

    // Pen idle long enough to be considered lifted
    if let Some(leave_timeout) = profile.timing.leave_timeout() {
        if profile.proximity
            && state.proximity
            && !state.dirty_pen
            && expired(state.last_event, now, leave_timeout)
        {
            log::debug!("Pen left proximity after {leave_timeout:?} without events");
            state.proximity = false;
            state.dirty_proximity = true;
        }
    }

    // Keepalive, the guest treats prolonged silence as a disconnect
    if expired(state.last_report, now, profile.timing.ping_interval()) {
        if !profile.proximity || state.proximity {
            state.dirty_pen = true;
        } else {
            state.dirty_proximity = true;
        }
    }

    if !state.dirty_proximity && !state.dirty_pen {
        return None;
    }

    state.last_report = Some(now);
    if state.dirty_proximity {
        state.dirty_proximity = false;
        Some(ReportKind::Proximity)
    } else {
        state.dirty_pen = false;
        Some(ReportKind::Pen)
    }
}

/// A timestamp that was never set counts as expired
fn expired(since: Option<Instant>, now: Instant, limit: Duration) -> bool {
    match since {
        Some(since) => now.saturating_duration_since(since) > limit,
        None => true,
    }
}
