use std::{sync::Arc, time::Instant};

use packed_struct::PrimitiveEnum;
use thiserror::Error;
use tokio::sync::Notify;

use crate::{
    config::TabletProfile,
    input::source::pointer::{PointerSource, Subscription},
};

use super::{
    encoder::{self, ReportKind},
    event::{PointerButtons, PointerEvent},
    liveness,
    state::{Mode, TabletState},
};

/// Possible errors from the tablet driver
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DriverError {
    #[error("Unsupported mode value: {0}")]
    UnsupportedMode(u8),
}

/// Protocol engine of an emulated Wacom tablet. Owns the [TabletState] of a
/// single device and its registration with the [PointerSource].
#[derive(Debug)]
pub struct Driver {
    profile: TabletProfile,
    state: TabletState,
    source: PointerSource,
    subscription: Option<Subscription>,
    wakeup: Arc<Notify>,
}

impl Driver {
    pub fn new(profile: TabletProfile, source: PointerSource) -> Self {
        let initial_pressure = profile.pressure.map(|p| p.initial).unwrap_or_default();
        Self {
            profile,
            state: TabletState::new(initial_pressure),
            source,
            subscription: None,
            wakeup: Arc::new(Notify::new()),
        }
    }

    /// Bring the device back to its power-on state
    pub fn reset(&mut self) {
        log::debug!("Resetting tablet '{}'", self.profile.name);
        self.state.x = 0;
        self.state.y = 0;
        self.state.wheel = 0;
        self.state.buttons = PointerButtons::empty();
        self.set_mode(Mode::Passive);
    }

    /// Switch the reporting mode. Always drops the current subscription and
    /// forces a fresh announce in the new mode.
    pub fn set_mode(&mut self, mode: Mode) {
        if let Some(subscription) = self.subscription.take() {
            log::debug!("Releasing pointer subscription {}", subscription.id());
        }

        if mode == Mode::Active {
            let subscription = self.source.subscribe(self.profile.product.as_str());
            self.subscription = Some(subscription);
        }

        log::info!("Tablet '{}' switched to {mode} mode", self.profile.name);
        self.state.mode = mode;
        self.state.dirty_pen = true;
        if self.profile.proximity {
            self.state.proximity = false;
            self.state.dirty_proximity = true;
        }
    }

    /// Switch the mode from a raw mode byte sent by the host. Unknown values
    /// leave the state untouched.
    pub fn set_mode_value(&mut self, value: u8) -> Result<Mode, DriverError> {
        let Some(mode) = Mode::from_primitive(value) else {
            log::warn!("Rejecting unsupported mode value {value}");
            return Err(DriverError::UnsupportedMode(value));
        };
        self.set_mode(mode);
        Ok(mode)
    }

    /// Returns true if the driver currently receives pointer samples
    pub fn is_subscribed(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|subscription| subscription.is_active())
    }

    /// Apply a pointer sample to the tablet state. Samples are dropped unless
    /// the driver holds the active subscription. Returns true if the sample
    /// was applied.
    pub fn push_event(&mut self, event: PointerEvent, now: Instant) -> bool {
        if !self.is_subscribed() {
            log::trace!("Dropping pointer sample, not subscribed: {event:?}");
            return false;
        }

        let profile = &self.profile;
        let state = &mut self.state;
        state.x = scale(event.x, profile.resolution_x, profile.input_max);
        state.y = scale(event.y, profile.resolution_y, profile.input_max);
        state.wheel = state.wheel.saturating_add(event.dz);

        // The wheel acts as a pressure slider
        if let Some(pressure) = profile.pressure {
            let value = state.pressure as i64 - event.dz as i64 * pressure.wheel_step as i64;
            state.pressure = value.clamp(pressure.min as i64, pressure.max as i64) as i32;
        }

        state.buttons = event.buttons();
        state.dirty_pen = true;
        state.last_event = Some(now);

        if profile.proximity && !state.proximity {
            log::debug!("Pen entered proximity");
            state.proximity = true;
            state.dirty_proximity = true;
        }

        self.wakeup.notify_one();
        true
    }

    /// Interrupt IN poll of the pen endpoint. Returns `None` if there is no
    /// data for the host, otherwise the number of bytes written to `buf`
    /// which is zero if `buf` cannot hold the scheduled report.
    pub fn poll(&mut self, now: Instant, buf: &mut [u8]) -> Option<usize> {
        let kind = liveness::schedule(&mut self.state, &self.profile, now)?;
        Some(self.encode(kind, buf))
    }

    /// Encode a report from the current state without touching the scheduler
    pub fn encode(&self, kind: ReportKind, buf: &mut [u8]) -> usize {
        encoder::encode(&self.state, &self.profile, kind, buf)
    }

    /// Force a fresh announce after a reconfiguration command
    pub fn mark_dirty(&mut self) {
        self.state.dirty_pen = true;
        if self.profile.proximity {
            self.state.dirty_proximity = true;
        }
    }

    pub fn set_idle_rate(&mut self, rate: u8) {
        self.state.idle_rate = rate;
    }

    pub fn state(&self) -> &TabletState {
        &self.state
    }

    pub fn profile(&self) -> &TabletProfile {
        &self.profile
    }

    /// Signalled every time a pointer sample makes new data pending
    pub fn wakeup(&self) -> Arc<Notify> {
        self.wakeup.clone()
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            log::debug!(
                "Tablet '{}' torn down, releasing pointer subscription {}",
                self.profile.name,
                subscription.id()
            );
        }
    }
}

/// Linearly rescale a normalised input coordinate into device space
pub fn scale(value: i32, resolution: u32, input_max: i32) -> i32 {
    let max = resolution as i64 - 1;
    let scaled = value as i64 * resolution as i64 / input_max.max(1) as i64;
    scaled.clamp(0, max.max(0)) as i32
}
