use std::{fmt::Display, time::Instant};

use packed_struct::prelude::*;

use super::event::PointerButtons;

/// Reporting mode requested by the guest driver through SET_REPORT
#[derive(PrimitiveEnum_u8, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Mode {
    /// Plain relative mouse, the device is silent on the pen endpoint
    #[default]
    Passive = 1,
    /// Tablet-native absolute reports
    Active = 2,
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Passive => write!(f, "passive"),
            Mode::Active => write!(f, "active"),
        }
    }
}

/// Mutable record of everything the encoder needs to build a report
#[derive(Debug, Clone, PartialEq)]
pub struct TabletState {
    /// Absolute position in device space, always inside the profile resolution
    pub x: i32,
    pub y: i32,
    /// Sum of wheel deltas received since reset
    pub wheel: i32,
    /// Current pen pressure. Only meaningful for pressure-sensitive models.
    pub pressure: i32,
    pub buttons: PointerButtons,
    pub mode: Mode,
    /// Whether the stylus is considered near the surface
    pub proximity: bool,
    /// HID idle rate set by the host, stored and echoed only
    pub idle_rate: u8,
    pub last_event: Option<Instant>,
    pub last_report: Option<Instant>,
    /// A pen report must be sent
    pub dirty_pen: bool,
    /// A proximity report must be sent, takes priority over `dirty_pen`
    pub dirty_proximity: bool,
}

impl TabletState {
    pub fn new(initial_pressure: i32) -> Self {
        Self {
            x: 0,
            y: 0,
            wheel: 0,
            pressure: initial_pressure,
            buttons: PointerButtons::empty(),
            mode: Mode::Passive,
            proximity: false,
            idle_rate: 0,
            last_event: None,
            last_report: None,
            dirty_pen: false,
            dirty_proximity: false,
        }
    }

    /// Returns true if the pen tip is down
    pub fn is_pressed(&self) -> bool {
        self.buttons.contains(PointerButtons::PRIMARY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_values() {
        assert_eq!(Mode::from_primitive(1), Some(Mode::Passive));
        assert_eq!(Mode::from_primitive(2), Some(Mode::Active));
        assert_eq!(Mode::from_primitive(0), None);
        assert_eq!(Mode::from_primitive(3), None);
        assert_eq!(Mode::Active.to_primitive(), 2);
    }

    #[test]
    fn new_state_is_passive_and_clean() {
        let state = TabletState::new(890);
        assert_eq!(state.mode, Mode::Passive);
        assert!(!state.proximity);
        assert!(!state.dirty_pen);
        assert!(!state.dirty_proximity);
        assert_eq!((state.x, state.y, state.wheel), (0, 0, 0));
        assert_eq!(state.pressure, 890);
    }
}
