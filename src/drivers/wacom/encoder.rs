use packed_struct::{
    types::{Integer, SizedInteger},
    PackedStructSlice, PackingError,
};

use crate::config::{ReportLayout, TabletProfile};

use super::{
    event::PointerButtons,
    hid_report::{
        PackedIntuosPenReport, PackedModeReport, PackedPenabledReport, PackedProximityReport,
        PackedVersionReport, HOVER_DISTANCE, INTUOS_PEN_REPORT_SIZE, MODE_REPORT_SIZE,
        PENABLED_CLICK_PRESSURE, PENABLED_REPORT_SIZE, PROXIMITY_REPORT_SIZE, TILT_CENTER,
        VERSION_REPORT_SIZE,
    },
    state::TabletState,
};

/// The different reports the device can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Position, buttons and pressure
    Pen,
    /// Proximity entry/leave with the tool identity
    Proximity,
    /// Firmware versions, only sent on explicit request
    Version,
    /// Current reporting mode, only sent on explicit request
    Mode,
}

impl ReportKind {
    /// Fixed size of the report for the given profile, or `None` if the
    /// profile cannot produce this kind of report.
    pub fn size(&self, profile: &TabletProfile) -> Option<usize> {
        match self {
            ReportKind::Pen => match profile.layout {
                ReportLayout::Penabled => Some(PENABLED_REPORT_SIZE),
                ReportLayout::Intuos => Some(INTUOS_PEN_REPORT_SIZE),
            },
            ReportKind::Proximity => profile
                .tool
                .filter(|_| profile.proximity)
                .map(|_| PROXIMITY_REPORT_SIZE),
            ReportKind::Version => profile.firmware.map(|_| VERSION_REPORT_SIZE),
            ReportKind::Mode => Some(MODE_REPORT_SIZE),
        }
    }
}

/// Encode the given report kind from the tablet state into `buf`. Returns the
/// number of bytes written, which is zero if `buf` is too small for the
/// report or the profile has no such report.
pub fn encode(
    state: &TabletState,
    profile: &TabletProfile,
    kind: ReportKind,
    buf: &mut [u8],
) -> usize {
    let Some(size) = kind.size(profile) else {
        log::debug!("Profile '{}' has no {kind:?} report", profile.name);
        return 0;
    };
    if buf.len() < size {
        log::debug!(
            "Buffer of {} bytes is too small for {kind:?} report of {size} bytes",
            buf.len()
        );
        return 0;
    }

    let result: Result<(), PackingError> = match kind {
        ReportKind::Pen => match profile.layout {
            ReportLayout::Penabled => penabled_report(state).pack_to_slice(&mut buf[..size]),
            ReportLayout::Intuos => intuos_pen_report(state).pack_to_slice(&mut buf[..size]),
        },
        ReportKind::Proximity => proximity_report(state, profile).pack_to_slice(&mut buf[..size]),
        ReportKind::Version => version_report(profile).pack_to_slice(&mut buf[..size]),
        ReportKind::Mode => mode_report(state).pack_to_slice(&mut buf[..size]),
    };

    match result {
        Ok(()) => {
            log::trace!("Encoded {kind:?} report: {:02x?}", &buf[..size]);
            size
        }
        Err(e) => {
            log::error!("Failed to pack {kind:?} report: {e:?}");
            0
        }
    }
}

fn penabled_report(state: &TabletState) -> PackedPenabledReport {
    let mut report = PackedPenabledReport {
        pen: state.buttons.contains(PointerButtons::PRIMARY),
        button_1: state.buttons.contains(PointerButtons::TERTIARY),
        button_2: state.buttons.contains(PointerButtons::SECONDARY),
        x: state.x as u16,
        y: state.y as u16,
        ..Default::default()
    };
    // Two-level pressure derived from the tip and eraser
    if report.pen || report.rubber {
        report.pressure = PENABLED_CLICK_PRESSURE;
    }

    report
}

fn intuos_pen_report(state: &TabletState) -> PackedIntuosPenReport {
    let mut report = PackedIntuosPenReport {
        stylus_button_1: state.buttons.contains(PointerButtons::SECONDARY),
        stylus_button_2: state.buttons.contains(PointerButtons::TERTIARY),
        ..Default::default()
    };
    let (pressure, distance) = if state.is_pressed() {
        (state.pressure as u16, 0)
    } else {
        (0, HOVER_DISTANCE)
    };
    report.set_motion(
        state.x as u32,
        state.y as u32,
        pressure,
        TILT_CENTER,
        TILT_CENTER,
        distance,
    );

    report
}

fn proximity_report(state: &TabletState, profile: &TabletProfile) -> PackedProximityReport {
    let mut report = PackedProximityReport {
        ready: state.proximity,
        has_serial: state.proximity,
        ..Default::default()
    };
    if let Some(tool) = profile.tool {
        report.set_tool(tool.tool_id, tool.serial);
    }

    report
}

fn version_report(profile: &TabletProfile) -> PackedVersionReport {
    let mut report = PackedVersionReport::default();
    if let Some(firmware) = profile.firmware {
        report.pen_version = Integer::from_primitive(firmware.pen_version & 0x00FF_FFFF);
        report.touch_version = firmware.touch_version;
    }

    report
}

fn mode_report(state: &TabletState) -> PackedModeReport {
    PackedModeReport {
        mode: state.mode,
        ..Default::default()
    }
}
