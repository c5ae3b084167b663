//! Source: https://github.com/torvalds/linux/blob/master/drivers/hid/wacom_wac.c
//! Layouts are the ones the Linux and Windows Wacom drivers decode from
//! Bamboo (penabled) and Intuos 5 devices.
use packed_struct::prelude::*;

use super::state::Mode;

/// Size in bytes of the Bamboo pen report
pub const PENABLED_REPORT_SIZE: usize = 9;
/// Size in bytes of the Intuos pen report
pub const INTUOS_PEN_REPORT_SIZE: usize = 10;
/// Size in bytes of the proximity/tool report. The descriptor only declares an
/// 8 byte payload after the report id.
pub const PROXIMITY_REPORT_SIZE: usize = 9;
/// Size in bytes of the firmware version report
pub const VERSION_REPORT_SIZE: usize = 10;
/// Size in bytes of the GET_REPORT mode reply
pub const MODE_REPORT_SIZE: usize = 2;

/// Pressure reported by the Bamboo while the tip or eraser is down
pub const PENABLED_CLICK_PRESSURE: u16 = 512;

/// Tilt is not modeled, report the pen as perpendicular to the surface
pub const TILT_CENTER: u8 = 64;
/// Distance reported while hovering
pub const HOVER_DISTANCE: u8 = 10;

/// Report ids that appear in byte 0 of input reports. Pen and proximity
/// reports of both families share the penabled id.
#[derive(PrimitiveEnum_u8, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ReportId {
    #[default]
    Penabled = 2,
    Versions = 10,
}

/// Vendor GET_REPORT selectors (low byte of wValue)
#[derive(PrimitiveEnum_u8, Clone, Copy, PartialEq, Eq, Debug)]
pub enum ReportSelector {
    GetMode = 2,
    GetFirstToolId = 5,
    GetVersions = 7,
}

/// Vendor SET_REPORT sub-commands other than a plain mode value
#[derive(PrimitiveEnum_u8, Clone, Copy, PartialEq, Eq, Debug)]
pub enum VendorCommand {
    SetDataRate = 0x04,
    SetScanModePenTouch = 0x0d,
    LedControl = 0x20,
}

/// Sub-command of [VendorCommand::SetDataRate] that carries a Bluetooth address
pub const SET_BLUETOOTH_ADDRESS: u8 = 0x01;

// Bamboo CTL-460 pen report
// E: 02 e1 c0 1c f8 11 00 02 00
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "9")]
pub struct PackedPenabledReport {
    #[packed_field(bytes = "0", ty = "enum")]
    pub report_id: ReportId,

    // byte 1
    #[packed_field(bits = "8")]
    pub range: bool,
    #[packed_field(bits = "9")]
    pub proximity: bool,
    #[packed_field(bits = "10")]
    pub ready: bool,
    #[packed_field(bits = "12")]
    pub rubber: bool,
    #[packed_field(bits = "13")]
    pub button_2: bool,
    #[packed_field(bits = "14")]
    pub button_1: bool,
    #[packed_field(bits = "15")]
    pub pen: bool,

    // byte 2-7
    #[packed_field(bytes = "2..=3", endian = "lsb")]
    pub x: u16,
    #[packed_field(bytes = "4..=5", endian = "lsb")]
    pub y: u16,
    #[packed_field(bytes = "6..=7", endian = "lsb")]
    pub pressure: u16,

    // byte 8
    #[packed_field(bytes = "8")]
    pub distance: u8,
}

impl Default for PackedPenabledReport {
    fn default() -> Self {
        Self {
            report_id: ReportId::Penabled,
            range: true,
            proximity: true,
            ready: true,
            rubber: false,
            button_2: false,
            button_1: false,
            pen: false,
            x: 0,
            y: 0,
            pressure: 0,
            distance: 0,
        }
    }
}

// Intuos 5 pen report. Coordinates are 17 bit: the upper 16 bits are sent
// big-endian in bytes 2-5 and the low bit of each axis is stashed in byte 9
// next to the hover distance.
// E: 02 e0 2b a8 1b 49 00 20 40 28
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "10")]
pub struct PackedIntuosPenReport {
    #[packed_field(bytes = "0", ty = "enum")]
    pub report_id: ReportId,

    // byte 1
    #[packed_field(bits = "8")]
    pub proximity: bool,
    #[packed_field(bits = "9")]
    pub ready: bool,
    #[packed_field(bits = "10")]
    pub in_range: bool,
    #[packed_field(bits = "13")]
    pub stylus_button_2: bool,
    #[packed_field(bits = "14")]
    pub stylus_button_1: bool,
    #[packed_field(bits = "15")]
    pub pressure_lsb: bool,

    // byte 2-9
    #[packed_field(bytes = "2")]
    pub x_high: u8,
    #[packed_field(bytes = "3")]
    pub x_low: u8,
    #[packed_field(bytes = "4")]
    pub y_high: u8,
    #[packed_field(bytes = "5")]
    pub y_low: u8,
    #[packed_field(bytes = "6")]
    pub pressure_high: u8,
    #[packed_field(bytes = "7")]
    pub pressure_tilt_x: u8,
    #[packed_field(bytes = "8")]
    pub tilt: u8,
    #[packed_field(bytes = "9")]
    pub distance_lsb: u8,
}

impl PackedIntuosPenReport {
    /// Write the motion fields. The shifts are the ones the guest driver
    /// decodes and must stay bit-exact.
    pub fn set_motion(
        &mut self,
        x: u32,
        y: u32,
        pressure: u16,
        tilt_x: u8,
        tilt_y: u8,
        distance: u8,
    ) {
        self.pressure_lsb = pressure & 0x01 != 0;

        self.x_high = ((x >> 9) & 0xFF) as u8;
        self.x_low = ((x >> 1) & 0xFF) as u8;
        self.y_high = ((y >> 9) & 0xFF) as u8;
        self.y_low = ((y >> 1) & 0xFF) as u8;

        self.pressure_high = (pressure >> 3) as u8;
        self.pressure_tilt_x = (((pressure & 0x6) << 5) as u8) | ((tilt_x >> 1) & 0x7F);
        self.tilt = (tilt_x << 7) | (tilt_y & 0x7F);

        self.distance_lsb = (distance << 2) | (((x & 0x01) as u8) << 1) | (y & 0x01) as u8;
    }

    pub fn x(&self) -> u32 {
        (self.x_high as u32) << 9 | (self.x_low as u32) << 1 | ((self.distance_lsb >> 1) & 0x01) as u32
    }

    pub fn y(&self) -> u32 {
        (self.y_high as u32) << 9 | (self.y_low as u32) << 1 | (self.distance_lsb & 0x01) as u32
    }

    pub fn pressure(&self) -> u16 {
        (self.pressure_high as u16) << 3
            | ((self.pressure_tilt_x >> 5) & 0x6) as u16
            | self.pressure_lsb as u16
    }

    pub fn distance(&self) -> u8 {
        self.distance_lsb >> 2
    }
}

impl Default for PackedIntuosPenReport {
    fn default() -> Self {
        let mut report = Self {
            report_id: ReportId::Penabled,
            proximity: true,
            ready: true,
            in_range: true,
            stylus_button_2: false,
            stylus_button_1: false,
            pressure_lsb: false,
            x_high: 0,
            x_low: 0,
            y_high: 0,
            y_low: 0,
            pressure_high: 0,
            pressure_tilt_x: 0,
            tilt: 0,
            distance_lsb: 0,
        };
        report.set_motion(0, 0, 0, TILT_CENTER, TILT_CENTER, HOVER_DISTANCE);
        report
    }
}

// Proximity/tool report. Carries the tool type and serial number of the
// stylus, nibble-interleaved across bytes 2-8.
// E: 02 c2 80 2f ee dc 0d e0 00
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "9")]
pub struct PackedProximityReport {
    #[packed_field(bytes = "0", ty = "enum")]
    pub report_id: ReportId,

    // byte 1
    #[packed_field(bits = "8")]
    pub proximity: bool,
    #[packed_field(bits = "9")]
    pub ready: bool,
    #[packed_field(bits = "14")]
    pub has_serial: bool,
    #[packed_field(bits = "15")]
    pub tool_index: bool,

    // byte 2-8
    #[packed_field(bytes = "2..=8")]
    pub tool: [u8; 7],
}

impl PackedProximityReport {
    /// Pack the tool type and serial exactly as the hardware interleaves them.
    pub fn set_tool(&mut self, tool_id: u32, serial: u32) {
        self.tool = [
            (tool_id >> 4) as u8,
            ((tool_id << 4) as u8) | (serial >> 28) as u8,
            (serial >> 20) as u8,
            (serial >> 12) as u8,
            (serial >> 4) as u8,
            ((serial << 4) as u8) | ((tool_id >> 16) & 0x0F) as u8,
            ((tool_id >> 8) & 0xF0) as u8,
        ];
    }

    pub fn tool_id(&self) -> u32 {
        let t = self.tool;
        ((t[6] as u32 & 0xF0) << 8)
            | ((t[5] as u32 & 0x0F) << 16)
            | ((t[0] as u32) << 4)
            | ((t[1] as u32) >> 4)
    }

    pub fn serial(&self) -> u32 {
        let t = self.tool;
        ((t[1] as u32 & 0x0F) << 28)
            | ((t[2] as u32) << 20)
            | ((t[3] as u32) << 12)
            | ((t[4] as u32) << 4)
            | ((t[5] as u32) >> 4)
    }
}

impl Default for PackedProximityReport {
    fn default() -> Self {
        Self {
            report_id: ReportId::Penabled,
            proximity: true,
            ready: false,
            has_serial: false,
            tool_index: false,
            tool: [0; 7],
        }
    }
}

// Firmware version report, e.g. pen 18.1.1.18 and touch 18.1.1
// E: 0a 00 00 12 11 12 12 11 00 00
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "10")]
pub struct PackedVersionReport {
    #[packed_field(bytes = "0", ty = "enum")]
    pub report_id: ReportId,
    #[packed_field(bytes = "1")]
    pub _unused1: u8,
    #[packed_field(bytes = "2")]
    pub _unused2: u8,
    #[packed_field(bytes = "3..=5", endian = "msb")]
    pub pen_version: Integer<u32, packed_bits::Bits<24>>,
    #[packed_field(bytes = "6..=7", endian = "msb")]
    pub touch_version: u16,
    #[packed_field(bytes = "8..=9")]
    pub _unused8: [u8; 2],
}

impl Default for PackedVersionReport {
    fn default() -> Self {
        Self {
            report_id: ReportId::Versions,
            _unused1: 0,
            _unused2: 0,
            pen_version: Integer::from_primitive(0),
            touch_version: 0,
            _unused8: [0; 2],
        }
    }
}

/// Reply to the vendor "get mode" query
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq, Default)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "2")]
pub struct PackedModeReport {
    #[packed_field(bytes = "0")]
    pub _unused0: u8,
    #[packed_field(bytes = "1", ty = "enum")]
    pub mode: Mode,
}
