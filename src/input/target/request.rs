use packed_struct::prelude::*;
use thiserror::Error;

/// Size of a USB SETUP packet
pub const SETUP_PACKET_SIZE: usize = 8;

/// bmRequestType of class requests from the host to an interface
pub const CLASS_INTERFACE_OUT: u8 = 0x21;
/// bmRequestType of class requests from an interface to the host
pub const CLASS_INTERFACE_IN: u8 = 0xa1;
/// bmRequestType of standard requests addressed to an endpoint
pub const STANDARD_ENDPOINT_OUT: u8 = 0x02;

/// Standard CLEAR_FEATURE request code
pub const CLEAR_FEATURE: u8 = 0x01;

/// HID class request codes
#[derive(PrimitiveEnum_u8, Clone, Copy, PartialEq, Eq, Debug)]
pub enum HidRequestCode {
    GetReport = 0x01,
    GetIdle = 0x02,
    GetProtocol = 0x03,
    SetReport = 0x09,
    SetIdle = 0x0a,
    SetProtocol = 0x0b,
}

/// Possible errors decoding a control transfer
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Setup packet must be 8 bytes, got {0}")]
    InvalidLength(usize),
    #[error("Failed to unpack setup packet: {0}")]
    Unpack(#[from] PackingError),
}

/// USB SETUP packet that opens every control transfer
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "8")]
pub struct SetupPacket {
    #[packed_field(bytes = "0")]
    pub request_type: u8,
    #[packed_field(bytes = "1")]
    pub request: u8,
    #[packed_field(bytes = "2..=3", endian = "lsb")]
    pub value: u16,
    #[packed_field(bytes = "4..=5", endian = "lsb")]
    pub index: u16,
    #[packed_field(bytes = "6..=7", endian = "lsb")]
    pub length: u16,
}

impl SetupPacket {
    pub fn new(request_type: u8, request: u8, value: u16, index: u16, length: u16) -> Self {
        Self {
            request_type,
            request,
            value,
            index,
            length,
        }
    }

    /// Decode a SETUP packet from the wire
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RequestError> {
        let bytes: &[u8; SETUP_PACKET_SIZE] = bytes
            .try_into()
            .map_err(|_| RequestError::InvalidLength(bytes.len()))?;
        Ok(SetupPacket::unpack(bytes)?)
    }

    /// usbmon style one-line summary of the packet
    pub fn describe(&self) -> String {
        format!(
            "bmRequestType={:#04x} bRequest={:#04x} wValue={:#06x} wIndex={:#06x} wLength={}",
            self.request_type, self.request, self.value, self.index, self.length
        )
    }
}

/// Control requests the tablet understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    /// Vendor SET_REPORT, the payload carries the sub-command
    SetReport,
    /// GET_REPORT sent with the OUT direction by the guest driver when it
    /// probes the mode
    GetReportOut,
    SetProtocol { protocol: u16 },
    /// Vendor GET_REPORT, `selector` is the low byte of wValue
    GetReport { selector: u8 },
    GetIdle,
    SetIdle { rate: u8 },
    ClearEndpointFeature { feature: u16, endpoint: u16 },
    Unknown { request_type: u8, request: u8 },
}

impl From<&SetupPacket> for ControlRequest {
    fn from(setup: &SetupPacket) -> Self {
        let code = HidRequestCode::from_primitive(setup.request);
        match (setup.request_type, code) {
            (CLASS_INTERFACE_OUT, Some(HidRequestCode::SetReport)) => ControlRequest::SetReport,
            (CLASS_INTERFACE_OUT, Some(HidRequestCode::GetReport)) => ControlRequest::GetReportOut,
            (CLASS_INTERFACE_OUT, Some(HidRequestCode::SetProtocol)) => {
                ControlRequest::SetProtocol {
                    protocol: setup.value,
                }
            }
            (CLASS_INTERFACE_OUT, Some(HidRequestCode::SetIdle)) => ControlRequest::SetIdle {
                rate: (setup.value >> 8) as u8,
            },
            (CLASS_INTERFACE_IN, Some(HidRequestCode::GetReport)) => ControlRequest::GetReport {
                selector: (setup.value & 0xff) as u8,
            },
            (CLASS_INTERFACE_IN, Some(HidRequestCode::GetIdle)) => ControlRequest::GetIdle,
            (STANDARD_ENDPOINT_OUT, _) if setup.request == CLEAR_FEATURE => {
                ControlRequest::ClearEndpointFeature {
                    feature: setup.value,
                    endpoint: setup.index,
                }
            }
            _ => ControlRequest::Unknown {
                request_type: setup.request_type,
                request: setup.request,
            },
        }
    }
}

/// Outcome of a control transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlReply {
    /// Data stage payload for IN requests
    Data(Vec<u8>),
    /// Zero-length status stage
    Ack,
    /// Request not understood
    Stall,
}

/// Outcome of an interrupt transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataReply {
    Data(Vec<u8>),
    /// Nothing to send right now
    Nak,
    Stall,
}
