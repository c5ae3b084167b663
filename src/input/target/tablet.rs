use std::time::Instant;

use packed_struct::PrimitiveEnum;

use crate::{
    config::TabletProfile,
    drivers::wacom::{
        driver::Driver,
        encoder::ReportKind,
        event::PointerEvent,
        hid_report::{ReportSelector, VendorCommand, SET_BLUETOOTH_ADDRESS},
        state::Mode,
    },
    input::source::pointer::PointerSource,
};

use super::request::{ControlReply, ControlRequest, DataReply, RequestError, SetupPacket};

/// Emulated USB Wacom tablet as seen by the transport. Decodes control and
/// interrupt transfers and maps them onto the tablet [Driver].
#[derive(Debug)]
pub struct TabletDevice {
    driver: Driver,
}

impl TabletDevice {
    pub fn new(profile: TabletProfile, source: PointerSource) -> Self {
        log::info!(
            "Creating tablet '{}' ({:04x}:{:04x} {})",
            profile.name,
            profile.vendor_id,
            profile.product_id,
            profile.product
        );
        Self {
            driver: Driver::new(profile, source),
        }
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    /// USB bus reset
    pub fn reset(&mut self) {
        self.driver.reset();
    }

    /// Forward a pointer sample from the host input subsystem
    pub fn push_event(&mut self, event: PointerEvent, now: Instant) -> bool {
        self.driver.push_event(event, now)
    }

    /// Handle a control transfer from its raw SETUP packet and OUT data stage
    pub fn handle_setup(&mut self, setup: &[u8], data: &[u8]) -> Result<ControlReply, RequestError> {
        let setup = SetupPacket::from_bytes(setup)?;
        Ok(self.handle_control(&setup, data))
    }

    /// Handle a decoded control transfer
    pub fn handle_control(&mut self, setup: &SetupPacket, data: &[u8]) -> ControlReply {
        log::trace!("Control request: {}", setup.describe());
        let length = setup.length as usize;
        let request = ControlRequest::from(setup);

        match request {
            ControlRequest::SetReport => self.handle_set_report(data),
            ControlRequest::GetReportOut => {
                ControlReply::Data(self.encode(ReportKind::Mode, length))
            }
            ControlRequest::SetProtocol { protocol } => {
                log::warn!("Ignoring SET_PROTOCOL {protocol}");
                ControlReply::Ack
            }
            ControlRequest::GetReport { selector } => self.handle_get_report(selector, length),
            ControlRequest::GetIdle => {
                let mut rate = vec![self.driver.state().idle_rate];
                rate.truncate(length);
                ControlReply::Data(rate)
            }
            ControlRequest::SetIdle { rate } => {
                log::debug!("Setting idle rate to {rate}");
                self.driver.set_idle_rate(rate);
                ControlReply::Ack
            }
            ControlRequest::ClearEndpointFeature { feature, endpoint } => {
                if feature != 0 {
                    log::warn!("Unsupported CLEAR_FEATURE {feature} on endpoint {endpoint:#04x}");
                }
                ControlReply::Ack
            }
            ControlRequest::Unknown {
                request_type,
                request,
            } => {
                log::warn!("Unknown control request {request_type:#04x} {request:#04x}");
                ControlReply::Stall
            }
        }
    }

    /// Interrupt IN transfer on the given endpoint number
    pub fn handle_data_in(&mut self, endpoint: u8, max_len: usize, now: Instant) -> DataReply {
        let endpoints = self.driver.profile().endpoint;
        if endpoint == endpoints.pen {
            let mut buf = vec![0; max_len];
            match self.driver.poll(now, &mut buf) {
                Some(len) => {
                    buf.truncate(len);
                    DataReply::Data(buf)
                }
                None => DataReply::Nak,
            }
        } else if endpoint == endpoints.touch {
            DataReply::Nak
        } else {
            log::debug!("IN transfer on unknown endpoint {endpoint}");
            DataReply::Stall
        }
    }

    /// Interrupt OUT transfer, the tablet has no OUT endpoints
    pub fn handle_data_out(&mut self, endpoint: u8, data: &[u8]) -> DataReply {
        log::debug!(
            "Rejecting {} byte OUT transfer on endpoint {endpoint}",
            data.len()
        );
        DataReply::Stall
    }

    fn handle_set_report(&mut self, data: &[u8]) -> ControlReply {
        let Some(command) = data.first().copied() else {
            log::warn!("Empty SET_REPORT payload");
            return ControlReply::Stall;
        };

        let Some(command) = VendorCommand::from_primitive(command) else {
            return match self.driver.set_mode_value(command) {
                Ok(_) => ControlReply::Ack,
                Err(e) => {
                    log::debug!("Stalling SET_REPORT: {e}");
                    ControlReply::Stall
                }
            };
        };

        match command {
            VendorCommand::LedControl => log::info!("Ignoring LED control: {data:02x?}"),
            VendorCommand::SetDataRate => {
                if data.get(1) == Some(&SET_BLUETOOTH_ADDRESS) {
                    log::info!("Ignoring Bluetooth address: {data:02x?}");
                } else {
                    log::info!("Ignoring data rate: {data:02x?}");
                }
            }
            VendorCommand::SetScanModePenTouch => log::info!("Ignoring scan mode: {data:02x?}"),
        }
        self.driver.mark_dirty();

        ControlReply::Ack
    }

    /// Reports never span transfers, a `max_len` below the report size
    /// yields an empty reply
    fn handle_get_report(&self, selector: u8, max_len: usize) -> ControlReply {
        let profile = self.driver.profile();
        let report = match ReportSelector::from_primitive(selector) {
            Some(ReportSelector::GetMode) => self.encode(ReportKind::Mode, max_len),
            Some(ReportSelector::GetFirstToolId) if profile.proximity => {
                if self.driver.state().proximity {
                    self.encode(ReportKind::Proximity, max_len)
                } else {
                    Vec::new()
                }
            }
            Some(ReportSelector::GetVersions) if profile.firmware.is_some() => {
                self.encode(ReportKind::Version, max_len)
            }
            // Synchronous pen poll outside the liveness schedule
            _ => {
                if self.driver.state().mode == Mode::Active {
                    self.encode(ReportKind::Pen, max_len)
                } else {
                    Vec::new()
                }
            }
        };

        ControlReply::Data(report)
    }

    fn encode(&self, kind: ReportKind, max_len: usize) -> Vec<u8> {
        let mut buf = vec![0; max_len];
        let len = self.driver.encode(kind, &mut buf);
        buf.truncate(len);
        buf
    }
}
