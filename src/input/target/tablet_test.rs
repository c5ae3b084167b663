use std::{
    error::Error,
    time::{Duration, Instant},
};

use crate::{
    config::TabletProfile,
    drivers::wacom::{
        event::{PointerButtons, PointerEvent},
        state::Mode,
    },
    input::{
        source::pointer::PointerSource,
        target::{
            request::{ControlReply, DataReply, SetupPacket},
            tablet::TabletDevice,
        },
    },
};

fn set_report(device: &mut TabletDevice, data: &[u8]) -> ControlReply {
    let setup = SetupPacket::new(0x21, 0x09, 0x0300 | data[0] as u16, 0, data.len() as u16);
    device.handle_control(&setup, data)
}

fn get_report(device: &mut TabletDevice, selector: u8) -> ControlReply {
    let setup = SetupPacket::new(0xa1, 0x01, 0x0300 | selector as u16, 0, 64);
    device.handle_control(&setup, &[])
}

fn intuos() -> (TabletDevice, PointerSource) {
    let source = PointerSource::new();
    (TabletDevice::new(TabletProfile::intuos5(), source.clone()), source)
}

fn bamboo() -> (TabletDevice, PointerSource) {
    let source = PointerSource::new();
    (TabletDevice::new(TabletProfile::bamboo(), source.clone()), source)
}

/// Drain everything currently scheduled on the pen endpoint
fn drain(device: &mut TabletDevice, now: Instant) {
    let pen = device.driver().profile().endpoint.pen;
    while device.handle_data_in(pen, 64, now) != DataReply::Nak {}
}

#[test]
fn test_set_report_switches_mode() {
    let (mut device, source) = intuos();
    assert_eq!(set_report(&mut device, &[0x02, 0x00]), ControlReply::Ack);
    assert_eq!(device.driver().state().mode, Mode::Active);
    assert_eq!(source.len(), 1);

    assert_eq!(get_report(&mut device, 0x02), ControlReply::Data(vec![0x00, 0x02]));

    assert_eq!(set_report(&mut device, &[0x01]), ControlReply::Ack);
    assert_eq!(device.driver().state().mode, Mode::Passive);
    assert!(source.is_empty());
}

#[test]
fn test_set_report_rejects_unknown_values() {
    let (mut device, _source) = intuos();
    set_report(&mut device, &[0x02]);
    let before = device.driver().state().clone();

    assert_eq!(set_report(&mut device, &[0x03]), ControlReply::Stall);
    assert_eq!(set_report(&mut device, &[0x00]), ControlReply::Stall);
    let empty = SetupPacket::new(0x21, 0x09, 0x0300, 0, 0);
    assert_eq!(device.handle_control(&empty, &[]), ControlReply::Stall);
    assert_eq!(device.driver().state(), &before);
}

#[test]
fn test_vendor_commands_force_announce() {
    let now = Instant::now();
    for command in [vec![0x20, 0x01], vec![0x04, 0x00], vec![0x04, 0x01, 0xaa], vec![0x0d, 0x02]] {
        let (mut device, _source) = intuos();
        set_report(&mut device, &[0x02]);
        drain(&mut device, now);

        assert_eq!(set_report(&mut device, &command), ControlReply::Ack);
        let state = device.driver().state();
        assert!(state.dirty_pen, "{command:02x?}");
        assert!(state.dirty_proximity, "{command:02x?}");
        assert_eq!(state.mode, Mode::Active);
    }

    let (mut device, _source) = bamboo();
    assert_eq!(set_report(&mut device, &[0x20]), ControlReply::Ack);
    assert!(device.driver().state().dirty_pen);
    assert!(!device.driver().state().dirty_proximity);
}

#[test]
fn test_get_report_out_quirk() {
    let (mut device, _source) = bamboo();
    let setup = SetupPacket::new(0x21, 0x01, 0x0302, 0, 2);
    assert_eq!(
        device.handle_control(&setup, &[]),
        ControlReply::Data(vec![0x00, 0x01])
    );
}

#[test]
fn test_first_tool_id_only_in_proximity() {
    let now = Instant::now();
    let (mut device, _source) = intuos();
    set_report(&mut device, &[0x02]);
    assert_eq!(get_report(&mut device, 0x05), ControlReply::Data(vec![]));

    device.push_event(PointerEvent::new(100, 100, 0, PointerButtons::empty()), now);
    assert_eq!(
        get_report(&mut device, 0x05),
        ControlReply::Data(vec![0x02, 0xc2, 0x80, 0x2f, 0xee, 0xdc, 0x0d, 0xe0, 0x00])
    );
}

#[test]
fn test_get_versions() {
    let (mut device, _source) = intuos();
    assert_eq!(
        get_report(&mut device, 0x07),
        ControlReply::Data(vec![0x0a, 0x00, 0x00, 0x12, 0x11, 0x12, 0x12, 0x11, 0x00, 0x00])
    );
}

#[test]
fn test_default_selector_polls_pen() {
    let now = Instant::now();
    let (mut device, _source) = bamboo();
    assert_eq!(get_report(&mut device, 0x03), ControlReply::Data(vec![]));

    set_report(&mut device, &[0x02]);
    device.push_event(PointerEvent::new(16384, 16384, 0, PointerButtons::PRIMARY), now);
    let expected = vec![0x02, 0xe1, 0xc0, 0x1c, 0xf8, 0x11, 0x00, 0x02, 0x00];
    assert_eq!(get_report(&mut device, 0x03), ControlReply::Data(expected.clone()));
    // Simple models have no version report
    assert_eq!(get_report(&mut device, 0x07), ControlReply::Data(expected));

    // The synchronous poll leaves the interrupt schedule alone
    assert!(device.driver().state().dirty_pen);
}

#[test]
fn test_short_get_report_yields_nothing() {
    let now = Instant::now();
    let (mut device, _source) = intuos();
    set_report(&mut device, &[0x02]);
    device.push_event(PointerEvent::new(16384, 16384, 0, PointerButtons::PRIMARY), now);

    let cases = [(0x03, 5), (0x03, 9), (0x05, 8), (0x07, 4), (0x02, 1)];
    for (selector, length) in cases {
        let setup = SetupPacket::new(0xa1, 0x01, 0x0300 | selector, 0, length);
        assert_eq!(
            device.handle_control(&setup, &[]),
            ControlReply::Data(vec![]),
            "selector {selector:#04x} wLength {length}"
        );
    }

    // A larger buffer still carries only the report
    let setup = SetupPacket::new(0xa1, 0x01, 0x0307, 0, 64);
    let ControlReply::Data(report) = device.handle_control(&setup, &[]) else {
        panic!("expected version report");
    };
    assert_eq!(report.len(), 10);
}

#[test]
fn test_idle_rate() {
    let (mut device, _source) = bamboo();
    let set_idle = SetupPacket::new(0x21, 0x0a, 0x7d00, 0, 0);
    assert_eq!(device.handle_control(&set_idle, &[]), ControlReply::Ack);

    let get_idle = SetupPacket::new(0xa1, 0x02, 0, 0, 1);
    assert_eq!(
        device.handle_control(&get_idle, &[]),
        ControlReply::Data(vec![0x7d])
    );
    assert_eq!(device.driver().state().mode, Mode::Passive);
}

#[test]
fn test_ack_and_stall() -> Result<(), Box<dyn Error>> {
    let (mut device, _source) = bamboo();
    let set_protocol = [0x21, 0x0b, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
    assert_eq!(device.handle_setup(&set_protocol, &[])?, ControlReply::Ack);

    let clear_halt = [0x02, 0x01, 0x00, 0x00, 0x81, 0x00, 0x00, 0x00];
    assert_eq!(device.handle_setup(&clear_halt, &[])?, ControlReply::Ack);
    let clear_other = [0x02, 0x01, 0x01, 0x00, 0x81, 0x00, 0x00, 0x00];
    assert_eq!(device.handle_setup(&clear_other, &[])?, ControlReply::Ack);

    let get_protocol = [0xa1, 0x03, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00];
    assert_eq!(device.handle_setup(&get_protocol, &[])?, ControlReply::Stall);
    let vendor = [0x40, 0x09, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
    assert_eq!(device.handle_setup(&vendor, &[])?, ControlReply::Stall);

    assert!(device.handle_setup(&[0x21, 0x09], &[0x02]).is_err());
    assert_eq!(device.driver().state().mode, Mode::Passive);

    Ok(())
}

#[test]
fn test_data_routing() {
    let now = Instant::now();
    let (mut device, _source) = intuos();
    let (pen, touch) = (3, 2);

    assert_eq!(device.handle_data_in(pen, 64, now), DataReply::Nak);
    set_report(&mut device, &[0x02]);
    assert_eq!(
        device.handle_data_in(pen, 64, now),
        DataReply::Data(vec![0x02, 0x80, 0x80, 0x2f, 0xee, 0xdc, 0x0d, 0xe0, 0x00])
    );
    assert_eq!(device.handle_data_in(touch, 64, now), DataReply::Nak);
    assert_eq!(device.handle_data_in(1, 64, now), DataReply::Stall);
    assert_eq!(device.handle_data_out(pen, &[0x00]), DataReply::Stall);

    // Packet too small for the pen report
    assert_eq!(device.handle_data_in(pen, 8, now), DataReply::Data(vec![]));
    assert_eq!(device.handle_data_in(pen, 64, now), DataReply::Nak);
}

#[test]
fn test_reset_returns_to_passive() {
    let now = Instant::now();
    let (mut device, source) = intuos();
    set_report(&mut device, &[0x02]);
    device.push_event(PointerEvent::new(16384, 16384, 1, PointerButtons::PRIMARY), now);

    device.reset();
    let state = device.driver().state();
    assert_eq!(state.mode, Mode::Passive);
    assert_eq!((state.x, state.y, state.wheel), (0, 0, 0));
    assert!(!state.proximity);
    assert!(source.is_empty());
    assert_eq!(
        device.handle_data_in(3, 64, now + Duration::from_secs(1)),
        DataReply::Nak
    );
}
