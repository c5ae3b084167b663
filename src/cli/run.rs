use std::{
    error::Error,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use clap::Args;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    time::MissedTickBehavior,
};

use crate::{
    cli::{parse_usb_id, to_hex},
    config::TabletProfile,
    drivers::wacom::{event::PointerEvent, state::Mode},
    input::{
        source::pointer::PointerSource,
        target::{
            request::{ControlReply, DataReply, SetupPacket, CLASS_INTERFACE_OUT},
            tablet::TabletDevice,
        },
    },
};

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Tablet profile name or path to a profile file
    #[arg(long, default_value = "intuos5")]
    pub profile: String,
    /// Override the USB vendor id, e.g. 0x056a
    #[arg(long, value_parser = parse_usb_id)]
    pub vendor_id: Option<u16>,
    /// Override the USB product id
    #[arg(long, value_parser = parse_usb_id)]
    pub product_id: Option<u16>,
    /// Stay in passive mode instead of switching to tablet mode like the
    /// guest driver does on probe
    #[arg(long, action)]
    pub passive: bool,
}

pub async fn handle_run(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let profile =
        TabletProfile::load(args.profile.as_str())?.with_ids(args.vendor_id, args.product_id);
    let pen = profile.endpoint.pen;
    let max_len = profile.endpoint.max_packet_size as usize;
    let interval = Duration::from_millis(profile.endpoint.interval_ms.max(1));

    let source = PointerSource::new();
    let device = Arc::new(Mutex::new(TabletDevice::new(profile, source)));
    let wakeup = lock(&device)?.driver().wakeup();

    if !args.passive {
        let mode = Mode::Active as u8;
        let setup = SetupPacket::new(CLASS_INTERFACE_OUT, 0x09, 0x0300 | mode as u16, 0, 2);
        let reply = lock(&device)?.handle_control(&setup, &[mode, mode]);
        if reply != ControlReply::Ack {
            return Err(format!("Unable to switch tablet mode: {reply:?}").into());
        }
    }

    // Pointer samples arrive on stdin
    let input = tokio::spawn(read_events(device.clone()));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                log::info!("Shutting down");
                break;
            }
            _ = ticker.tick() => (),
            _ = wakeup.notified() => (),
        }

        // Drain everything that became pending
        loop {
            let reply = lock(&device)?.handle_data_in(pen, max_len, Instant::now());
            match reply {
                DataReply::Data(bytes) if !bytes.is_empty() => println!("{}", to_hex(&bytes)),
                DataReply::Data(_) => log::debug!("Pen report did not fit {max_len} bytes"),
                DataReply::Nak | DataReply::Stall => break,
            }
        }
    }

    input.abort();
    let _ = input.await;
    // Last reference, tears the device down and releases the pointer
    drop(device);

    Ok(())
}

async fn read_events(device: Arc<Mutex<TabletDevice>>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("Failed to read pointer samples: {e}");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let event: PointerEvent = match line.parse() {
            Ok(event) => event,
            Err(e) => {
                log::warn!("Ignoring pointer sample '{line}': {e}");
                continue;
            }
        };

        let Ok(mut dev) = device.lock() else {
            log::error!("Tablet device lock is poisoned");
            break;
        };
        dev.push_event(event, Instant::now());
    }
    log::debug!("Pointer input closed");
}

fn lock(device: &Mutex<TabletDevice>) -> Result<MutexGuard<'_, TabletDevice>, Box<dyn Error>> {
    device
        .lock()
        .map_err(|e| format!("Tablet device lock is poisoned: {e}").into())
}
