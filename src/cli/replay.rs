use std::{
    error::Error,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use serde::Deserialize;
use tabled::settings::{Panel, Style};
use tabled::{Table, Tabled};
use thiserror::Error;

use crate::{
    cli::to_hex,
    config::{LoadError, TabletProfile},
    drivers::wacom::event::PointerEvent,
    input::{
        source::pointer::PointerSource,
        target::{
            request::{ControlReply, DataReply, RequestError},
            tablet::TabletDevice,
        },
    },
};

/// Profile used when neither the script nor the command line names one
pub const DEFAULT_PROFILE: &str = "intuos5";

/// Possible errors replaying a script
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Could not read script: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Unable to deserialize script: {0}")]
    DeserializeError(#[from] serde_yaml::Error),
    #[error("Unable to load profile: {0}")]
    ProfileError(#[from] LoadError),
    #[error("Step {step}: {source}")]
    RequestError {
        step: usize,
        #[source]
        source: RequestError,
    },
    #[error("Step {step} at {at_ms}ms goes back in time")]
    OutOfOrder { step: usize, at_ms: u64 },
}

/// A replay script
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Script {
    /// Profile name or path
    pub profile: Option<String>,
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_yaml(content: &str) -> Result<Script, ReplayError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Script, ReplayError> {
        let file = std::fs::File::open(path)?;
        Ok(serde_yaml::from_reader(file)?)
    }
}

/// A single step, executed `at_ms` milliseconds after the start of the replay
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Step {
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Pointer sample from the host
    Event(PointerEvent),
    /// Interrupt IN transfer, defaults to the pen endpoint and the max
    /// packet size of the profile
    Poll {
        #[serde(default)]
        endpoint: Option<u8>,
        #[serde(default)]
        max_len: Option<usize>,
    },
    /// Control transfer from a raw SETUP packet and OUT data stage
    Control {
        setup: Vec<u8>,
        #[serde(default)]
        data: Vec<u8>,
    },
    /// USB bus reset
    Reset,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Event(_) => "event",
            Action::Poll { .. } => "poll",
            Action::Control { .. } => "control",
            Action::Reset => "reset",
        }
    }
}

/// Outcome of a replayed step
#[derive(Tabled, Debug, Clone, PartialEq)]
pub struct ReplayRow {
    #[tabled(rename = "Time (ms)")]
    pub at_ms: u64,
    #[tabled(rename = "Step")]
    pub step: String,
    #[tabled(rename = "Result")]
    pub result: String,
    #[tabled(rename = "Mode")]
    pub mode: String,
    #[tabled(rename = "Proximity")]
    pub proximity: bool,
}

/// Run all steps of the script against a fresh device. Time is injected as
/// `start + at_ms` so results do not depend on the wall clock.
pub fn replay(
    script: &Script,
    profile: TabletProfile,
    start: Instant,
) -> Result<Vec<ReplayRow>, ReplayError> {
    let source = PointerSource::new();
    let mut device = TabletDevice::new(profile, source);
    let endpoint = device.driver().profile().endpoint;

    let mut rows = Vec::with_capacity(script.steps.len());
    let mut last_ms = 0;
    for (i, step) in script.steps.iter().enumerate() {
        if step.at_ms < last_ms {
            return Err(ReplayError::OutOfOrder {
                step: i,
                at_ms: step.at_ms,
            });
        }
        last_ms = step.at_ms;
        let now = start + Duration::from_millis(step.at_ms);

        let result = match &step.action {
            Action::Event(event) => {
                if device.push_event(*event, now) {
                    format!("applied {} {}", event.x, event.y)
                } else {
                    "dropped".to_string()
                }
            }
            Action::Poll {
                endpoint: ep,
                max_len,
            } => {
                let ep = ep.unwrap_or(endpoint.pen);
                let max_len = max_len.unwrap_or(endpoint.max_packet_size as usize);
                match device.handle_data_in(ep, max_len, now) {
                    DataReply::Data(bytes) => data_result(&bytes),
                    DataReply::Nak => "NAK".to_string(),
                    DataReply::Stall => "STALL".to_string(),
                }
            }
            Action::Control { setup, data } => {
                let reply = device
                    .handle_setup(setup, data)
                    .map_err(|source| ReplayError::RequestError { step: i, source })?;
                match reply {
                    ControlReply::Data(bytes) => data_result(&bytes),
                    ControlReply::Ack => "ACK".to_string(),
                    ControlReply::Stall => "STALL".to_string(),
                }
            }
            Action::Reset => {
                device.reset();
                "reset".to_string()
            }
        };

        let state = device.driver().state();
        rows.push(ReplayRow {
            at_ms: step.at_ms,
            step: step.action.name().to_string(),
            result,
            mode: state.mode.to_string(),
            proximity: state.proximity,
        });
    }

    Ok(rows)
}

fn data_result(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        "(empty)".to_string()
    } else {
        to_hex(bytes)
    }
}

pub fn handle_replay(path: PathBuf, profile: Option<String>) -> Result<(), Box<dyn Error>> {
    let script = Script::from_yaml_file(&path)?;
    let name = profile
        .or_else(|| script.profile.clone())
        .unwrap_or_else(|| DEFAULT_PROFILE.to_string());
    let profile = TabletProfile::load(name.as_str()).map_err(ReplayError::from)?;
    log::debug!("Replaying {path:?} with profile '{}'", profile.name);

    let rows = replay(&script, profile, Instant::now())?;
    let count = rows.len();

    let mut table = Table::new(rows);
    table
        .with(Style::modern_rounded())
        .with(Panel::header(format!("Replay of {}", path.display())));
    println!("{table}");
    println!("Replayed {count} step(s)");

    Ok(())
}
