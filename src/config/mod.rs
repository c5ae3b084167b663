pub mod path;

#[cfg(test)]
mod config_test;

use std::{
    fmt::Display,
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Normalised ceiling of incoming absolute pointer samples
pub const DEFAULT_INPUT_MAX: i32 = 0x7FFF;

/// Represents all possible errors loading a [TabletProfile]
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not read: {0}")]
    IoError(#[from] io::Error),
    #[error("Unable to deserialize: {0}")]
    DeserializeError(#[from] serde_yaml::Error),
    #[error("Invalid profile: {0}")]
    InvalidProfile(#[from] ProfileError),
    #[error("No profile found with name or path `{0}`")]
    NotFound(String),
}

/// Reasons a [TabletProfile] can be rejected
#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("resolution must be non-zero, got {x}x{y}")]
    ZeroResolution { x: u32, y: u32 },
    #[error("input_max must be greater than zero")]
    ZeroInputMax,
    #[error("the `{0}` report layout requires a pressure range")]
    MissingPressure(ReportLayout),
    #[error("the `{0}` report layout has no proximity report")]
    ProximityUnsupported(ReportLayout),
    #[error("pressure range is invalid: min {min}, initial {initial}, max {max}")]
    InvalidPressure { min: i32, initial: i32, max: i32 },
    #[error("ping interval must be non-zero")]
    ZeroPingInterval,
    #[error("resolution {resolution} does not fit the {bits}-bit coordinate fields of the `{layout}` report")]
    ResolutionTooLarge {
        resolution: u32,
        layout: ReportLayout,
        bits: u32,
    },
    #[error("pressure range {min}..={max} does not fit the {bits}-bit pressure field of the `{layout}` report")]
    PressureOutOfRange {
        min: i32,
        max: i32,
        layout: ReportLayout,
        bits: u32,
    },
    #[error("proximity tracking requires a tool identity")]
    MissingTool,
}

/// Byte layout family used for the pen report of a tablet model
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportLayout {
    /// 9-byte pen report with 16-bit little-endian coordinates and two-level
    /// pressure (Bamboo family).
    Penabled,
    /// 10-byte pen report with 17-bit coordinates, 11-bit pressure, tilt and
    /// distance (Intuos family).
    Intuos,
}

impl ReportLayout {
    /// Width of the coordinate fields in the pen report
    pub fn coordinate_bits(&self) -> u32 {
        match self {
            ReportLayout::Penabled => 16,
            ReportLayout::Intuos => 17,
        }
    }

    /// Width of the pressure field in the pen report
    pub fn pressure_bits(&self) -> u32 {
        match self {
            ReportLayout::Penabled => 16,
            ReportLayout::Intuos => 11,
        }
    }
}

impl Display for ReportLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportLayout::Penabled => write!(f, "penabled"),
            ReportLayout::Intuos => write!(f, "intuos"),
        }
    }
}

/// Pressure range of pressure-sensitive models. The wheel acts as a pressure
/// slider, each wheel step moving the pressure by `wheel_step`.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct PressureConfig {
    pub min: i32,
    pub max: i32,
    pub initial: i32,
    pub wheel_step: i32,
}

/// Liveness timers
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct TimingConfig {
    /// Maximum silence on the pen endpoint before a refresh report is forced
    pub ping_interval_ms: u64,
    /// Idle time after which the pen is considered lifted out of proximity
    pub leave_timeout_ms: Option<u64>,
}

impl TimingConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    pub fn leave_timeout(&self) -> Option<Duration> {
        self.leave_timeout_ms.map(Duration::from_millis)
    }
}

/// Identity of the simulated stylus announced on proximity entry
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct ToolConfig {
    pub tool_id: u32,
    pub serial: u32,
}

/// Firmware versions echoed by the version report
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct FirmwareConfig {
    /// 24-bit pen firmware version, e.g. 0x121112 for 18.1.1.18
    pub pen_version: u32,
    pub touch_version: u16,
}

/// Interrupt endpoints of the emulated device
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct EndpointConfig {
    pub pen: u8,
    pub touch: u8,
    pub max_packet_size: u16,
    pub interval_ms: u64,
}

/// Complete description of an emulated tablet model.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct TabletProfile {
    pub name: String,
    pub manufacturer: String,
    pub product: String,
    pub vendor_id: u16,
    pub product_id: u16,
    pub bcd_device: u16,
    pub layout: ReportLayout,
    pub proximity: bool,
    pub resolution_x: u32,
    pub resolution_y: u32,
    #[serde(default = "default_input_max")]
    pub input_max: i32,
    pub pressure: Option<PressureConfig>,
    pub timing: TimingConfig,
    pub tool: Option<ToolConfig>,
    pub firmware: Option<FirmwareConfig>,
    pub endpoint: EndpointConfig,
}

fn default_input_max() -> i32 {
    DEFAULT_INPUT_MAX
}

impl TabletProfile {
    /// Wacom Bamboo CTL-460: low resolution, no proximity tracking
    pub fn bamboo() -> Self {
        Self {
            name: "bamboo".to_string(),
            manufacturer: "Wacom Co.,Ltd.".to_string(),
            product: "CTL-460".to_string(),
            vendor_id: 0x056a,
            product_id: 0x00d4,
            bcd_device: 0x0106,
            layout: ReportLayout::Penabled,
            proximity: false,
            resolution_x: 14720,
            resolution_y: 9200,
            input_max: DEFAULT_INPUT_MAX,
            pressure: None,
            timing: TimingConfig {
                ping_interval_ms: 100,
                leave_timeout_ms: None,
            },
            tool: None,
            firmware: None,
            endpoint: EndpointConfig {
                pen: 1,
                touch: 2,
                max_packet_size: 9,
                interval_ms: 4,
            },
        }
    }

    /// Wacom Intuos 5 Touch Medium PTH-650: high resolution, proximity aware
    pub fn intuos5() -> Self {
        Self {
            name: "intuos5".to_string(),
            manufacturer: "Wacom Co.,Ltd.".to_string(),
            product: "Intuos5 touch M".to_string(),
            vendor_id: 0x056a,
            product_id: 0x0027,
            bcd_device: 0x0107,
            layout: ReportLayout::Intuos,
            proximity: true,
            resolution_x: 44704,
            resolution_y: 27940,
            input_max: DEFAULT_INPUT_MAX,
            pressure: Some(PressureConfig {
                min: 128,
                max: (1 << 11) - 1,
                initial: 890,
                wheel_step: 128,
            }),
            timing: TimingConfig {
                ping_interval_ms: 200,
                leave_timeout_ms: Some(5000),
            },
            // Intuos4/5 13HD/24HD General Pen
            tool: Some(ToolConfig {
                tool_id: 0x802,
                serial: 0xFEEDC0DE,
            }),
            firmware: Some(FirmwareConfig {
                pen_version: 0x121112,
                touch_version: 0x1211,
            }),
            endpoint: EndpointConfig {
                pen: 3,
                touch: 2,
                max_packet_size: 64,
                interval_ms: 4,
            },
        }
    }

    /// Returns all profiles compiled into the binary
    pub fn builtin() -> Vec<TabletProfile> {
        vec![TabletProfile::bamboo(), TabletProfile::intuos5()]
    }

    /// Returns the built-in profile with the given name
    pub fn builtin_by_name(name: &str) -> Option<TabletProfile> {
        TabletProfile::builtin()
            .into_iter()
            .find(|profile| profile.name == name)
    }

    /// Load a [TabletProfile] from the given YAML string
    pub fn from_yaml(content: String) -> Result<TabletProfile, LoadError> {
        let profile: TabletProfile = serde_yaml::from_str(content.as_str())?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load a [TabletProfile] from the given YAML file
    pub fn from_yaml_file(path: &Path) -> Result<TabletProfile, LoadError> {
        let file = std::fs::File::open(path)?;
        let profile: TabletProfile = serde_yaml::from_reader(file)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Resolve a profile from a built-in name, a path to a YAML file, or
    /// `<name>.yaml` inside one of the profile search directories.
    pub fn load(name_or_path: &str) -> Result<TabletProfile, LoadError> {
        if let Some(profile) = TabletProfile::builtin_by_name(name_or_path) {
            return Ok(profile);
        }

        let path = PathBuf::from(name_or_path);
        if path.is_file() {
            return TabletProfile::from_yaml_file(&path);
        }

        for dir in path::get_profiles_paths() {
            let candidate = dir.join(format!("{name_or_path}.yaml"));
            if candidate.is_file() {
                log::debug!("Loading tablet profile from {candidate:?}");
                return TabletProfile::from_yaml_file(&candidate);
            }
        }

        Err(LoadError::NotFound(name_or_path.to_string()))
    }

    /// Check that the profile describes a device the encoder can represent.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.resolution_x == 0 || self.resolution_y == 0 {
            return Err(ProfileError::ZeroResolution {
                x: self.resolution_x,
                y: self.resolution_y,
            });
        }
        let bits = self.layout.coordinate_bits();
        for resolution in [self.resolution_x, self.resolution_y] {
            if resolution > 1 << bits {
                return Err(ProfileError::ResolutionTooLarge {
                    resolution,
                    layout: self.layout,
                    bits,
                });
            }
        }
        if self.input_max <= 0 {
            return Err(ProfileError::ZeroInputMax);
        }
        if self.timing.ping_interval_ms == 0 {
            return Err(ProfileError::ZeroPingInterval);
        }

        match self.layout {
            ReportLayout::Penabled => {
                if self.proximity {
                    return Err(ProfileError::ProximityUnsupported(self.layout));
                }
            }
            ReportLayout::Intuos => {
                let Some(pressure) = self.pressure else {
                    return Err(ProfileError::MissingPressure(self.layout));
                };
                if pressure.min > pressure.initial || pressure.initial > pressure.max {
                    return Err(ProfileError::InvalidPressure {
                        min: pressure.min,
                        initial: pressure.initial,
                        max: pressure.max,
                    });
                }
                let bits = self.layout.pressure_bits();
                if pressure.min < 0 || pressure.max >= 1 << bits {
                    return Err(ProfileError::PressureOutOfRange {
                        min: pressure.min,
                        max: pressure.max,
                        layout: self.layout,
                        bits,
                    });
                }
            }
        }
        if self.proximity && self.tool.is_none() {
            return Err(ProfileError::MissingTool);
        }

        Ok(())
    }

    /// Override the USB vendor and/or product id, e.g. to impersonate a
    /// sibling model that the guest driver recognizes.
    pub fn with_ids(mut self, vendor_id: Option<u16>, product_id: Option<u16>) -> Self {
        if let Some(vid) = vendor_id {
            self.vendor_id = vid;
        }
        if let Some(pid) = product_id {
            self.product_id = pid;
        }
        self
    }
}
