use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Button mask delivered with every pointer sample
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PointerButtons: u32 {
        /// Left button, the pen tip
        const PRIMARY = 0x01;
        /// Right button
        const SECONDARY = 0x02;
        /// Middle button
        const TERTIARY = 0x04;
    }
}

/// A single absolute pointer sample. `x` and `y` are normalised to
/// `0..=input_max` of the active profile; `dz` is a relative wheel delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct PointerEvent {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub dz: i32,
    #[serde(default)]
    pub buttons: u32,
}

impl PointerEvent {
    pub fn new(x: i32, y: i32, dz: i32, buttons: PointerButtons) -> Self {
        Self {
            x,
            y,
            dz,
            buttons: buttons.bits(),
        }
    }

    /// Buttons of the sample, keeping bits without a named flag
    pub fn buttons(&self) -> PointerButtons {
        PointerButtons::from_bits_retain(self.buttons)
    }
}

impl std::str::FromStr for PointerEvent {
    type Err = String;

    /// Parse a sample of the form `x y dz buttons`. Trailing fields may be
    /// omitted and default to zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split_whitespace();
        let mut next = |name: &str, required: bool| -> Result<i64, String> {
            match fields.next() {
                Some(value) => parse_int(value).map_err(|e| format!("invalid {name}: {e}")),
                None if required => Err(format!("missing {name}")),
                None => Ok(0),
            }
        };
        let x = next("x", true)?;
        let y = next("y", true)?;
        let dz = next("dz", false)?;
        let buttons = next("buttons", false)?;

        let to_i32 = |name: &str, v: i64| i32::try_from(v).map_err(|_| format!("{name} out of range"));
        Ok(Self {
            x: to_i32("x", x)?,
            y: to_i32("y", y)?,
            dz: to_i32("dz", dz)?,
            buttons: u32::try_from(buttons).map_err(|_| "buttons out of range".to_string())?,
        })
    }
}

fn parse_int(value: &str) -> Result<i64, std::num::ParseIntError> {
    match value.strip_prefix("0x") {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => value.parse(),
    }
}
