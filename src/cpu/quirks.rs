//! Behavior switches for instructions whose meaning differs between
//! historical interpreters.

use serde::{Serialize, Deserialize};
use std::str::FromStr;

/// Which register `8XY6` and `8XYE` shift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftSource {
    /// Shift VY and store the result in VX (original COSMAC VIP).
    #[default]
    Vy,
    /// Shift VX in place and ignore VY (CHIP-48 / SUPER-CHIP).
    Vx,
}

impl FromStr for ShiftSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vy" | "vip" | "legacy" => Ok(ShiftSource::Vy),
            "vx" | "schip" | "modern" => Ok(ShiftSource::Vx),
            other => Err(format!("unknown shift source '{}' (expected vy or vx)", other)),
        }
    }
}

/// Compatibility settings consulted by the executor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quirks {
    pub shift_source: ShiftSource,
}

impl Quirks {
    /// The later CHIP-48 convention.
    pub fn modern() -> Self {
        Self { shift_source: ShiftSource::Vx }
    }
}
