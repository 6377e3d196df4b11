//! Points, coordinate unit tags and presentation-surface geometry.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ContractError;

/// JSON has no NaN: serde_json writes it as `null`, so read `null` back as NaN
pub(crate) fn nan_if_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// 2D point
///
/// Meaning depends on context: hardware-normalized (x,y in [0,1], origin
/// top-left, y down) or presentation units (origin at surface center, y up).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    #[serde(deserialize_with = "nan_if_null")]
    pub x: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub y: f64,
}

impl Point2 {
    /// Invalid point (both components NaN)
    pub const NAN: Point2 = Point2 {
        x: f64::NAN,
        y: f64::NAN,
    };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True when both components are finite numbers
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Default for Point2 {
    fn default() -> Self {
        Self::NAN
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// 3D point in the tracker's user coordinate system (mm) or track box (0-1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    #[serde(deserialize_with = "nan_if_null")]
    pub x: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub y: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub z: f64,
}

impl Point3 {
    pub const NAN: Point3 = Point3 {
        x: f64::NAN,
        y: f64::NAN,
        z: f64::NAN,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl Default for Point3 {
    fn default() -> Self {
        Self::NAN
    }
}

/// Presentation-surface unit systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Units {
    /// Normalized ±1 on both axes
    Normalized,
    /// Unit length equals surface height, aspect preserved
    Height,
    /// Integer pixels, origin at surface center, y up
    Pixel,
    /// Physical length on the monitor (cm)
    Centimeters,
    /// Visual angle (small-angle approximation)
    Degrees,
    /// Visual angle with flat-screen correction
    DegreesFlat,
}

impl Units {
    /// Short tag used in files and configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normalized => "norm",
            Self::Height => "height",
            Self::Pixel => "pix",
            Self::Centimeters => "cm",
            Self::Degrees => "deg",
            Self::DegreesFlat => "degFlat",
        }
    }

    /// Whether converting these units needs a monitor profile
    pub fn is_physical(&self) -> bool {
        matches!(self, Self::Centimeters | Self::Degrees | Self::DegreesFlat)
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "norm" | "normalized" => Ok(Self::Normalized),
            "height" => Ok(Self::Height),
            "pix" | "pixel" | "pixels" => Ok(Self::Pixel),
            "cm" | "centimeters" => Ok(Self::Centimeters),
            "deg" | "degrees" => Ok(Self::Degrees),
            "degFlat" | "degFlatPos" | "degrees_flat" => Ok(Self::DegreesFlat),
            other => Err(ContractError::unsupported_unit(other)),
        }
    }
}

/// Physical monitor description used for cm/degree conversions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonitorProfile {
    /// Visible screen width (cm)
    pub width_cm: f64,
    /// Viewing distance from the eyes to the screen (cm)
    pub distance_cm: f64,
    /// Horizontal resolution of the monitor (pixels)
    pub width_px: u32,
}

/// Presentation surface: pixel size, active units and optional monitor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceGeometry {
    pub width_px: u32,
    pub height_px: u32,
    pub units: Units,
    #[serde(default)]
    pub monitor: Option<MonitorProfile>,
}

impl SurfaceGeometry {
    pub fn new(width_px: u32, height_px: u32, units: Units) -> Self {
        Self {
            width_px,
            height_px,
            units,
            monitor: None,
        }
    }

    pub fn with_monitor(mut self, monitor: MonitorProfile) -> Self {
        self.monitor = Some(monitor);
        self
    }

    /// Width / height
    pub fn aspect(&self) -> f64 {
        self.width_px as f64 / self.height_px as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_from_str() {
        assert_eq!("norm".parse::<Units>().unwrap(), Units::Normalized);
        assert_eq!("pix".parse::<Units>().unwrap(), Units::Pixel);
        assert_eq!("degFlatPos".parse::<Units>().unwrap(), Units::DegreesFlat);
        assert!(matches!(
            "inches".parse::<Units>(),
            Err(ContractError::UnsupportedUnit { .. })
        ));
    }

    #[test]
    fn test_units_serde_snake_case() {
        let json = serde_json::to_string(&Units::DegreesFlat).unwrap();
        assert_eq!(json, "\"degrees_flat\"");
    }

    #[test]
    fn test_point_validity() {
        assert!(Point2::new(0.1, 0.2).is_valid());
        assert!(!Point2::NAN.is_valid());
        assert!(!Point2::new(f64::NAN, 0.2).is_valid());
    }
}
