//! GazeSample - producer output
//!
//! One hardware or simulated reading. Never mutated after creation.

use serde::{Deserialize, Serialize};

use crate::geometry::nan_if_null;
use crate::{Point2, Point3};

/// Per-eye part of a gaze sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeData {
    /// Gaze point in hardware-normalized coordinates (NaN when invalid)
    pub gaze_point_on_display_area: Point2,

    /// Gaze point in the tracker's user coordinate system (mm)
    #[serde(default)]
    pub gaze_point_in_user_coordinate_system: Point3,

    pub gaze_point_validity: bool,

    /// Pupil diameter (mm), NaN when invalid
    #[serde(deserialize_with = "nan_if_null")]
    pub pupil_diameter: f64,

    pub pupil_validity: bool,

    /// Eye position in the user coordinate system (mm)
    #[serde(default)]
    pub gaze_origin_in_user_coordinate_system: Point3,

    /// Eye position in the track box (0-1 per axis)
    #[serde(default)]
    pub gaze_origin_in_trackbox_coordinate_system: Point3,

    #[serde(default)]
    pub gaze_origin_validity: bool,
}

impl EyeData {
    /// Eye with no usable data
    pub fn invalid() -> Self {
        Self {
            gaze_point_on_display_area: Point2::NAN,
            gaze_point_in_user_coordinate_system: Point3::NAN,
            gaze_point_validity: false,
            pupil_diameter: f64::NAN,
            pupil_validity: false,
            gaze_origin_in_user_coordinate_system: Point3::NAN,
            gaze_origin_in_trackbox_coordinate_system: Point3::NAN,
            gaze_origin_validity: false,
        }
    }

    /// Valid eye looking at `point` with only the fields a minimal producer supplies
    pub fn looking_at(point: Point2) -> Self {
        Self {
            gaze_point_on_display_area: point,
            gaze_point_validity: true,
            ..Self::invalid()
        }
    }
}

/// Optional user-position-guide data, only used for track-box visualization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserPosition {
    pub left: Point3,
    pub left_validity: bool,
    pub right: Point3,
    pub right_validity: bool,
}

/// One gaze reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazeSample {
    /// Opaque hardware clock (µs)
    pub device_time_stamp: i64,

    /// Monotonic system clock (µs) - ordering and merge key
    pub system_time_stamp: i64,

    pub left: EyeData,

    pub right: EyeData,

    /// Pass-through user-position-guide fields (not recorded)
    #[serde(default)]
    pub user_position: Option<UserPosition>,
}

impl GazeSample {
    /// Both eyes' hardware-normalized gaze points
    pub fn gaze_pair(&self) -> GazePair {
        GazePair {
            left: self.left.gaze_point_on_display_area,
            right: self.right.gaze_point_on_display_area,
        }
    }
}

/// Two-eye gaze-point pair held by the rolling buffer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazePair {
    pub left: Point2,
    pub right: Point2,
}
