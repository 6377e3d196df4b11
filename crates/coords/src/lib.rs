//! # Coords
//!
//! Stateless conversion between the tracker's coordinate systems and the
//! presentation surface's unit systems.
//!
//! ## Coordinate systems
//! - Hardware-normalized: x,y in [0,1], origin top-left, y down
//! - Track box: like hardware-normalized but x mirrored (device perspective)
//! - Presentation units: origin at surface center, y up, in `Units`
//! - Image pixels: integer, origin top-left, y down

mod monitor;
mod transform;

pub use monitor::{cm_to_deg, cm_to_pix, deg_to_cm, pix_to_cm};
pub use transform::SurfaceTransform;
