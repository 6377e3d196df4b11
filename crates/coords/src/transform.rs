//! SurfaceTransform - hardware <-> presentation conversions.

use contracts::{ContractError, MonitorProfile, Point2, SurfaceGeometry, Units};

use crate::monitor::{cm_to_deg, cm_to_pix, deg_to_cm, pix_to_cm};

/// Conversions bound to one presentation surface
///
/// Holds no state besides the surface description; every method is a pure
/// function of its arguments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceTransform {
    geometry: SurfaceGeometry,
}

impl SurfaceTransform {
    pub fn new(geometry: SurfaceGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &SurfaceGeometry {
        &self.geometry
    }

    /// Active unit system of the surface
    pub fn units(&self) -> Units {
        self.geometry.units
    }

    fn size(&self) -> (f64, f64) {
        (self.geometry.width_px as f64, self.geometry.height_px as f64)
    }

    fn monitor(&self, units: Units) -> Result<&MonitorProfile, ContractError> {
        self.geometry
            .monitor
            .as_ref()
            .ok_or_else(|| ContractError::MissingMonitor {
                unit: units.to_string(),
            })
    }

    // ========================================================================
    // Hardware -> presentation
    // ========================================================================

    /// Hardware-normalized point to the surface's active units
    pub fn to_surface(&self, p: Point2) -> Result<Point2, ContractError> {
        self.to_surface_in(p, self.geometry.units)
    }

    /// Hardware-normalized point to explicit units
    pub fn to_surface_in(&self, p: Point2, units: Units) -> Result<Point2, ContractError> {
        let (w, h) = self.size();
        match units {
            Units::Normalized => Ok(Point2::new(2.0 * p.x - 1.0, -2.0 * p.y + 1.0)),
            Units::Height => Ok(Point2::new((p.x - 0.5) * (w / h), -p.y + 0.5)),
            Units::Pixel => Ok(self.hardware_to_pixels(p)),
            Units::Centimeters => {
                let monitor = self.monitor(units)?;
                let pix = self.hardware_to_pixels(p);
                Ok(Point2::new(
                    pix_to_cm(pix.x, monitor),
                    pix_to_cm(pix.y, monitor),
                ))
            }
            Units::Degrees | Units::DegreesFlat => {
                let monitor = self.monitor(units)?;
                let flat = units == Units::DegreesFlat;
                let pix = self.hardware_to_pixels(p);
                Ok(Point2::new(
                    cm_to_deg(pix_to_cm(pix.x, monitor), monitor, flat),
                    cm_to_deg(pix_to_cm(pix.y, monitor), monitor, flat),
                ))
            }
        }
    }

    /// Track-box point (user position guide) to the surface's active units
    ///
    /// The tracker reports the track-box x axis from its own perspective, so
    /// x is mirrored (`-x + 0.5`) relative to the gaze transform.
    pub fn trackbox_to_surface(&self, p: Point2) -> Result<Point2, ContractError> {
        self.to_surface(Point2::new(1.0 - p.x, p.y))
    }

    fn hardware_to_pixels(&self, p: Point2) -> Point2 {
        let (w, h) = self.size();
        Point2::new((w * (p.x - 0.5)).round(), (-h * (p.y - 0.5)).round())
    }

    // ========================================================================
    // Presentation -> hardware
    // ========================================================================

    /// Point in the surface's active units to hardware-normalized
    pub fn to_hardware(&self, p: Point2) -> Result<Point2, ContractError> {
        self.to_hardware_from(p, self.geometry.units)
    }

    /// Point in explicit units to hardware-normalized
    pub fn to_hardware_from(&self, p: Point2, units: Units) -> Result<Point2, ContractError> {
        let (w, h) = self.size();
        match units {
            Units::Normalized => Ok(Point2::new((p.x + 1.0) / 2.0, (1.0 - p.y) / 2.0)),
            Units::Height => Ok(Point2::new(p.x * (h / w) + 0.5, 0.5 - p.y)),
            Units::Pixel => Ok(self.pixels_to_hardware(p)),
            Units::Centimeters => {
                let monitor = self.monitor(units)?;
                Ok(self.pixels_to_hardware(Point2::new(
                    cm_to_pix(p.x, monitor).round(),
                    cm_to_pix(p.y, monitor).round(),
                )))
            }
            Units::Degrees | Units::DegreesFlat => {
                let monitor = self.monitor(units)?;
                let flat = units == Units::DegreesFlat;
                Ok(self.pixels_to_hardware(Point2::new(
                    cm_to_pix(deg_to_cm(p.x, monitor, flat), monitor).round(),
                    cm_to_pix(deg_to_cm(p.y, monitor, flat), monitor).round(),
                )))
            }
        }
    }

    fn pixels_to_hardware(&self, p: Point2) -> Point2 {
        let (w, h) = self.size();
        Point2::new(p.x / w + 0.5, 0.5 - p.y / h)
    }

    // ========================================================================
    // Sizes and image pixels
    // ========================================================================

    /// Length given as a fraction of surface height, in the active units
    pub fn height_to_units(&self, size: f64) -> Result<f64, ContractError> {
        self.height_to(size, self.geometry.units)
    }

    /// Length given as a fraction of surface height, in explicit units
    pub fn height_to(&self, size: f64, units: Units) -> Result<f64, ContractError> {
        let (_, h) = self.size();
        match units {
            Units::Height => Ok(size),
            Units::Normalized => Ok(size * 2.0),
            Units::Pixel => Ok(size * h),
            Units::Centimeters => Ok(pix_to_cm(size * h, self.monitor(units)?)),
            Units::Degrees | Units::DegreesFlat => {
                let monitor = self.monitor(units)?;
                Ok(cm_to_deg(
                    pix_to_cm(size * h, monitor),
                    monitor,
                    units == Units::DegreesFlat,
                ))
            }
        }
    }

    /// Point in active units to integer image pixels (origin top-left, y down)
    pub fn surface_to_image_pixels(&self, p: Point2) -> Result<(i64, i64), ContractError> {
        let (w, h) = self.size();
        let hw = self.to_hardware(p)?;
        Ok(((hw.x * w).round() as i64, (hw.y * h).round() as i64))
    }
}
