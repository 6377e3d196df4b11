//! Monitor-calibration math: pixels <-> centimeters <-> visual degrees.

use contracts::MonitorProfile;

/// Small-angle degrees-per-cm factor at unit distance (tan(1°) ≈ 0.017455)
const DEG_PER_CM_UNIT: f64 = 0.017455;

/// Pixels on the monitor to centimeters
pub fn pix_to_cm(pix: f64, monitor: &MonitorProfile) -> f64 {
    pix * monitor.width_cm / monitor.width_px as f64
}

/// Centimeters to monitor pixels (unrounded)
pub fn cm_to_pix(cm: f64, monitor: &MonitorProfile) -> f64 {
    cm * monitor.width_px as f64 / monitor.width_cm
}

/// Centimeters to degrees of visual angle
///
/// `flat` applies the flat-screen correction: each component is the angle
/// subtended from the screen center rather than the small-angle estimate.
pub fn cm_to_deg(cm: f64, monitor: &MonitorProfile, flat: bool) -> f64 {
    if flat {
        (cm / monitor.distance_cm).atan().to_degrees()
    } else {
        cm / (monitor.distance_cm * DEG_PER_CM_UNIT)
    }
}

/// Degrees of visual angle to centimeters
pub fn deg_to_cm(deg: f64, monitor: &MonitorProfile, flat: bool) -> f64 {
    if flat {
        deg.to_radians().tan() * monitor.distance_cm
    } else {
        deg * monitor.distance_cm * DEG_PER_CM_UNIT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> MonitorProfile {
        MonitorProfile {
            width_cm: 53.0,
            distance_cm: 60.0,
            width_px: 1920,
        }
    }

    #[test]
    fn test_pix_cm_inverse() {
        let m = monitor();
        let cm = pix_to_cm(960.0, &m);
        assert!((cm - 26.5).abs() < 1e-12);
        assert!((cm_to_pix(cm, &m) - 960.0).abs() < 1e-9);
    }

    #[test]
    fn test_deg_small_angle_vs_flat() {
        let m = monitor();
        // Near the center both agree closely
        let small = cm_to_deg(1.0, &m, false);
        let flat = cm_to_deg(1.0, &m, true);
        assert!((small - flat).abs() < 0.01);

        // Far out the flat correction yields fewer degrees per cm
        assert!(cm_to_deg(30.0, &m, true) < cm_to_deg(30.0, &m, false));

        for flat in [false, true] {
            let deg = cm_to_deg(12.5, &m, flat);
            assert!((deg_to_cm(deg, &m, flat) - 12.5).abs() < 1e-9);
        }
    }
}
