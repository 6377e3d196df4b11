//! 校准刺激动画
//!
//! Pure animation math for calibration targets. Sizes are configured in
//! height units and converted to the surface's units before they reach the
//! stimulus.

use std::f64::consts::TAU;

use contracts::{AnimationSettings, ContractError, Point2};
use coords::SurfaceTransform;

/// Anything that can be shown as a calibration target
pub trait CalibrationStimulus {
    /// Center, surface units
    fn set_position(&mut self, position: Point2);

    /// Edge length of the (square) stimulus, surface units
    fn set_size(&mut self, size: f64);

    /// Degrees, clockwise
    fn set_orientation(&mut self, degrees: f64);

    fn draw(&mut self) -> Result<(), ContractError>;
}

/// Animation style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationKind {
    /// Size oscillates between the min and max zoom sizes
    #[default]
    Zoom,
    /// Fixed size, bursts of rapid rotation separated by pauses
    Trill,
}

/// Zoom size (height units) `t` seconds into the animation
pub fn zoom_size(t: f64, settings: &AnimationSettings) -> f64 {
    let phase = (t * settings.zoom_speed).cos();
    let range = settings.max_zoom_size - settings.min_zoom_size;
    settings.min_zoom_size + (phase + 1.0) / 2.0 * range
}

/// Trill rotation (degrees) `t` seconds into the animation
pub fn trill_orientation(t: f64, settings: &AnimationSettings) -> f64 {
    if settings.trill_cycle_duration <= 0.0 {
        return 0.0;
    }
    let cycle_position = t % settings.trill_cycle_duration;
    if cycle_position < settings.trill_active_duration {
        (cycle_position * settings.trill_frequency * TAU).sin() * settings.trill_rotation_range
    } else {
        0.0
    }
}

/// Applies an animation frame to a stimulus
#[derive(Debug, Clone)]
pub struct StimulusAnimator {
    kind: AnimationKind,
    settings: AnimationSettings,
    transform: SurfaceTransform,
}

impl StimulusAnimator {
    pub fn new(kind: AnimationKind, settings: AnimationSettings, transform: SurfaceTransform) -> Self {
        Self {
            kind,
            settings,
            transform,
        }
    }

    pub fn kind(&self) -> AnimationKind {
        self.kind
    }

    /// Position, size and rotate `stimulus` for time `t` (seconds), then draw it
    pub fn animate(
        &self,
        stimulus: &mut dyn CalibrationStimulus,
        position: Point2,
        t: f64,
    ) -> Result<(), ContractError> {
        stimulus.set_position(position);
        match self.kind {
            AnimationKind::Zoom => {
                let size = self.transform.height_to_units(zoom_size(t, &self.settings))?;
                stimulus.set_size(size);
            }
            AnimationKind::Trill => {
                let size = self.transform.height_to_units(self.settings.trill_size)?;
                stimulus.set_size(size);
                stimulus.set_orientation(trill_orientation(t, &self.settings));
            }
        }
        stimulus.draw()
    }
}
