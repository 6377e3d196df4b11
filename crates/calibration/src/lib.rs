//! # Calibration
//!
//! Screen-based calibration on top of a [`contracts::CalibrationBackend`]:
//! the collect/compute/review retry loop, a pointer-driven backend for
//! running without hardware, calibration blob persistence and the stimulus
//! animation math used by calibration displays.

pub mod animation;
mod pointer_backend;
mod protocol;
mod store;

pub use animation::{
    trill_orientation, zoom_size, AnimationKind, CalibrationStimulus, StimulusAnimator,
};
pub use pointer_backend::PointerCalibrationBackend;
pub use protocol::{
    CalibrationOperator, CalibrationProcedure, CalibrationReport, CollectionState,
    OperatorCommand, ReviewDecision,
};
pub use store::{default_calibration_path, load_calibration, save_calibration};
