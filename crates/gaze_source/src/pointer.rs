//! Pointer devices that drive simulated gaze (presentation units).

use std::f64::consts::TAU;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use contracts::{ContractError, Point2, PointerDevice};

/// Pointer that never moves
#[derive(Debug, Clone, Copy)]
pub struct FixedPointer(pub Point2);

impl PointerDevice for FixedPointer {
    fn position(&self) -> Result<Point2, ContractError> {
        Ok(self.0)
    }
}

/// Pointer moved by the foreground (e.g. from window mouse events)
#[derive(Debug, Clone)]
pub struct SharedPointer {
    position: Arc<Mutex<Point2>>,
}

impl SharedPointer {
    pub fn new(initial: Point2) -> Self {
        Self {
            position: Arc::new(Mutex::new(initial)),
        }
    }

    pub fn set(&self, position: Point2) {
        *self.position.lock().unwrap_or_else(PoisonError::into_inner) = position;
    }
}

impl PointerDevice for SharedPointer {
    fn position(&self) -> Result<Point2, ContractError> {
        Ok(*self.position.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Pointer tracing a circle around `center`
#[derive(Debug, Clone)]
pub struct ScriptedPointer {
    center: Point2,
    radius: f64,
    period_s: f64,
    started: Instant,
}

impl ScriptedPointer {
    pub fn circle(center: Point2, radius: f64, period_s: f64) -> Self {
        Self {
            center,
            radius,
            period_s,
            started: Instant::now(),
        }
    }

    /// Position `t` seconds into the script
    pub fn at(&self, t: f64) -> Point2 {
        let phase = if self.period_s > 0.0 {
            TAU * t / self.period_s
        } else {
            0.0
        };
        Point2::new(
            self.center.x + self.radius * phase.cos(),
            self.center.y + self.radius * phase.sin(),
        )
    }
}

impl PointerDevice for ScriptedPointer {
    fn position(&self) -> Result<Point2, ContractError> {
        Ok(self.at(self.started.elapsed().as_secs_f64()))
    }
}
