//! Fixed-capacity window of recent two-eye gaze points.

use std::fmt;

use contracts::{ContractError, GazePair, RollingWindow};
use ringbuf::{traits::*, HeapRb};

/// Ring buffer of the most recent gaze pairs
///
/// When full, pushing overwrites the oldest entry.
pub struct RollingBuffer {
    ring: HeapRb<GazePair>,
    capacity: usize,
    overwritten: u64,
}

impl fmt::Debug for RollingBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RollingBuffer")
            .field("len", &self.ring.occupied_len())
            .field("capacity", &self.capacity)
            .field("overwritten", &self.overwritten)
            .finish()
    }
}

impl RollingBuffer {
    /// Create a window holding `capacity` pairs
    pub fn new(capacity: usize) -> Result<Self, ContractError> {
        if capacity == 0 {
            return Err(ContractError::InvalidBufferSize {
                message: "window must hold at least one sample".to_string(),
            });
        }
        Ok(Self {
            ring: HeapRb::new(capacity),
            capacity,
            overwritten: 0,
        })
    }

    #[inline]
    pub fn push(&mut self, pair: GazePair) {
        if self.ring.push_overwrite(pair).is_some() {
            self.overwritten += 1;
        }
    }

    /// Oldest-first copy of the window
    pub fn snapshot(&self) -> Vec<GazePair> {
        self.ring.iter().copied().collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ring.occupied_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.ring.clear();
    }
}

/// Number of samples a rolling window covers at `frequency_hz`
///
/// Durations are rounded to the nearest whole sample, with a minimum of one.
pub fn window_len(window: RollingWindow, frequency_hz: f64) -> Result<usize, ContractError> {
    match window {
        RollingWindow::Samples(0) => Err(ContractError::InvalidBufferSize {
            message: "sample count must be positive".to_string(),
        }),
        RollingWindow::Samples(n) => Ok(n),
        RollingWindow::DurationMs(ms) if !ms.is_finite() || ms <= 0.0 => {
            Err(ContractError::InvalidBufferSize {
                message: format!("duration must be positive, got {ms} ms"),
            })
        }
        RollingWindow::DurationMs(ms) => {
            let n = (ms / 1000.0 * frequency_hz).round() as usize;
            Ok(n.max(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Point2;

    fn pair(v: f64) -> GazePair {
        GazePair {
            left: Point2::new(v, v),
            right: Point2::new(v, v),
        }
    }

    #[test]
    fn test_capacity_keeps_last_n_oldest_first() {
        let mut rb = RollingBuffer::new(5).unwrap();
        for v in 0..8 {
            rb.push(pair(v as f64));
        }

        let snapshot = rb.snapshot();
        assert_eq!(snapshot.len(), 5);
        let xs: Vec<f64> = snapshot.iter().map(|p| p.left.x).collect();
        assert_eq!(xs, vec![3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(rb.overwritten, 3);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            RollingBuffer::new(0),
            Err(ContractError::InvalidBufferSize { .. })
        ));
    }

    #[test]
    fn test_window_len() {
        assert_eq!(window_len(RollingWindow::Samples(5), 120.0).unwrap(), 5);
        assert_eq!(window_len(RollingWindow::DurationMs(100.0), 120.0).unwrap(), 12);
        assert_eq!(window_len(RollingWindow::DurationMs(1.0), 60.0).unwrap(), 1);
        assert!(window_len(RollingWindow::Samples(0), 120.0).is_err());
        assert!(window_len(RollingWindow::DurationMs(-5.0), 120.0).is_err());
        assert!(window_len(RollingWindow::DurationMs(f64::NAN), 120.0).is_err());
    }
}
