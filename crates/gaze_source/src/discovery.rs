//! Device discovery and connection.

use std::sync::Arc;

use contracts::{ContractError, GazeSource, PointerDevice, SimulationConfig};
use coords::SurfaceTransform;
use serde::Serialize;
use tracing::info;

use crate::SimulatedGazeSource;

/// Remediation shown when no tracker is available
pub const NO_DEVICE_REMEDY: &str = "connect and power on the eye tracker before starting";

/// Description of a detected tracker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub address: String,
    pub model: String,
    pub serial_number: String,
    /// Sampling rates the device supports
    pub frequencies_hz: Vec<f64>,
}

/// Finds trackers and opens them as gaze sources
pub trait DeviceDiscovery {
    fn find_all(&self) -> Vec<DeviceInfo>;

    fn open(&self, device: &DeviceInfo) -> Result<Arc<dyn GazeSource>, ContractError>;
}

/// Open the tracker at `index` among those found
///
/// Fails with `NoDevice` when nothing is detected or the index is out of
/// range; no recording or calibration is possible without a device.
pub fn connect(
    discovery: &dyn DeviceDiscovery,
    index: usize,
) -> Result<(DeviceInfo, Arc<dyn GazeSource>), ContractError> {
    let devices = discovery.find_all();
    if devices.is_empty() {
        return Err(ContractError::NoDevice {
            message: NO_DEVICE_REMEDY.to_string(),
        });
    }
    let Some(device) = devices.get(index).cloned() else {
        return Err(ContractError::NoDevice {
            message: format!(
                "tracker #{index} requested but only {} detected; {NO_DEVICE_REMEDY}",
                devices.len()
            ),
        });
    };

    let source = discovery.open(&device)?;
    info!(
        model = %device.model,
        serial = %device.serial_number,
        address = %device.address,
        frequency_hz = source.frequency_hz(),
        "Connected to eye tracker"
    );
    Ok((device, source))
}

/// Discovery that always finds one pointer-driven simulated tracker
pub struct SimulatedDiscovery {
    pointer: Arc<dyn PointerDevice>,
    transform: SurfaceTransform,
    config: SimulationConfig,
}

impl SimulatedDiscovery {
    pub fn new(
        pointer: Arc<dyn PointerDevice>,
        transform: SurfaceTransform,
        config: SimulationConfig,
    ) -> Self {
        Self {
            pointer,
            transform,
            config,
        }
    }
}

impl DeviceDiscovery for SimulatedDiscovery {
    fn find_all(&self) -> Vec<DeviceInfo> {
        vec![DeviceInfo {
            address: "sim://pointer".to_string(),
            model: "Pointer simulation".to_string(),
            serial_number: "SIM-0000".to_string(),
            frequencies_hz: vec![60.0, 120.0, 300.0],
        }]
    }

    fn open(&self, _device: &DeviceInfo) -> Result<Arc<dyn GazeSource>, ContractError> {
        Ok(Arc::new(SimulatedGazeSource::new(
            Arc::clone(&self.pointer),
            self.transform,
            &self.config,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FixedPointer;
    use contracts::{Point2, SourceKind, SurfaceGeometry, Units};

    struct NoTrackers;

    impl DeviceDiscovery for NoTrackers {
        fn find_all(&self) -> Vec<DeviceInfo> {
            Vec::new()
        }

        fn open(&self, _device: &DeviceInfo) -> Result<Arc<dyn GazeSource>, ContractError> {
            unreachable!("nothing to open")
        }
    }

    fn simulated() -> SimulatedDiscovery {
        SimulatedDiscovery::new(
            Arc::new(FixedPointer(Point2::new(0.0, 0.0))),
            SurfaceTransform::new(SurfaceGeometry::new(800, 600, Units::Pixel)),
            SimulationConfig::default(),
        )
    }

    #[test]
    fn test_no_device_names_remedy() {
        let err = connect(&NoTrackers, 0).err().unwrap();
        assert!(matches!(err, ContractError::NoDevice { .. }));
        assert!(err.to_string().contains("power on the eye tracker"));
    }

    #[test]
    fn test_index_out_of_range() {
        let err = connect(&simulated(), 3).err().unwrap();
        assert!(err.to_string().contains("tracker #3"));
    }

    #[test]
    fn test_connect_simulated() {
        let (info, source) = connect(&simulated(), 0).unwrap();
        assert_eq!(info.serial_number, "SIM-0000");
        assert_eq!(source.kind(), SourceKind::Simulated);
        assert_eq!(source.frequency_hz(), 120.0);
    }
}
