//! Single-threaded backend.

use crate::backend::{BackendType, ComputeBackend, ComputeError, DeviceInfo};

/// Runs every task on the calling thread, in index order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialBackend;

impl SerialBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ComputeBackend for SerialBackend {
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: "Serial (1 thread)".into(),
            backend_type: BackendType::Serial,
            compute_units: Some(1),
        }
    }

    fn for_each_index(
        &self,
        len: usize,
        task: &(dyn Fn(usize) + Send + Sync),
    ) -> Result<(), ComputeError> {
        (0..len).for_each(task);
        Ok(())
    }
}
