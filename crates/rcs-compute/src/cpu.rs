//! CPU compute backend using Rayon for shared-memory parallelism.

use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::backend::{BackendType, ComputeBackend, ComputeError, DeviceInfo};

/// CPU backend that spreads independent tasks across threads via Rayon.
pub struct CpuBackend {
    num_threads: usize,
    /// Dedicated pool; `None` means the global Rayon pool.
    pool: Option<Arc<ThreadPool>>,
}

impl CpuBackend {
    /// Create a new CPU backend on the global pool (all available threads).
    pub fn new() -> Self {
        Self {
            num_threads: rayon::current_num_threads(),
            pool: None,
        }
    }

    /// Create a CPU backend with its own pool of `num_threads` workers.
    pub fn with_threads(num_threads: usize) -> Result<Self, ComputeError> {
        if num_threads == 0 {
            return Err(ComputeError::ThreadPool(
                "thread count must be at least 1".into(),
            ));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("rcs-worker-{}", i))
            .build()
            .map_err(|e| ComputeError::ThreadPool(e.to_string()))?;
        Ok(Self {
            num_threads,
            pool: Some(Arc::new(pool)),
        })
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeBackend for CpuBackend {
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: format!("CPU ({} threads)", self.num_threads),
            backend_type: BackendType::Cpu,
            compute_units: Some(self.num_threads),
        }
    }

    fn for_each_index(
        &self,
        len: usize,
        task: &(dyn Fn(usize) + Send + Sync),
    ) -> Result<(), ComputeError> {
        match &self.pool {
            Some(pool) => pool.install(|| (0..len).into_par_iter().for_each(task)),
            None => (0..len).into_par_iter().for_each(task),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_cpu_visits_every_index_once() {
        let hits: Vec<AtomicUsize> = (0..257).map(|_| AtomicUsize::new(0)).collect();
        CpuBackend::new()
            .for_each_index(hits.len(), &|i| {
                hits[i].fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
        assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
    }

    #[test]
    fn test_dedicated_pool_reports_thread_count() {
        let backend = CpuBackend::with_threads(2).unwrap();
        let info = backend.device_info();
        assert_eq!(info.compute_units, Some(2));
        assert_eq!(info.backend_type, BackendType::Cpu);
    }

    #[test]
    fn test_zero_threads_rejected() {
        assert!(CpuBackend::with_threads(0).is_err());
    }
}
