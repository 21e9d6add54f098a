//! Compute capability handed to every phase of the pipeline.
//!
//! The pipeline never reaches for process-wide worker state. Callers build a
//! [`ComputeContext`] once and pass it into each step; every data-parallel
//! phase runs inside [`ComputeContext::install`].

#[cfg(feature = "parallel")]
use crate::error::CellMdError;
use crate::error::Result;

pub struct ComputeContext {
    #[cfg(feature = "parallel")]
    pool: rayon::ThreadPool,
}

impl ComputeContext {
    /// Create a context with `workers` threads. `0` picks one per logical CPU.
    ///
    /// Without the `parallel` feature every phase runs on the calling thread
    /// and `workers` is ignored.
    pub fn new(workers: usize) -> Result<Self> {
        #[cfg(feature = "parallel")]
        {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("cellmd-worker-{i}"))
                .build()
                .map_err(|e| CellMdError::config(format!("failed to start worker pool: {e}")))?;
            log::info!("compute context: {} workers", pool.current_num_threads());
            Ok(Self { pool })
        }

        #[cfg(not(feature = "parallel"))]
        {
            let _ = workers;
            log::info!("compute context: sequential (parallel feature disabled)");
            Ok(Self {})
        }
    }

    /// Single-worker context, handy for deterministic comparisons.
    pub fn sequential() -> Result<Self> {
        Self::new(1)
    }

    pub fn num_workers(&self) -> usize {
        #[cfg(feature = "parallel")]
        {
            self.pool.current_num_threads()
        }

        #[cfg(not(feature = "parallel"))]
        {
            1
        }
    }

    /// Run `op` with this context's workers available to nested parallel
    /// iterators. Returning from `op` is the phase barrier.
    pub fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        #[cfg(feature = "parallel")]
        {
            self.pool.install(op)
        }

        #[cfg(not(feature = "parallel"))]
        {
            op()
        }
    }
}
