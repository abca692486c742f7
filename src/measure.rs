//! Wall-clock and peak-memory measurement of a single call.
//!
//! Memory is observed through [`TracingAllocator`], which must be installed as
//! the `#[global_allocator]` of the final binary. Without it every trial
//! reports a peak of zero bytes.
//!
//! Tracing state is process-wide. Measurements must not overlap or nest, and
//! allocations made by other threads during a measurement are counted.

use crate::errors::BenchResult;
use serde::Serialize;
use std::alloc::{GlobalAlloc, Layout};
use std::sync::atomic::{AtomicBool, AtomicIsize, Ordering};
use std::time::{Duration, Instant};

const BYTES_PER_MB: f64 = (1024 * 1024) as f64;

static TRACING: AtomicBool = AtomicBool::new(false);
static CURRENT: AtomicIsize = AtomicIsize::new(0);
static PEAK: AtomicIsize = AtomicIsize::new(0);

/// Global allocator wrapper tracking net bytes allocated while tracing is on.
///
/// ```ignore
/// #[global_allocator]
/// static GLOBAL: TracingAllocator<std::alloc::System> = TracingAllocator::new(std::alloc::System);
/// ```
pub struct TracingAllocator<A> {
    inner: A,
}

impl<A> TracingAllocator<A> {
    pub const fn new(inner: A) -> Self {
        Self { inner }
    }
}

#[inline]
fn record_alloc(size: usize) {
    if !TRACING.load(Ordering::Relaxed) {
        return;
    }
    let current = CURRENT.fetch_add(size as isize, Ordering::SeqCst) + size as isize;
    PEAK.fetch_max(current, Ordering::SeqCst);
}

#[inline]
fn record_dealloc(size: usize) {
    if TRACING.load(Ordering::Relaxed) {
        CURRENT.fetch_sub(size as isize, Ordering::SeqCst);
    }
}

unsafe impl<A: GlobalAlloc> GlobalAlloc for TracingAllocator<A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        // SAFETY: delegated with the caller's layout
        let ret = unsafe { self.inner.alloc(layout) };
        if !ret.is_null() {
            record_alloc(layout.size());
        }
        ret
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        // SAFETY: delegated with the caller's layout
        let ret = unsafe { self.inner.alloc_zeroed(layout) };
        if !ret.is_null() {
            record_alloc(layout.size());
        }
        ret
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        // SAFETY: ptr was allocated by `inner` with this layout
        unsafe { self.inner.dealloc(ptr, layout) };
        record_dealloc(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        // SAFETY: ptr was allocated by `inner` with this layout
        let ret = unsafe { self.inner.realloc(ptr, layout, new_size) };
        if !ret.is_null() {
            if new_size >= layout.size() {
                record_alloc(new_size - layout.size());
            } else {
                record_dealloc(layout.size() - new_size);
            }
        }
        ret
    }
}

/// Reset counters and start tracing allocations.
pub fn start_tracing() {
    CURRENT.store(0, Ordering::SeqCst);
    PEAK.store(0, Ordering::SeqCst);
    TRACING.store(true, Ordering::SeqCst);
}

pub fn stop_tracing() {
    TRACING.store(false, Ordering::SeqCst);
}

pub fn is_tracing() -> bool {
    TRACING.load(Ordering::SeqCst)
}

/// `(current, peak)` traced bytes since the last [`start_tracing`].
///
/// Frees of blocks allocated before tracing started push `current` down,
/// so both figures are net growth and are clamped at zero.
pub fn traced_memory() -> (usize, usize) {
    let current = CURRENT.load(Ordering::SeqCst).max(0) as usize;
    let peak = PEAK.load(Ordering::SeqCst).max(0) as usize;
    (current, peak)
}

/// Cost of one measured call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trial {
    pub elapsed: Duration,
    pub peak_bytes: usize,
}

impl Trial {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn peak_mb(&self) -> f64 {
        self.peak_bytes as f64 / BYTES_PER_MB
    }
}

struct TracingGuard;

impl TracingGuard {
    fn start() -> Self {
        start_tracing();
        TracingGuard
    }
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        stop_tracing();
    }
}

/// Run `f` exactly once under allocation tracing and time it.
///
/// The closure's output is discarded after the measurement window closes;
/// an error from the closure is returned instead of a [`Trial`].
pub fn measure<F, T>(f: F) -> BenchResult<Trial>
where
    F: FnOnce() -> BenchResult<T>,
{
    let guard = TracingGuard::start();
    let start = Instant::now();
    let output = f();
    let elapsed = start.elapsed();
    let (_, peak_bytes) = traced_memory();
    drop(guard);

    output?;
    Ok(Trial {
        elapsed,
        peak_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BenchError;

    #[test]
    fn test_trial_units() {
        let trial = Trial {
            elapsed: Duration::from_millis(1500),
            peak_bytes: 3 * 1024 * 1024,
        };
        assert!((trial.elapsed_secs() - 1.5).abs() < 1e-12);
        assert!((trial.peak_mb() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_measure_propagates_error() {
        let result = measure(|| -> BenchResult<()> { Err(BenchError::config("boom")) });
        assert!(matches!(result, Err(BenchError::ConfigError(..))));
    }

    #[test]
    fn test_measure_times_call() {
        let trial = measure(|| -> BenchResult<u32> {
            std::thread::sleep(Duration::from_millis(20));
            Ok(7)
        })
        .unwrap();
        assert!(trial.elapsed >= Duration::from_millis(20));
    }
}
