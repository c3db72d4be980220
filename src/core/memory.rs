// src/core/memory.rs

//! Process memory accounting.
//!
//! Heap figures come from [`CountingAllocator`], which the binary installs as
//! the global allocator. The system-reserved figure is the resident set size
//! of the process as reported by `sysinfo`. Rust has no garbage collector, so
//! the reclamation count is the number of deallocations served.

use crate::core::InflightError;
use std::alloc::{GlobalAlloc, Layout, System};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate};

const MIB: u64 = 1024 * 1024;

// Observational counters only; relaxed ordering throughout.
static LIVE_BYTES: AtomicU64 = AtomicU64::new(0);
static TOTAL_ALLOCATED_BYTES: AtomicU64 = AtomicU64::new(0);
static DEALLOCATIONS: AtomicU64 = AtomicU64::new(0);

/// A global allocator that forwards to the system allocator and counts bytes.
pub struct CountingAllocator;

impl CountingAllocator {
    fn record_alloc(size: usize) {
        // Cumulative first, so a concurrent reader is less likely to see live > total.
        TOTAL_ALLOCATED_BYTES.fetch_add(size as u64, Ordering::Relaxed);
        LIVE_BYTES.fetch_add(size as u64, Ordering::Relaxed);
    }

    fn record_dealloc(size: usize) {
        LIVE_BYTES.fetch_sub(size as u64, Ordering::Relaxed);
        DEALLOCATIONS.fetch_add(1, Ordering::Relaxed);
    }
}

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            Self::record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            Self::record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        Self::record_dealloc(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            let old_size = layout.size();
            if new_size > old_size {
                Self::record_alloc(new_size - old_size);
            } else {
                LIVE_BYTES.fetch_sub((old_size - new_size) as u64, Ordering::Relaxed);
            }
        }
        new_ptr
    }
}

/// A point-in-time view of process memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStats {
    /// Heap bytes currently allocated.
    pub alloc_bytes: u64,
    /// Heap bytes allocated since process start, never decreasing.
    pub total_alloc_bytes: u64,
    /// Bytes the operating system currently backs the process with.
    pub sys_bytes: u64,
    /// Number of heap deallocations since process start.
    pub reclaim_cycles: u64,
}

impl MemoryStats {
    /// Reads the allocator counters, leaving `sys_bytes` at zero.
    pub fn heap_snapshot() -> Self {
        let alloc_bytes = LIVE_BYTES.load(Ordering::Relaxed);
        let total_alloc_bytes = TOTAL_ALLOCATED_BYTES.load(Ordering::Relaxed);
        Self {
            alloc_bytes,
            // The two loads are independent; clamp so the snapshot stays coherent.
            total_alloc_bytes: total_alloc_bytes.max(alloc_bytes),
            sys_bytes: 0,
            reclaim_cycles: DEALLOCATIONS.load(Ordering::Relaxed),
        }
    }

    pub fn alloc_mib(&self) -> u64 {
        self.alloc_bytes / MIB
    }

    pub fn total_alloc_mib(&self) -> u64 {
        self.total_alloc_bytes / MIB
    }

    pub fn sys_mib(&self) -> u64 {
        self.sys_bytes / MIB
    }
}

impl fmt::Display for MemoryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Alloc = {} MiB, TotalAlloc = {} MiB, Sys = {} MiB, NumGC = {}",
            self.alloc_mib(),
            self.total_alloc_mib(),
            self.sys_mib(),
            self.reclaim_cycles
        )
    }
}

/// Samples memory statistics for the current process.
pub struct MemoryProbe {
    system: sysinfo::System,
    pid: Pid,
}

impl MemoryProbe {
    /// Creates a probe bound to the current process.
    pub fn new() -> Result<Self, InflightError> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| InflightError::MemorySample(format!("cannot resolve own pid: {e}")))?;
        Ok(Self {
            system: sysinfo::System::new(),
            pid,
        })
    }

    /// Takes one snapshot.
    pub fn sample(&mut self) -> Result<MemoryStats, InflightError> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        let process = self.system.process(self.pid).ok_or_else(|| {
            InflightError::MemorySample(format!("process {} is not visible to sysinfo", self.pid))
        })?;

        Ok(MemoryStats {
            sys_bytes: process.memory(),
            ..MemoryStats::heap_snapshot()
        })
    }
}
