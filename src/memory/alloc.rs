//! Counting global allocator.
//!
//! Wraps a backing [`GlobalAlloc`] and counts allocation events and bytes per thread.
//! Per-thread counters keep a measurement window attributable to the thread that
//! opened it, whatever other threads in the process are doing.
//!
//! The binary installs it as the global allocator:
//!
//! ```rust,ignore
//! use brrtbench::memory::CountingAllocator;
//! use std::alloc::System;
//!
//! #[global_allocator]
//! static GLOBAL: CountingAllocator<System> = CountingAllocator::new(System);
//! ```
//!
//! Without it every snapshot stays at zero and [`is_installed`] returns `false`.

#![allow(unsafe_code)]

use serde::Serialize;
use std::alloc::{GlobalAlloc, Layout};
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};

static INSTALLED: AtomicBool = AtomicBool::new(false);

struct Counters {
    allocations: Cell<u64>,
    reallocations: Cell<u64>,
    deallocations: Cell<u64>,
    bytes_allocated: Cell<u64>,
    bytes_freed: Cell<u64>,
}

impl Counters {
    const fn new() -> Self {
        Self {
            allocations: Cell::new(0),
            reallocations: Cell::new(0),
            deallocations: Cell::new(0),
            bytes_allocated: Cell::new(0),
            bytes_freed: Cell::new(0),
        }
    }
}

thread_local! {
    // const-initialized and without Drop: safe to touch from inside the allocator
    static COUNTERS: Counters = const { Counters::new() };
}

#[inline]
fn bump(cell: &Cell<u64>, by: u64) {
    cell.set(cell.get().wrapping_add(by));
}

#[inline]
fn record_alloc(size: usize) {
    if !INSTALLED.load(Ordering::Relaxed) {
        INSTALLED.store(true, Ordering::Relaxed);
    }
    let _ = COUNTERS.try_with(|c| {
        bump(&c.allocations, 1);
        bump(&c.bytes_allocated, size as u64);
    });
}

#[inline]
fn record_realloc(old_size: usize, new_size: usize) {
    let _ = COUNTERS.try_with(|c| {
        bump(&c.reallocations, 1);
        bump(&c.bytes_allocated, new_size as u64);
        bump(&c.bytes_freed, old_size as u64);
    });
}

#[inline]
fn record_dealloc(size: usize) {
    let _ = COUNTERS.try_with(|c| {
        bump(&c.deallocations, 1);
        bump(&c.bytes_freed, size as u64);
    });
}

/// Global allocator that counts every event before delegating to `A`.
pub struct CountingAllocator<A> {
    inner: A,
}

impl<A> CountingAllocator<A> {
    /// Wrap a backing allocator
    pub const fn new(inner: A) -> Self {
        Self { inner }
    }
}

unsafe impl<A: GlobalAlloc> GlobalAlloc for CountingAllocator<A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { self.inner.alloc(layout) };
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { self.inner.alloc_zeroed(layout) };
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { self.inner.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            record_realloc(layout.size(), new_size);
        }
        new_ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { self.inner.dealloc(ptr, layout) };
        record_dealloc(layout.size());
    }
}

/// Whether a [`CountingAllocator`] is the process's global allocator
#[must_use]
pub fn is_installed() -> bool {
    if INSTALLED.load(Ordering::Relaxed) {
        return true;
    }
    // Force one allocation through whatever the global allocator is
    let probe = std::hint::black_box(Box::new(0u64));
    drop(probe);
    INSTALLED.load(Ordering::Relaxed)
}

/// Cumulative allocation counters of the current thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AllocSnapshot {
    /// `alloc` + `alloc_zeroed` events
    pub allocations: u64,
    /// `realloc` events
    pub reallocations: u64,
    /// `dealloc` events
    pub deallocations: u64,
    /// Bytes requested, realloc targets included
    pub bytes_allocated: u64,
    /// Bytes released, realloc sources included
    pub bytes_freed: u64,
}

impl AllocSnapshot {
    /// Counters of the calling thread
    #[must_use]
    pub fn current() -> Self {
        COUNTERS
            .try_with(|c| AllocSnapshot {
                allocations: c.allocations.get(),
                reallocations: c.reallocations.get(),
                deallocations: c.deallocations.get(),
                bytes_allocated: c.bytes_allocated.get(),
                bytes_freed: c.bytes_freed.get(),
            })
            .unwrap_or_default()
    }

    /// Allocation events (reallocations included) since `earlier`
    #[must_use]
    pub fn allocs_since(&self, earlier: &AllocSnapshot) -> u64 {
        (self.allocations + self.reallocations)
            .wrapping_sub(earlier.allocations + earlier.reallocations)
    }

    /// Bytes allocated since `earlier`
    #[must_use]
    pub fn bytes_since(&self, earlier: &AllocSnapshot) -> u64 {
        self.bytes_allocated.wrapping_sub(earlier.bytes_allocated)
    }

    /// Bytes allocated and not yet freed by this thread; negative when the
    /// thread freed memory another thread allocated
    #[must_use]
    pub fn live_bytes(&self) -> i64 {
        self.bytes_allocated as i64 - self.bytes_freed as i64
    }

    /// Allocations not yet freed by this thread
    #[must_use]
    pub fn live_objects(&self) -> i64 {
        self.allocations as i64 - self.deallocations as i64
    }
}
