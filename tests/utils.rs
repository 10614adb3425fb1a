use statsd_shard::prelude::*;
use statsd_shard::{bucket, Client};
use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Number of metric lines emitted by each iteration of `run_arc_threaded_test`.
#[allow(dead_code)]
pub const LINES_PER_ITERATION: u64 = 6;

#[allow(dead_code)]
pub fn run_arc_threaded_test(client: Client, num_threads: u64, iterations: u64) {
    let shared_client = Arc::new(client);

    let threads: Vec<_> = (0..num_threads)
        .map(|_| {
            let local_client = Arc::clone(&shared_client);

            thread::spawn(move || {
                for i in 0..iterations {
                    local_client.count(&bucket!["some", "counter"], i as i64);
                    local_client.incr_with_host(&bucket!["some", "counter"]);
                    local_client.timing(&bucket!["some", "timer"], Duration::from_millis(i));
                    local_client.gauge(&bucket!["some", "gauge"], i);
                    local_client.gauge(&bucket!["some", "gauge"], i as f64);
                    local_client.timing_since(&bucket!["some", "timer"], Instant::now());
                    thread::sleep(Duration::from_millis(1));
                }
            })
        })
        .collect();

    for t in threads {
        t.join().unwrap();
    }
}

/// Wait up to five seconds for `cond` to become true.
#[allow(dead_code)]
pub fn wait_for<F>(cond: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }

    cond()
}

/// Global allocator that counts allocations made while it's enabled.
#[allow(dead_code)]
pub struct InstrumentedAllocator {
    enabled: AtomicBool,
    allocs: AtomicU64,
}

#[allow(dead_code)]
impl InstrumentedAllocator {
    pub const fn new() -> Self {
        InstrumentedAllocator {
            enabled: AtomicBool::new(false),
            allocs: AtomicU64::new(0),
        }
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    pub fn num_allocs(&self) -> u64 {
        self.allocs.load(Ordering::SeqCst)
    }
}

unsafe impl GlobalAlloc for InstrumentedAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if self.enabled.load(Ordering::SeqCst) {
            self.allocs.fetch_add(1, Ordering::SeqCst);
        }

        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }
}
