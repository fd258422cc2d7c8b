/// Microbenchmarks for xalloc.
///
/// Times the instrumented operations against bare libc malloc/free for the
/// same sizes, so the cost of the header, zero-fill and checks shows up as a
/// per-op difference. Plain timing loop, no harness.

use std::hint::black_box;
use std::time::Instant;

use xalloc::{try_xmalloc, xfree, xmalloc, xrealloc};

/// Get the run label from environment or default.
fn run_label() -> String {
    std::env::var("BENCH_LABEL").unwrap_or_else(|_| "local".to_string())
}

fn per_op(start: Instant, iterations: usize) -> f64 {
    start.elapsed().as_nanos() as f64 / iterations as f64
}

/// Baseline: libc malloc/free for a given size.
fn bench_libc_malloc_free(size: usize, iterations: usize) -> f64 {
    for _ in 0..1000 {
        unsafe {
            let ptr = libc::malloc(black_box(size)) as *mut u8;
            std::ptr::write_bytes(ptr, 0xAB, std::cmp::min(size, 64));
            libc::free(black_box(ptr).cast());
        }
    }
    let start = Instant::now();
    for _ in 0..iterations {
        unsafe {
            let ptr = libc::malloc(black_box(size)) as *mut u8;
            std::ptr::write_bytes(ptr, 0xAB, std::cmp::min(size, 64));
            libc::free(black_box(ptr).cast());
        }
    }
    per_op(start, iterations)
}

/// xmalloc/xfree latency for a given size.
fn bench_xmalloc_xfree(size: usize, iterations: usize) -> f64 {
    for _ in 0..1000 {
        let mut ptr = xmalloc!(black_box(size)).as_ptr();
        unsafe {
            std::ptr::write_bytes(ptr, 0xAB, std::cmp::min(size, 64));
            xfree!(ptr);
        }
    }
    let start = Instant::now();
    for _ in 0..iterations {
        let mut ptr = xmalloc!(black_box(size)).as_ptr();
        unsafe {
            std::ptr::write_bytes(ptr, 0xAB, std::cmp::min(size, 64));
            xfree!(ptr);
        }
        black_box(ptr);
    }
    per_op(start, iterations)
}

/// try_xmalloc/xfree latency.
fn bench_try_xmalloc_xfree(size: usize, iterations: usize) -> f64 {
    let start = Instant::now();
    for _ in 0..iterations {
        if let Ok(p) = try_xmalloc!(black_box(size)) {
            let mut ptr = p.as_ptr();
            unsafe { xfree!(ptr) };
        }
    }
    per_op(start, iterations)
}

/// Growing resize pattern, libc and xalloc.
fn bench_realloc_grow(iterations: usize) -> (f64, f64) {
    const STEPS: [usize; 6] = [32, 64, 128, 256, 512, 1024];

    let start = Instant::now();
    for _ in 0..iterations {
        unsafe {
            let mut ptr = libc::malloc(black_box(16));
            for &size in black_box(&STEPS) {
                ptr = libc::realloc(black_box(ptr), size);
            }
            libc::free(black_box(ptr));
        }
    }
    let libc_ns = per_op(start, iterations);

    let start = Instant::now();
    for _ in 0..iterations {
        let mut ptr = xmalloc!(black_box(16)).as_ptr();
        unsafe {
            for &size in black_box(&STEPS) {
                xrealloc!(ptr, size);
            }
            xfree!(ptr);
        }
    }
    (libc_ns, per_op(start, iterations))
}

/// Multi-threaded xmalloc/xfree throughput.
fn bench_threaded_throughput(num_threads: usize, ops_per_thread: usize, size: usize) -> f64 {
    let start = Instant::now();
    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            std::thread::spawn(move || {
                for _ in 0..ops_per_thread {
                    let mut ptr = xmalloc!(black_box(size)).as_ptr();
                    unsafe {
                        std::ptr::write_bytes(ptr, 0xCD, std::cmp::min(size, 16));
                        xfree!(ptr);
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    let elapsed = start.elapsed();
    let total_ops = num_threads * ops_per_thread;
    total_ops as f64 / elapsed.as_secs_f64() // ops/sec
}

fn main() {
    let iterations = 1_000_000;
    let label = run_label();

    println!("=== xalloc microbenchmarks ({}) ===\n", label);

    let mut latencies: Vec<(usize, f64, f64)> = Vec::new();
    let mut key_throughput_1t = 0.0f64;
    let mut key_throughput_4t = 0.0f64;

    println!("--- malloc/free latency (ns/op): libc vs xmalloc ---");
    for &size in &[16, 64, 256, 1024, 4096, 16384, 65536] {
        let base = bench_libc_malloc_free(size, iterations);
        let x = bench_xmalloc_xfree(size, iterations);
        println!("  size={:>8}: {:>8.1} ns  {:>8.1} ns", size, base, x);
        latencies.push((size, base, x));
    }

    println!("\n--- try_xmalloc/xfree latency (ns/op) ---");
    for &size in &[16, 1024, 65536] {
        let ns = bench_try_xmalloc_xfree(size, iterations);
        println!("  size={:>8}: {:>8.1} ns", size, ns);
    }

    println!("\n--- resize grow pattern (ns/op): libc vs xrealloc ---");
    let (base, x) = bench_realloc_grow(iterations / 10);
    println!("  16->1024: {:.1} ns  {:.1} ns", base, x);

    println!("\n--- multi-threaded throughput (Mops/sec) ---");
    for &threads in &[1, 2, 4, 8] {
        let ops_sec = bench_threaded_throughput(threads, iterations / threads, 64);
        let mops = ops_sec / 1_000_000.0;
        println!("  threads={}: {:>6.2} Mops/sec", threads, mops);
        if threads == 1 {
            key_throughput_1t = mops;
        }
        if threads == 4 {
            key_throughput_4t = mops;
        }
    }

    let stats = xalloc::global().stats();
    println!("\n--- allocator counters ---");
    println!("  live_blocks={} live_bytes={} exhausted={}", stats.live_blocks, stats.live_bytes, stats.exhausted);

    // Machine-parseable summary line
    print!("\nSUMMARY|{}", label);
    for &(size, base, x) in &latencies {
        print!("|overhead_{}={:.1}", size, x - base);
    }
    println!("|throughput_1t={:.2}|throughput_4t={:.2}",
        key_throughput_1t, key_throughput_4t);

    println!("\nDone.");
}
