use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use rand::Rng;
use stridepool::{run_sequential, ForOptions, WorkerPoolBuilder};

fn cpu_task(n: u64) -> u64 {
    (0..n).map(|x| x * x).sum()
}

fn main() {
    let num_threads = 12;
    let num_elements = 100_000;

    // Element cost grows with the index, so contiguous chunks would leave the
    // last worker with most of the work.
    let mut rng = rand::thread_rng();
    let costs: Vec<u64> = (0..num_elements)
        .map(|i| i as u64 / 10 + rng.gen_range(0..100))
        .collect();

    // Measure time for the worker pool
    let pool_start = Instant::now();

    let mut pool = WorkerPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .unwrap();
    let total = AtomicU64::new(0);
    pool.parallel_for_each(&costs, |&n| {
        total.fetch_add(cpu_task(n), Ordering::Relaxed);
    });

    let pool_duration = pool_start.elapsed();
    println!(
        "Time taken with worker pool (caller contributes): {:.2?}",
        pool_duration
    );

    // Workers only
    let pool_start = Instant::now();
    let workers_total = AtomicU64::new(0);
    pool.parallel_for_with(
        0usize,
        costs.len(),
        ForOptions::new().main_contribute(false),
        |i, _| {
            workers_total.fetch_add(cpu_task(costs[i]), Ordering::Relaxed);
        },
    );
    println!(
        "Time taken with worker pool (workers only): {:.2?}",
        pool_start.elapsed()
    );

    // Measure time on the calling thread alone
    let sequential_start = Instant::now();
    let mut sequential_total = 0u64;
    run_sequential(0usize, costs.len(), |i| {
        sequential_total = sequential_total.wrapping_add(cpu_task(costs[i]))
    });
    println!(
        "Time taken sequentially: {:.2?}",
        sequential_start.elapsed()
    );

    assert_eq!(total.load(Ordering::Relaxed), sequential_total);
    assert_eq!(workers_total.load(Ordering::Relaxed), sequential_total);
}
