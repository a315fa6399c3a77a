use stridepool::{
    log_metrics,
    metrics::{AtomicMetricsCollector, PoolMetrics},
    ForOptions, WorkerPoolBuilder,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::Duration;

fn main() {
    tracing_subscriber::fmt::init();

    // Create metrics and collector
    let metrics = Arc::new(PoolMetrics::new());
    let collector = Arc::new(AtomicMetricsCollector::new(metrics.clone()));

    // Create a worker pool with the metrics collector
    let mut pool = WorkerPoolBuilder::new()
        .num_threads(4)
        .with_metrics_collector(collector)
        .build()
        .unwrap();

    // Create a flag to stop monitoring
    let running = Arc::new(AtomicBool::new(true));

    // Spawn a monitoring thread to display live updates
    let metrics_clone = metrics.clone();
    let running_clone = running.clone();
    let monitor_handle = thread::spawn(move || {
        while running_clone.load(Ordering::Acquire) {
            log_metrics!(metrics_clone);
            thread::sleep(Duration::from_millis(80));
        }
    });

    // Issue a few slow rounds
    for _ in 0..10 {
        pool.parallel_for_with(
            0usize,
            8,
            ForOptions::new().main_contribute(false),
            |_, _| thread::sleep(Duration::from_millis(100)),
        );
    }

    // Joins every worker
    drop(pool);

    // Stop the monitoring thread
    running.store(false, Ordering::Release);
    monitor_handle.join().unwrap();

    // Final metrics after shutdown
    println!("\n--- Final Metrics ---");
    println!(
        "Rounds issued: {}",
        metrics.rounds_issued.load(Ordering::SeqCst)
    );
    println!(
        "Rounds completed: {}",
        metrics.rounds_completed.load(Ordering::SeqCst)
    );
    println!(
        "Completed jobs: {}",
        metrics.completed_jobs.load(Ordering::SeqCst)
    );
    println!(
        "Active workers: {}",
        metrics.active_workers.load(Ordering::SeqCst)
    );
}
