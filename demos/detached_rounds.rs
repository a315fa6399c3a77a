use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use stridepool::{Arguments, ForOptions, WorkerPool};

/// Usage: detached_rounds [-w workers] [-r rounds] [--quiet]
fn main() -> Result<(), stridepool::PoolError> {
    let mut args = Arguments::new();
    args.set_inert("quiet");
    args.pass(std::env::args());

    if !args.is_passed("quiet") {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .init();
    }

    let workers = args
        .argument('w')
        .and_then(|w| w.parse().ok())
        .unwrap_or(4);
    let rounds = args
        .argument('r')
        .and_then(|r| r.parse().ok())
        .unwrap_or(3usize);

    let mut pool = WorkerPool::new(workers)?;
    let processed = Arc::new(AtomicUsize::new(0));

    for round in 0..rounds {
        let processed = Arc::clone(&processed);
        // Returns once the calling thread's own slice is done; the next
        // iteration waits for the rest of this round before issuing.
        pool.parallel_for_detached(0usize, 64, ForOptions::new(), move |_, _| {
            thread::sleep(Duration::from_millis(1));
            processed.fetch_add(1, Ordering::Relaxed);
        });
        println!("round {} issued, pending: {}", round, pool.has_pending_round());
    }

    pool.wait();
    println!("elements processed: {}", processed.load(Ordering::Relaxed));
    Ok(())
}
