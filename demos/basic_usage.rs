use std::sync::atomic::{AtomicUsize, Ordering};

fn main() -> Result<(), stridepool::PoolError> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let mut pool = stridepool::WorkerPool::new(4)?;
    let visited = AtomicUsize::new(0);
    pool.parallel_for(0usize, 1000, |_| {
        visited.fetch_add(1, Ordering::Relaxed);
    });
    println!("Elements visited: {}", visited.load(Ordering::Relaxed));

    let mut table = vec![0usize; 16];
    pool.parallel_for_each_mut(&mut table, |x| *x += 1);
    println!("Table after one round: {:?}", table);
    Ok(())
}
