use std::sync::atomic::{AtomicUsize, Ordering};

use stridepool::{create_worker_pool, parallel_for};

fn main() {
    let mut pool = create_worker_pool!(num_threads: 4).unwrap();
    let count = AtomicUsize::new(0);
    parallel_for!(pool, 0usize..100, |_| {
        count.fetch_add(1, Ordering::Relaxed);
    });
    println!("Every position: {}", count.swap(0, Ordering::Relaxed));

    let mut pool = create_worker_pool!(num_threads: 2, thread_name: "macro").unwrap();
    parallel_for!(pool, 0usize..100, |_| {
        count.fetch_add(1, Ordering::Relaxed);
    }, advance: 7);
    println!("Every seventh position: {}", count.load(Ordering::Relaxed));
}
