use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rand::Rng;
use stridepool::metrics::{AtomicMetricsCollector, PoolMetrics};
use stridepool::{ForOptions, Synched, WorkerPool, WorkerPoolBuilder};

#[test]
fn test_basic_pool() {
    let mut pool = WorkerPool::new(2).unwrap();
    let sum = AtomicUsize::new(0);
    pool.parallel_for(0usize, 10, |i| {
        sum.fetch_add(i, Ordering::Relaxed);
    });
    assert_eq!(sum.into_inner(), 45);
}

#[test]
fn test_every_element_visited_exactly_once() {
    let mut rng = rand::thread_rng();
    for workers in 1..=6 {
        let mut pool = WorkerPool::new(workers).unwrap();
        for _ in 0..20 {
            let len: usize = rng.gen_range(0..500);
            let advance: usize = rng.gen_range(1..5);
            let main_contribute = rng.gen_bool(0.5);
            let hits: Vec<AtomicUsize> = (0..len).map(|_| AtomicUsize::new(0)).collect();

            let options = ForOptions::new()
                .advance(advance)
                .main_contribute(main_contribute);
            pool.parallel_for_with(0usize, len, options, |i, _| {
                hits[i].fetch_add(1, Ordering::Relaxed);
            });

            for (i, h) in hits.iter().enumerate() {
                let expected = usize::from(i % advance == 0);
                assert_eq!(
                    h.load(Ordering::Relaxed),
                    expected,
                    "index {} with {} workers, len {}, advance {}",
                    i,
                    workers,
                    len,
                    advance
                );
            }
        }
    }
}

#[test]
fn test_round_robin_coverage() {
    let mut pool = WorkerPool::new(4).unwrap();
    let per_contributor = Mutex::new(vec![Vec::new(); 5]);

    pool.parallel_for_with(0usize, 23, ForOptions::new(), |i, id| {
        per_contributor.lock().unwrap()[id].push(i);
    });

    let per_contributor = per_contributor.into_inner().unwrap();
    let mut union = HashSet::new();
    for (id, indices) in per_contributor.iter().enumerate() {
        for &i in indices {
            assert_eq!(i % 5, id);
            assert!(union.insert(i), "index {} visited twice", i);
        }
    }
    assert_eq!(union, (0..23).collect::<HashSet<_>>());
    // The calling thread is contributor 4.
    let mut main_share = per_contributor[4].clone();
    main_share.sort_unstable();
    assert_eq!(main_share, vec![4, 9, 14, 19]);
}

#[test]
fn test_sequential_consistency() {
    let mut pool = WorkerPool::new(8).unwrap();
    let mut arr = vec![0usize; 200];
    {
        let mut slots: Vec<(usize, &mut usize)> = arr.iter_mut().enumerate().collect();
        pool.parallel_for_each_mut(&mut slots, |(i, v)| **v = *i);
    }
    pool.wait();
    for (i, v) in arr.iter().enumerate() {
        assert_eq!(*v, i);
    }
}

#[test]
fn test_fill_by_interleaved_index() {
    let mut pool = WorkerPool::new(8).unwrap();
    let arr: Vec<AtomicUsize> = (0..200).map(|_| AtomicUsize::new(0)).collect();
    pool.parallel_for(0usize, 200, |i| arr[i].store(i, Ordering::Relaxed));
    pool.wait();
    for (i, v) in arr.iter().enumerate() {
        assert_eq!(v.load(Ordering::Relaxed), i);
    }
}

#[test]
fn test_empty_range_is_a_no_op() {
    let mut pool = WorkerPool::new(3).unwrap();
    let calls = AtomicUsize::new(0);
    pool.parallel_for(10usize, 10, |_| {
        calls.fetch_add(1, Ordering::Relaxed);
    });
    pool.parallel_for_each(&Vec::<u8>::new(), |_| {
        calls.fetch_add(1, Ordering::Relaxed);
    });
    assert_eq!(calls.into_inner(), 0);
    assert!(!pool.has_pending_round());
}

#[test]
fn test_no_double_fire_under_stress() {
    let metrics = Arc::new(PoolMetrics::new());
    let collector = Arc::new(AtomicMetricsCollector::new(metrics.clone()));
    let mut pool = WorkerPoolBuilder::new()
        .num_threads(8)
        .with_metrics_collector(collector)
        .build()
        .unwrap();

    let total = AtomicUsize::new(0);
    let rounds = 2_000;
    for round in 0..rounds {
        // Tiny ranges make most workers finish at the same instant.
        let len = round % 11;
        pool.parallel_for(0usize, len, |_| {
            total.fetch_add(1, Ordering::Relaxed);
        });
    }

    let expected: usize = (0..rounds).map(|r| r % 11).sum();
    assert_eq!(total.into_inner(), expected);

    let non_empty = (0..rounds).filter(|r| r % 11 != 0).count();
    assert_eq!(metrics.rounds_issued.load(Ordering::SeqCst), non_empty);
    assert_eq!(metrics.rounds_completed.load(Ordering::SeqCst), non_empty);
    assert_eq!(metrics.completed_jobs.load(Ordering::SeqCst), non_empty * 8);
    assert_eq!(metrics.running_jobs.load(Ordering::SeqCst), 0);
}

#[test]
fn test_detached_rounds_are_serialized() {
    let mut pool = WorkerPool::new(4).unwrap();
    let len = 500;
    let stamps: Arc<Vec<Mutex<Vec<usize>>>> =
        Arc::new((0..len).map(|_| Mutex::new(Vec::new())).collect());

    for round in 1..=5usize {
        let stamps = Arc::clone(&stamps);
        pool.parallel_for_detached(0usize, len, ForOptions::new(), move |i, _| {
            // Slow elements keep the round in flight while the next is issued.
            if i % 97 == 0 {
                thread::sleep(Duration::from_millis(2));
            }
            stamps[i].lock().unwrap().push(round);
        });
    }
    pool.wait();

    for cell in stamps.iter() {
        assert_eq!(*cell.lock().unwrap(), vec![1, 2, 3, 4, 5]);
    }
}

#[test]
fn test_detached_round_completes_on_drop() {
    let counter = Arc::new(AtomicUsize::new(0));
    {
        let mut pool = WorkerPool::new(3).unwrap();
        let shared = Arc::clone(&counter);
        pool.parallel_for_detached(
            0u64,
            300,
            ForOptions::new().main_contribute(false),
            move |_, _| {
                thread::sleep(Duration::from_micros(100));
                shared.fetch_add(1, Ordering::SeqCst);
            },
        );
    }
    assert_eq!(counter.load(Ordering::SeqCst), 300);
}

#[test]
fn test_resize_between_rounds() {
    let mut pool = WorkerPool::new(4).unwrap();
    for workers in [0, 8, 1, 5, 0, 3] {
        pool.set_worker_count(workers).unwrap();
        assert_eq!(pool.worker_count(), workers);

        let hits: Vec<AtomicUsize> = (0..97).map(|_| AtomicUsize::new(0)).collect();
        pool.parallel_for(0usize, 97, |i| {
            hits[i].fetch_add(1, Ordering::Relaxed);
        });
        assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
    }
}

#[test]
fn test_resize_waits_for_detached_round() {
    let mut pool = WorkerPool::new(6).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));
    let shared = Arc::clone(&counter);
    pool.parallel_for_detached(0usize, 60, ForOptions::new(), move |_, _| {
        thread::sleep(Duration::from_millis(1));
        shared.fetch_add(1, Ordering::SeqCst);
    });
    pool.set_worker_count(2).unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 60);
    assert!(!pool.has_pending_round());
}

#[test]
fn test_slices_and_shared_state() {
    let mut pool = WorkerPool::new(4).unwrap();
    let words = vec!["stride", "pool", "worker", "round", "signal"];
    let total = Synched::new(0usize);
    pool.parallel_for_each(&words, |w| *total.write() += w.len());
    assert_eq!(total.into_inner(), 27);
}

#[test]
fn test_reader_guards_inside_a_round() {
    let mut pool = WorkerPool::new(4).unwrap();
    let table = Synched::new((0..64).collect::<Vec<usize>>());
    let sum = AtomicUsize::new(0);
    pool.parallel_for(0usize, 64, |i| {
        let guard = table.read();
        sum.fetch_add(guard[i], Ordering::Relaxed);
    });
    assert_eq!(sum.into_inner(), (0..64).sum::<usize>());
    assert_eq!(table.reader_count(), 0);
}
