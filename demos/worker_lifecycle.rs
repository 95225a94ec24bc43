//! Worker lifecycle example
//!
//! Demonstrates start/stop/wait semantics of a managed worker and shutdown
//! through a pool close.
//!
//! Run with: cargo run --example worker_lifecycle

use concurrent_pool::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> concurrent_pool::Result<()> {
    env_logger::init();

    println!("=== Concurrent Pool - Worker Lifecycle Example ===\n");

    // A cooperative worker polling its running flag.
    let mut poller = ThreadWorker::new("poller", |ctx| {
        println!("  poller run {} started", ctx.run_id());
        let mut ticks = 0;
        while ctx.is_running() {
            ticks += 1;
            thread::sleep(Duration::from_millis(10));
        }
        println!("  poller observed stop after {} ticks", ticks);
    });

    println!("1. Starting the poller:");
    poller.run(1)?;
    println!("   running: {}", poller.is_running());

    thread::sleep(Duration::from_millis(100));

    println!("2. Requesting a cooperative stop:");
    poller.stop();
    poller.wait()?;
    println!("   running: {}", poller.is_running());

    // A worker blocked in a pool fetch; only close() can release it.
    let pool: Arc<BoundedQueue<u32>> = Arc::new(BoundedQueue::with_capacity(8));
    let pool_for_task = Arc::clone(&pool);
    let mut drainer = ThreadWorker::new("drainer", move |ctx| {
        println!("  drainer run {} started", ctx.run_id());
        let mut total = 0;
        while let Fetched::Data(n) = pool_for_task.fetch() {
            total += *n;
        }
        println!("  drainer exited with total {}", total);
    });

    println!("\n3. Starting the drainer ('{}'):", drainer.label());
    drainer.run(2)?;

    for n in 1..=5 {
        pool.push(Handle::new(n)).unwrap();
    }

    thread::sleep(Duration::from_millis(50));
    println!("4. Closing the pool to release the blocked fetch:");
    pool.close();
    drainer.wait()?;
    println!("   running: {}", drainer.is_running());

    Ok(())
}
