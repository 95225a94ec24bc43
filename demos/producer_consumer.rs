//! Producer/consumer example
//!
//! Demonstrates backpressure, priority insertion and batch operations on the
//! bounded pool.
//!
//! Run with: cargo run --example producer_consumer

use concurrent_pool::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() {
    env_logger::init();

    println!("=== Concurrent Pool - Producer/Consumer Example ===\n");

    let pool = Arc::new(BoundedQueue::with_capacity(5));
    println!("1. Pool capacity: {}", pool.capacity());

    println!("\n2. Producers pushing 20 items through a pool of 5:");
    let producers: Vec<_> = (0..2)
        .map(|p| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for n in 0..10 {
                    let position = pool.push(Handle::new(format!("item-{}-{}", p, n)));
                    if let Ok(position) = position {
                        println!("  producer {} queued at position {}", p, position);
                    }
                }
            })
        })
        .collect();

    // Slow consumer induces backpressure on the producers above.
    let consumer = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || {
            let mut count = 0;
            while let Fetched::Data(item) = pool.fetch() {
                count += 1;
                println!("  consumed {}", item);
                thread::sleep(Duration::from_millis(10));
            }
            count
        })
    };

    for producer in producers {
        producer.join().unwrap();
    }

    println!("\n3. Urgent insertion bypasses the full pool:");
    pool.push_urgent(Handle::new("URGENT".to_string())).unwrap();

    println!("\n4. Batch insertion admits everything at once:");
    let batch: Vec<Handle<String>> = (0..3)
        .map(|n| Handle::new(format!("batch-{}", n)))
        .collect();
    pool.push_batch(batch).unwrap();

    while !pool.is_empty() {
        thread::sleep(Duration::from_millis(10));
    }
    pool.close();

    let consumed = consumer.join().unwrap();
    println!("\n5. Consumer drained {} items, pool open: {}", consumed, pool.is_open());
}
