//! Walkthrough of the two-tier cache.
//!
//! Run with: cargo run --example basic_bicache

use std::thread;
use std::time::Duration;

use bicache::prelude::*;

fn main() {
    println!("=== Bicache Examples ===\n");

    // Example 1: inline eviction
    println!("1. Inline promotion (MFU 2, MRU 3)");
    let mut core = BicacheBuilder::new()
        .mfu_capacity(2)
        .mru_capacity(3)
        .try_build_core::<&str, u32>()
        .expect("valid capacities");

    for (value, key) in ["k0", "k1", "k2"].into_iter().enumerate() {
        core.set(key, value as u32);
    }
    core.get(&"k1");
    core.get(&"k1");
    core.set("k3", 3);

    println!("   k1 tier: {:?} (read twice)", core.tier_of(&"k1"));
    println!("   k3 tier: {:?} (just inserted)", core.tier_of(&"k3"));
    println!("   mru/mfu: {}/{}", core.mru_len(), core.mfu_len());
    println!();

    // Example 2: deferred pass
    println!("2. Deferred pass");
    let mut deferred = BicacheBuilder::new()
        .mfu_capacity(1)
        .mru_capacity(2)
        .auto_evict(Duration::from_secs(60))
        .try_build_core::<u32, u32>()
        .expect("valid capacities");
    for i in 0..5 {
        deferred.set(i, i);
    }
    deferred.get(&4);
    println!("   before pass: {} keys", deferred.len());
    let report = deferred.promote_evict();
    println!("   report: {report:?}");
    println!("   after pass: {} keys", deferred.len());
    println!();

    // Example 3: shared cache with background eviction
    println!("3. Background eviction");
    let cache = BicacheBuilder::new()
        .mfu_capacity(4)
        .mru_capacity(8)
        .auto_evict(Duration::from_millis(10))
        .build::<u32, String>();
    for i in 0..32 {
        cache.set(i, format!("value-{i}"));
    }
    println!("   right after writes: {:?}", cache.stats());
    thread::sleep(Duration::from_millis(50));
    let stats = cache.stats();
    println!(
        "   after evictor ran: mru {}% mfu {}%",
        stats.mru_used_percent, stats.mfu_used_percent
    );
    cache.shutdown();
}
