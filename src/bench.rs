//! Performance benchmark and advantages demo.
//!
//! Illustrative output only; nothing here feeds back into the pipeline.

use console::style;
use std::time::Instant;
use sysinfo::System;

pub fn run_benchmark() {
    println!("{}", style("Performance Benchmark").bold());
    println!("{}", "=".repeat(40));

    let start = Instant::now();
    let mut result = String::new();
    for n in 0..100_000 {
        result.push_str("test_string_");
        result.push_str(&n.to_string());
    }
    println!(
        "String operations (100k): {} microseconds",
        start.elapsed().as_micros()
    );

    let start = Instant::now();
    let mut sum = 0.0_f64;
    for n in 0..1_000_000 {
        let x = f64::from(n);
        sum += x.sqrt() * x.sin();
    }
    println!(
        "Math operations (1M): {} microseconds",
        start.elapsed().as_micros()
    );
    println!("Result sum: {sum:.2}");

    let start = Instant::now();
    let mut vectors: Vec<Vec<i32>> = Vec::new();
    for n in 0..10_000 {
        vectors.push(vec![n; 100]);
    }
    println!(
        "Memory allocation (10k vectors): {} microseconds",
        start.elapsed().as_micros()
    );
    drop(vectors);

    let mut sys = System::new_all();
    sys.refresh_all();
    println!();
    println!("Host CPUs: {}", sys.cpus().len());
    println!("Host memory: {} MB", sys.total_memory() / 1_048_576);
}

pub fn run_demo() {
    println!("{}", style("Native CLI Advantages").bold());
    println!("{}", "=".repeat(40));
    println!("1. Single static binary, no interpreter on the target machine");
    println!("2. Zero-cost abstractions and predictable memory use");
    println!("3. Compile-time type and ownership checks");
    println!("4. Direct OS process and filesystem access");
    println!("5. Cross-platform from one codebase");
    println!();

    run_benchmark();
}
