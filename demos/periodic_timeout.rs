//! Periodic Timeout
//!
//! This example expires a pending order with a timer unless a payment event
//! arrives first.
//!
//! Key concepts:
//! - Periodic transitions fired by the scheduler
//! - Timer ticks and external events serialized on one machine
//! - Failed ticks reported to a failure sink
//!
//! Run with: cargo run --example periodic_timeout

use std::sync::Arc;
use std::time::Duration;
use tickstate::builder::{periodic_transition, simple_transition, StateMachineBuilder};
use tickstate::config::SchedulerConfig;
use tickstate::core::Event;
use tickstate::engine::StateMachine;
use tickstate::scheduler::{PeriodicEventScheduler, TickFailure};

fn order_machine() -> Arc<StateMachine> {
    let machine = StateMachineBuilder::new(["PENDING", "PAID", "EXPIRED"], "PENDING")
        .final_states(["EXPIRED"])
        .register(
            periodic_transition("expire", "PENDING", "EXPIRED", Duration::from_millis(300))
                .unwrap(),
        )
        .register(simple_transition("pay", "PENDING", "PAID", "PAY"))
        .build()
        .unwrap();
    Arc::new(machine)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Periodic Timeout Example ===\n");

    // Nobody pays: the timer expires the order.
    let unpaid = order_machine();
    let scheduler = PeriodicEventScheduler::new(SchedulerConfig::default()).with_failure_sink(
        |failure: TickFailure| println!("  tick '{}' failed: {}", failure.transition, failure.error),
    );
    scheduler.start(Arc::clone(&unpaid)).unwrap();
    tokio::time::sleep(Duration::from_millis(700)).await;
    scheduler.stop();
    println!("Unpaid order: {} (final: {})", unpaid.current_state(), unpaid.is_final());

    // Payment arrives before the first tick.
    let paid = order_machine();
    let scheduler = PeriodicEventScheduler::default();
    scheduler.start(Arc::clone(&paid)).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    paid.fire(Event::new("PAY")).unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;
    scheduler.stop();
    println!("Paid order: {}", paid.current_state());

    let stats = scheduler.stats();
    println!(
        "Ticks delivered: {}, failures: {}",
        stats.ticks_delivered, stats.failures
    );

    println!("\n=== Example Complete ===");
}
