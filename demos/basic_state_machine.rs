//! Basic State Machine
//!
//! This example drives a connection through its lifecycle with named events.
//!
//! Key concepts:
//! - Transitions keyed by (state, event kind)
//! - Handlers that can refuse a transition
//! - Unmatched events leave the state unchanged
//!
//! Run with: cargo run --example basic_state_machine

use tickstate::builder::{simple_transition, StateMachineBuilder};
use tickstate::core::Event;
use tickstate::engine::{HandlerError, Transition};

fn main() {
    println!("=== Basic State Machine Example ===\n");

    let machine = StateMachineBuilder::new(["DISCONNECTED", "CONNECTING", "CONNECTED"], "DISCONNECTED")
        .final_state("CONNECTED")
        .register(simple_transition("dial", "DISCONNECTED", "CONNECTING", "DIAL"))
        .transition(
            Transition::builder()
                .name("handshake")
                .from("CONNECTING")
                .to("CONNECTED")
                .on("ACK")
                .handler(|event: &Event| -> Result<(), HandlerError> {
                    match event.payload().and_then(|p| p["session"].as_u64()) {
                        Some(session) => {
                            println!("  handshake accepted for session {session}");
                            Ok(())
                        }
                        None => Err("ACK without a session id".into()),
                    }
                }),
        )
        .unwrap()
        .build()
        .unwrap();

    println!("Initial state: {}", machine.current_state());

    // Not valid from DISCONNECTED
    if let Err(e) = machine.fire(Event::new("ACK")) {
        println!("Rejected: {e}");
    }

    let state = machine.fire(Event::new("DIAL")).unwrap();
    println!("After DIAL: {state}");

    // The handler refuses an ACK without a session
    if let Err(e) = machine.fire(Event::new("ACK")) {
        println!("Rejected: {e}");
    }
    println!("Still in: {}", machine.current_state());

    let ack = Event::new("ACK").with_payload(serde_json::json!({ "session": 42 }));
    let state = machine.fire(ack).unwrap();
    println!("After ACK: {state}");
    println!("Is in final state: {}", machine.is_final());

    let path: Vec<String> = machine
        .history()
        .get_path()
        .iter()
        .map(|s| s.to_string())
        .collect();
    println!("Path: {}", path.join(" -> "));

    println!("\n=== Example Complete ===");
}
