//! Model-based property tests.
//!
//! These tests generate random operation sequences and verify that the real
//! connection manager behaves identically to the reference model.
//!
//! # Architecture
//!
//! ```text
//! proptest generates: Vec<Operation>
//!                          │
//!           ┌──────────────┼──────────────┐
//!           ▼              ▼              ▼
//!    ModelConnection     World         Compare
//!      (reference)    (recording)      Results
//! ```

use std::time::Duration;

use mingle_core::ChatConfig;
use mingle_harness::{CallbackProbe, ModelConnection, Operation, World, model::room_name};
use mingle_proto::OutboundEvent;
use proptest::prelude::*;

const CONNECT_TIMEOUT_MS: u64 = 2000;
const WRITING_IDLE_MS: u64 = 1000;

fn config(max_retries: u32) -> ChatConfig {
    ChatConfig {
        connect_timeout: Duration::from_millis(CONNECT_TIMEOUT_MS),
        writing_idle: Duration::from_millis(WRITING_IDLE_MS),
        max_retries,
        ..ChatConfig::default()
    }
}

fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        3 => Just(Operation::Connect),
        1 => Just(Operation::Disconnect),
        2 => Just(Operation::ServerAccepts),
        1 => Just(Operation::ServerCloses),
        4 => (0u64..3000).prop_map(Operation::AdvanceMs),
        3 => (0u8..3).prop_map(Operation::SetWriting),
    ]
}

fn apply_real(world: &mut World, probe: &CallbackProbe, op: &Operation) {
    match op {
        Operation::Connect => world.connect(probe.callback()),
        Operation::Disconnect => world.chat_mut().disconnect(),
        Operation::ServerAccepts => world.server_accepts(),
        Operation::ServerCloses => world.server_closes("closed by model"),
        Operation::AdvanceMs(ms) => world.advance(Duration::from_millis(*ms)),
        Operation::SetWriting(n) => world.set_writing(&room_name(*n)),
    }
}

fn writing_signals(world: &World) -> Vec<(String, bool)> {
    world
        .log()
        .emitted()
        .into_iter()
        .filter_map(|event| match event {
            OutboundEvent::IsWriting(p) => Some((p.room_id, p.state)),
            _ => None,
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn real_matches_model(
        max_retries in 0u32..4,
        ops in prop::collection::vec(operation(), 1..40),
    ) {
        let mut model = ModelConnection::new(CONNECT_TIMEOUT_MS, WRITING_IDLE_MS, max_retries);
        let mut world = World::new(config(max_retries));
        let probe = CallbackProbe::new();

        for (step, op) in ops.iter().enumerate() {
            model.apply(op);
            apply_real(&mut world, &probe, op);

            prop_assert_eq!(world.chat().state(), model.state(), "state after step {} ({:?})", step, op);
            prop_assert_eq!(probe.results(), model.resolved().to_vec(), "callbacks after step {} ({:?})", step, op);
        }

        prop_assert_eq!(world.log().opens(), model.opens());
        prop_assert_eq!(world.log().reconnects(), model.reconnects());
        prop_assert_eq!(world.log().closes(), model.closes());
        prop_assert_eq!(writing_signals(&world), model.writing_signals().to_vec());
    }

    #[test]
    fn at_most_one_transport_is_ever_created(
        ops in prop::collection::vec(operation(), 1..60),
    ) {
        let mut world = World::new(config(3));
        let probe = CallbackProbe::new();
        for op in &ops {
            apply_real(&mut world, &probe, op);
        }
        prop_assert!(world.log().opens() <= 1);
    }

    #[test]
    fn every_callback_resolves_once_after_disconnect(
        ops in prop::collection::vec(operation(), 1..40),
    ) {
        let mut world = World::new(config(3));
        let probe = CallbackProbe::new();
        for op in &ops {
            apply_real(&mut world, &probe, op);
        }

        world.chat_mut().disconnect();
        world.advance(Duration::from_secs(60));

        prop_assert!(!world.chat().is_connected());
        prop_assert!(probe.all_resolved_once());
    }

    #[test]
    fn announced_writing_always_has_pending_stop(
        ops in prop::collection::vec(operation(), 1..40),
    ) {
        let mut world = World::new(config(3));
        let probe = CallbackProbe::new();
        for op in &ops {
            apply_real(&mut world, &probe, op);
            if world.chat().is_writing_announced() {
                prop_assert!(world.chat().next_deadline().is_some());
            }
        }
    }
}
