//! Connection lifecycle tests.
//!
//! Drives the chat connection manager over a recording transport and a
//! virtual clock:
//! - Connect, shared attempts and idempotent reconnects
//! - Timeout-driven retries and exhaustion
//! - Transport close and early disconnect
//! - Listener binding across reconnects

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use mingle_core::{AuthToken, ChatConfig, ConnectionState, Environment, ListenerSet};
use mingle_harness::{CallbackProbe, TransportCall, World};
use mingle_proto::InboundEvent;
use proptest::prelude::*;
use serde_json::json;

#[test]
fn connect_resolves_true_on_server_accept() {
    let mut world = World::with_defaults();
    let probe = CallbackProbe::new();

    world.connect(probe.callback());
    assert!(world.chat().is_connecting());
    assert!(probe.results().is_empty());

    world.server_accepts();
    assert!(world.chat().is_connected());
    assert_eq!(probe.results(), vec![(0, true)]);
}

#[test]
fn first_attempt_opens_transport_with_token_and_no_auto_reconnect() {
    let mut world = World::with_defaults();
    world.connect(|_| {});

    let calls = world.log().calls();
    let [TransportCall::Open(options)] = calls.as_slice() else {
        panic!("expected a single open, got {calls:?}");
    };
    assert_eq!(options.authorization, "test-token");
    assert_eq!(options.namespace, "/chat");
    assert!(!options.reconnection);
}

#[test]
fn connect_when_connected_is_immediate_and_silent() {
    let mut world = World::with_defaults();
    world.connect(|_| {});
    world.server_accepts();
    world.log().clear();

    let probe = CallbackProbe::new();
    world.connect(probe.callback());

    assert_eq!(probe.results(), vec![(0, true)]);
    assert!(world.log().calls().is_empty());
}

#[test]
fn concurrent_connects_share_one_transport() {
    let mut world = World::with_defaults();
    let probe = CallbackProbe::new();

    for _ in 0..5 {
        world.connect(probe.callback());
    }
    assert_eq!(world.log().opens(), 1);
    assert_eq!(world.log().attempts(), 1);
    assert!(probe.results().is_empty());

    world.server_accepts();
    assert_eq!(probe.results(), vec![(0, true), (1, true), (2, true), (3, true), (4, true)]);
}

#[test]
fn silent_server_fails_once_after_all_retries() {
    let mut world = World::with_defaults();
    let probe = CallbackProbe::new();
    world.connect(probe.callback());

    world.advance(Duration::from_millis(7999));
    assert!(probe.results().is_empty());
    assert!(world.chat().is_connecting());
    assert_eq!(world.log().attempts(), 4);

    world.advance(Duration::from_millis(1));
    assert_eq!(probe.results(), vec![(0, false)]);
    assert_eq!(world.elapsed(), Duration::from_millis(8000));
    assert_eq!(world.chat().state(), ConnectionState::Disconnected);

    world.advance(Duration::from_secs(60));
    assert_eq!(probe.results(), vec![(0, false)]);
    assert_eq!(world.log().attempts(), 4);
}

#[test]
fn caller_joining_mid_retry_is_resolved_with_the_attempt() {
    let mut world = World::with_defaults();
    let probe = CallbackProbe::new();
    world.connect(probe.callback());

    world.advance(Duration::from_millis(3000));
    world.connect(probe.callback());
    assert_eq!(world.log().attempts(), 2);

    world.server_accepts();
    assert_eq!(probe.results(), vec![(0, true), (1, true)]);
}

#[test]
fn retry_reuses_transport_and_resupplies_token() {
    let mut world = World::with_defaults();
    world.connect(|_| {});
    world.advance(Duration::from_millis(2000));

    assert_eq!(
        world.log().calls()[1..],
        [TransportCall::Reconnect("test-token".to_string())]
    );
}

#[test]
fn retries_keep_the_token_the_attempt_started_with() {
    let mut world = World::with_defaults();
    world.connect(|_| {});

    let now = world.env().now();
    world.chat_mut().connect(now, &AuthToken::new("late-token", 60), ListenerSet::new(), |_| {});
    world.advance(Duration::from_millis(2000));

    assert_eq!(
        world.log().calls()[1..],
        [TransportCall::Reconnect("test-token".to_string())]
    );
}

#[test]
fn transport_close_fails_without_retry() {
    let mut world = World::with_defaults();
    let probe = CallbackProbe::new();
    world.connect(probe.callback());

    world.server_closes("unauthorized");
    assert_eq!(probe.results(), vec![(0, false)]);

    world.advance(Duration::from_secs(30));
    assert_eq!(world.log().attempts(), 1);
    assert_eq!(world.chat().state(), ConnectionState::Disconnected);
}

#[test]
fn disconnect_while_connecting_resolves_synchronously() {
    let mut world = World::with_defaults();
    let probe = CallbackProbe::new();
    world.connect(probe.callback());
    world.connect(probe.callback());

    world.chat_mut().disconnect();

    assert!(!world.chat().is_connected());
    assert!(!world.chat().is_connecting());
    assert_eq!(probe.results(), vec![(0, false), (1, false)]);

    // A late accept and the old timeout must not resolve anything again.
    world.server_accepts();
    world.advance(Duration::from_secs(30));
    assert_eq!(probe.results(), vec![(0, false), (1, false)]);
    assert_eq!(world.chat().state(), ConnectionState::Disconnected);
}

#[test]
fn disconnect_when_connected_closes_transport() {
    let mut world = World::with_defaults();
    world.connect(|_| {});
    world.server_accepts();

    world.chat_mut().disconnect();
    assert!(!world.chat().is_connected());
    assert_eq!(world.log().closes(), 1);

    world.chat_mut().disconnect();
    assert_eq!(world.log().closes(), 1);
}

#[test]
fn lost_connection_can_reconnect() {
    let mut world = World::with_defaults();
    world.connect(|_| {});
    world.server_accepts();
    world.server_drops("ping timeout");
    assert_eq!(world.chat().state(), ConnectionState::Disconnected);

    let probe = CallbackProbe::new();
    world.connect(probe.callback());
    world.server_accepts();
    assert_eq!(probe.results(), vec![(0, true)]);
    assert_eq!(world.log().opens(), 1);
    assert_eq!(world.log().reconnects(), 1);
}

#[test]
fn listeners_are_bound_once_per_transport() {
    let first = Arc::new(Mutex::new(0));
    let second = Arc::new(Mutex::new(0));
    let mut world = World::with_defaults();

    let counter = first.clone();
    world.connect_with(
        ListenerSet::new().on_message_received(move |_| *counter.lock().unwrap() += 1),
        |_| {},
    );
    world.server_accepts();
    world.chat_mut().disconnect();

    let counter = second.clone();
    world.connect_with(
        ListenerSet::new().on_message_received(move |_| *counter.lock().unwrap() += 1),
        |_| {},
    );
    world.server_accepts();
    world.server_pushes(InboundEvent::MessageReceived(json!({"id": "m1"})));

    assert_eq!(*first.lock().unwrap(), 1);
    assert_eq!(*second.lock().unwrap(), 0);
}

#[test]
fn discarded_transport_binds_new_listeners() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut world = World::with_defaults();
    world.connect(|_| {});
    world.server_accepts();
    world.chat_mut().discard_transport();

    let sink = seen.clone();
    world.connect_with(
        ListenerSet::new().on_message_read(move |v| sink.lock().unwrap().push(v.clone())),
        |_| {},
    );
    world.server_accepts();
    world.server_pushes(InboundEvent::MessageRead(json!({"messageId": "m3"})));

    assert_eq!(world.log().opens(), 2);
    assert_eq!(*seen.lock().unwrap(), vec![json!({"messageId": "m3"})]);
}

#[test]
fn custom_timing_is_honored() {
    let config = ChatConfig {
        connect_timeout: Duration::from_millis(500),
        max_retries: 1,
        ..ChatConfig::default()
    };
    let mut world = World::new(config);
    let probe = CallbackProbe::new();
    world.connect(probe.callback());

    world.advance(Duration::from_millis(999));
    assert!(probe.results().is_empty());
    world.advance(Duration::from_millis(1));
    assert_eq!(probe.results(), vec![(0, false)]);
}

proptest! {
    #[test]
    fn n_retries_fail_after_n_plus_one_timeouts(retries in 0u32..8, callers in 1usize..5) {
        let mut world = World::with_defaults();
        let probe = CallbackProbe::new();
        for _ in 0..callers {
            world.connect_with_retries(Some(Box::new(probe.callback())), retries);
        }

        let timeout = Duration::from_millis(2000);
        for _ in 0..retries {
            world.advance(timeout);
            prop_assert!(probe.results().is_empty());
        }
        world.advance(timeout - Duration::from_millis(1));
        prop_assert!(probe.results().is_empty());

        world.advance(Duration::from_millis(1));
        prop_assert_eq!(probe.outcomes(), vec![false; callers]);
        prop_assert!(probe.all_resolved_once());
        prop_assert_eq!(world.log().attempts(), retries as usize + 1);
    }
}
