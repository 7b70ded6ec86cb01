//! Room operations and typing presence over a connected transport.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::{TimeZone, Utc};
use mingle_core::{ListenerSet, Room};
use mingle_harness::World;
use mingle_proto::{InboundEvent, OutboundEvent};
use proptest::prelude::*;
use serde_json::{Value, json};

fn connected_world() -> World {
    let mut world = World::with_defaults();
    world.connect(|_| {});
    world.server_accepts();
    world.log().clear();
    world
}

#[test]
fn join_room_with_last_message_emits_join_then_read() {
    let mut world = connected_world();
    let created = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 58).unwrap();

    world.chat_mut().join_room(&Room::new("r1").with_last_message("m42", created));

    assert_eq!(
        world.log().emitted(),
        vec![
            OutboundEvent::join_room("r1"),
            OutboundEvent::read_message("r1", "m42", "2024-02-29T23:59:58.000Z"),
        ]
    );
}

#[test]
fn join_room_without_last_message_emits_only_join() {
    let mut world = connected_world();
    world.chat_mut().join_room(&Room::new("r1"));
    assert_eq!(world.log().emitted(), vec![OutboundEvent::join_room("r1")]);
}

#[test]
fn leave_send_and_read_are_single_emissions() {
    let mut world = connected_world();
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    world.chat_mut().send_message("r1", "c0ffee", "hello there");
    world.chat_mut().read_message("r1", "m1", &created);
    world.chat_mut().leave_room("r1");

    assert_eq!(
        world.log().emitted(),
        vec![
            OutboundEvent::send_message("r1", "c0ffee", "hello there"),
            OutboundEvent::read_message("r1", "m1", "2024-01-01T00:00:00.000Z"),
            OutboundEvent::leave_room("r1"),
        ]
    );
}

#[test]
fn typing_then_disconnect_sends_exactly_one_stop() {
    let mut world = connected_world();

    world.set_writing("roomA");
    world.advance(Duration::from_millis(300));
    world.chat_mut().disconnect();
    world.advance(Duration::from_secs(10));

    assert_eq!(
        world.log().emitted(),
        vec![OutboundEvent::is_writing("roomA", true), OutboundEvent::is_writing("roomA", false)]
    );
    assert!(!world.chat().is_writing_announced());
}

#[test]
fn idle_stop_is_sent_for_the_room_typed_in() {
    let mut world = connected_world();
    world.set_writing("r1");
    world.advance(Duration::from_millis(999));
    assert_eq!(world.log().emitted().len(), 1);

    world.advance(Duration::from_millis(1));
    assert_eq!(world.log().emitted().last(), Some(&OutboundEvent::is_writing("r1", false)));
}

#[test]
fn lost_connection_drops_owed_stop() {
    let mut world = connected_world();
    world.set_writing("r1");
    world.server_drops("transport error");
    world.advance(Duration::from_secs(5));

    assert_eq!(world.log().emitted(), vec![OutboundEvent::is_writing("r1", true)]);
}

#[test]
fn inbound_events_reach_listeners() {
    let seen: Arc<Mutex<Vec<(&str, Value)>>> = Arc::new(Mutex::new(Vec::new()));
    let (a, b, c) = (seen.clone(), seen.clone(), seen.clone());
    let listeners = ListenerSet::new()
        .on_message_received(move |v| a.lock().unwrap().push(("received", v.clone())))
        .on_message_read(move |v| b.lock().unwrap().push(("read", v.clone())))
        .on_writing_state_change(move |v| c.lock().unwrap().push(("writing", v.clone())));

    let mut world = World::with_defaults();
    world.connect_with(listeners, |_| {});
    world.server_accepts();

    world.server_pushes(InboundEvent::WritingChanged(json!({"roomId": "r1", "state": true})));
    world.server_pushes(InboundEvent::MessageReceived(json!({"id": "m1", "text": "yo"})));
    world.server_pushes(InboundEvent::MessageRead(json!({"messageId": "m1"})));

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ("writing", json!({"roomId": "r1", "state": true})),
            ("received", json!({"id": "m1", "text": "yo"})),
            ("read", json!({"messageId": "m1"})),
        ]
    );
}

proptest! {
    #[test]
    fn typing_burst_announces_once_and_stops_once(gaps in prop::collection::vec(0u64..1000, 1..30)) {
        let mut world = connected_world();

        world.set_writing("r1");
        for gap in &gaps {
            world.advance(Duration::from_millis(*gap));
            world.set_writing("r1");
        }
        prop_assert_eq!(world.log().emitted(), vec![OutboundEvent::is_writing("r1", true)]);

        world.advance(Duration::from_millis(999));
        prop_assert_eq!(world.log().emitted().len(), 1);

        world.advance(Duration::from_millis(1));
        world.advance(Duration::from_secs(10));
        prop_assert_eq!(
            world.log().emitted(),
            vec![OutboundEvent::is_writing("r1", true), OutboundEvent::is_writing("r1", false)]
        );
    }
}
