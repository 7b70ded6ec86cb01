//! Terminal rendering of inbound payloads.
//!
//! Server payloads are passed through untyped; rendering picks out the
//! fields it knows and falls back to the raw JSON.

use serde_json::Value;

fn field<'a>(payload: &'a Value, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|name| payload.get(*name).and_then(Value::as_str))
}

/// `[room] author: text` for a received message.
pub fn message(payload: &Value) -> String {
    let Some(text) = field(payload, &["text"]) else {
        return format!("? {payload}");
    };
    let author = field(payload, &["author", "userName", "userId"]).unwrap_or("someone");
    match field(payload, &["roomId"]) {
        Some(room) => format!("[{room}] {author}: {text}"),
        None => format!("{author}: {text}"),
    }
}

/// Typing indicator line, or `None` when someone stopped typing.
pub fn writing(payload: &Value) -> Option<String> {
    if !payload.get("state").and_then(Value::as_bool).unwrap_or(false) {
        return None;
    }
    let who = field(payload, &["userName", "userId"]).unwrap_or("someone");
    Some(match field(payload, &["roomId"]) {
        Some(room) => format!("[{room}] {who} is typing..."),
        None => format!("{who} is typing..."),
    })
}
