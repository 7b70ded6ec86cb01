//! Interactive chat session.

use std::io::Write;

use chrono::Utc;
use mingle_client::{AuthToken, ChatClient, ListenerSet, Room, spawn_websocket};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    args::Args,
    commands::{self, Command},
    error::CliError,
    render,
};

fn print_line(line: &str) {
    let _ = writeln!(std::io::stdout().lock(), "{line}");
}

fn listeners() -> ListenerSet {
    ListenerSet::new()
        .on_message_received(|payload| print_line(&render::message(payload)))
        .on_writing_state_change(|payload| {
            if let Some(line) = render::writing(payload) {
                print_line(&line);
            }
        })
        .on_message_read(|payload| debug!(%payload, "message read"))
}

/// Run a session until stdin closes or `/quit`.
pub async fn run(args: Args) -> Result<(), CliError> {
    let (client, runtime) = spawn_websocket(args.chat_config())?;

    // Issuance time is not known here; the server owns expiry.
    let token = AuthToken::new(args.token.clone(), 0);
    if !client.connect(token, listeners()).await {
        return Err(CliError::ConnectFailed { url: args.url.clone() });
    }
    info!(url = %args.url, room = %args.room, "connected");

    let mut room = args.room.clone();
    client.join_room(Room::new(room.clone()));

    let result = read_input(&client, &mut room).await;

    client.leave_room(room);
    client.disconnect().await;
    drop(client);
    if let Err(error) = runtime.await {
        warn!(%error, "chat runtime ended abnormally");
    }
    result
}

async fn read_input(client: &ChatClient, room: &mut String) -> Result<(), CliError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match commands::parse(&line) {
            Command::Message { content } if content.is_empty() => {},
            Command::Message { content } => {
                client.set_writing(room.clone());
                client.send_message(room.clone(), Uuid::new_v4().to_string(), content);
            },
            Command::Join { room_id } => {
                client.leave_room(room.clone());
                *room = room_id;
                client.join_room(Room::new(room.clone()));
                print_line(&format!("joined {room}"));
            },
            Command::Read { message_id } => {
                client.read_message(room.clone(), message_id, Utc::now());
            },
            Command::Quit => break,
            Command::Unknown { input } => print_line(&format!("unknown command: {input}")),
            Command::InvalidArgs { command, error } => print_line(&format!("/{command}: {error}")),
        }
    }
    Ok(())
}
