//! Input line parsing.
//!
//! This module parses stdin lines into structured [`Command`] values.

/// Parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send a message to the active room.
    Message {
        /// Message text.
        content: String,
    },

    /// Leave the active room and join another.
    Join {
        /// Room to switch to.
        room_id: String,
    },

    /// Mark a message in the active room as read now.
    Read {
        /// Message to acknowledge.
        message_id: String,
    },

    /// Leave the room and exit.
    Quit,

    /// Unknown command.
    Unknown {
        /// The original input.
        input: String,
    },

    /// Command with missing arguments.
    InvalidArgs {
        /// Command name.
        command: String,
        /// Error message.
        error: String,
    },
}

/// Parse a line of user input.
///
/// Commands start with `/`. Anything else is a message.
pub fn parse(input: &str) -> Command {
    let input = input.trim();

    let Some(cmd_str) = input.strip_prefix('/') else {
        return Command::Message { content: input.to_string() };
    };

    let parts: Vec<&str> = cmd_str.split_whitespace().collect();
    let command = parts.first().copied().unwrap_or("");

    match command {
        "join" => match parts.get(1) {
            Some(room_id) => Command::Join { room_id: (*room_id).to_string() },
            None => Command::InvalidArgs {
                command: "join".into(),
                error: "Usage: /join <room_id>".into(),
            },
        },

        "read" => match parts.get(1) {
            Some(message_id) => Command::Read { message_id: (*message_id).to_string() },
            None => Command::InvalidArgs {
                command: "read".into(),
                error: "Usage: /read <message_id>".into(),
            },
        },

        "quit" | "q" => Command::Quit,

        _ => Command::Unknown { input: input.to_string() },
    }
}
