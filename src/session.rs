//! The login handshake.
//!
//! Prompts for a username, offers it to the server, and reacts to the
//! greeting. Rejections for a taken or malformed name loop back to the
//! prompt on the same, still-open connection; the user may retry
//! indefinitely until the server accepts, turns the client away, or the
//! user quits.

use anyhow::Result;
use tokio::io::{AsyncBufRead, Lines};

use crate::{
    client::write_stdout,
    connection::Connection,
    protocol::{self, ClientCommand, LoginReply},
};

/// How the login handshake ended. Everything except `Authenticated` means
/// the client is done and should exit cleanly.
#[derive(Debug)]
pub enum LoginOutcome {
    /// The server greeted us back; the session owns this username now.
    Authenticated(String),
    /// The user typed `!quit` at the prompt (or closed the input).
    Quit,
    ServerClosed,
    ServerFull,
}

/// Runs the handshake over `conn`, reading username candidates from
/// `input`. Candidates with forbidden characters are refused locally and
/// never reach the wire.
pub async fn login<I>(input: &mut Lines<I>, conn: &mut Connection) -> Result<LoginOutcome>
where
    I: AsyncBufRead + Unpin,
{
    loop {
        write_stdout("Welcome to Chat Client. Enter your login:").await?;

        let candidate = match input.next_line().await? {
            Some(line) => line.trim().to_string(),
            None => return Ok(LoginOutcome::Quit),
        };
        if candidate == "!quit" {
            return Ok(LoginOutcome::Quit);
        }
        if !protocol::is_valid_username(&candidate) {
            write_disallowed_name(&candidate).await?;
            continue;
        }

        let command = ClientCommand::Login {
            username: candidate.clone(),
        };
        conn.send(&command.to_line()).await?;

        let greeting = match conn.read_line().await? {
            Some(line) => line,
            None => {
                write_stdout("Server closed the connection.").await?;
                return Ok(LoginOutcome::ServerClosed);
            }
        };

        match LoginReply::classify(&greeting) {
            LoginReply::Accepted => {
                write_stdout(&format!("Successfully logged in as {candidate}!")).await?;
                return Ok(LoginOutcome::Authenticated(candidate));
            }
            LoginReply::NameInUse => {
                write_stdout(&format!(
                    "Cannot log in as {candidate}. That username is already in use."
                ))
                .await?;
            }
            LoginReply::ServerFull => {
                write_stdout("Cannot log in. The server is full!").await?;
                return Ok(LoginOutcome::ServerFull);
            }
            LoginReply::Rejected => write_disallowed_name(&candidate).await?,
            // An unrecognized greeting is not worth crashing over; fall
            // through to another attempt.
            LoginReply::Unrecognized => {}
        }
    }
}

async fn write_disallowed_name(candidate: &str) -> std::io::Result<()> {
    write_stdout(&format!(
        "Cannot log in as {candidate}. That username contains disallowed characters."
    ))
    .await
}
