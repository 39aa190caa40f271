//! The authenticated chat loop.
//!
//! After login the connection is split: a background receive task renders
//! everything the server pushes, while the foreground send task turns user
//! input into protocol commands and decides when the session ends. The two
//! tasks share a single boolean shutdown flag; whichever side detects
//! termination first flips it, and the other side exits on its next
//! iteration.

use anyhow::{Context, Result};
use tokio::{
    io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines},
    select,
    sync::watch,
};
use tracing::{info, warn};

use crate::{
    cli::Args,
    connection::{Connection, ReceiveHalf, SendHalf},
    protocol::{ClientCommand, ServerEvent},
    session::{self, LoginOutcome},
};

pub async fn run(args: Args) -> Result<()> {
    let mut conn = Connection::connect(&args.address, args.port)
        .await
        .with_context(|| format!("failed to connect to {}:{}", args.address, args.port))?;
    info!("connected to {}:{}", args.address, args.port);

    let mut input = BufReader::new(io::stdin()).lines();

    let username = match session::login(&mut input, &mut conn).await? {
        LoginOutcome::Authenticated(username) => username,
        LoginOutcome::Quit | LoginOutcome::ServerClosed | LoginOutcome::ServerFull => {
            return Ok(());
        }
    };
    info!(%username, "logged in");

    let (reader, mut writer) = conn.into_split();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let receive_task = tokio::spawn(receive_loop(reader, shutdown_tx.clone(), shutdown_rx.clone()));

    let send_result = send_loop(&mut input, &mut writer, shutdown_rx).await;

    // Orderly teardown: flag first, then half-close so the receive side is
    // unblocked and observes end-of-stream instead of being aborted
    // mid-read. Everything sent before the quit is already flushed.
    signal_shutdown(&shutdown_tx);
    shutdown_connection(&mut writer).await;
    if let Err(error) = receive_task.await {
        warn!(?error, "receive task did not exit cleanly");
    }

    send_result
}

/// Flips the shared shutdown flag. The flag only ever transitions false to
/// true; repeated signals are no-ops and notify nobody twice.
fn signal_shutdown(shutdown: &watch::Sender<bool>) {
    shutdown.send_if_modified(|stopping| {
        let first = !*stopping;
        *stopping = true;
        first
    });
}

/// Renders server lines until the shutdown flag flips or the stream ends.
/// A read error counts as the peer closing.
async fn receive_loop(
    mut reader: ReceiveHalf,
    shutdown: watch::Sender<bool>,
    mut stopping: watch::Receiver<bool>,
) {
    loop {
        select! {
            _ = stopping.changed() => break,
            line = reader.next_line() => match line {
                Ok(Some(line)) => {
                    if let Some(event) = ServerEvent::decode(&line) {
                        if let Err(error) = render_event(event).await {
                            warn!(?error, "failed to render server event");
                            signal_shutdown(&shutdown);
                            break;
                        }
                    }
                }
                Ok(None) => {
                    let _ = write_stdout("Connection closed by server.").await;
                    signal_shutdown(&shutdown);
                    break;
                }
                Err(error) => {
                    warn!(?error, "reading from the server failed");
                    signal_shutdown(&shutdown);
                    break;
                }
            }
        }
    }
}

/// Drives the session from user input until `!quit`, closed input, the
/// shutdown flag, or a write error.
async fn send_loop<I>(
    input: &mut Lines<I>,
    writer: &mut SendHalf,
    mut stopping: watch::Receiver<bool>,
) -> Result<()>
where
    I: AsyncBufRead + Unpin,
{
    loop {
        select! {
            _ = stopping.changed() => break,
            line = input.next_line() => {
                let Some(line) = line? else { break };
                match parse_input(line.trim()) {
                    InputAction::Quit => break,
                    InputAction::ListUsers => {
                        writer.send(&ClientCommand::ListUsers.to_line()).await?;
                    }
                    InputAction::Message { target, body } => {
                        let command = ClientCommand::Send { target, body };
                        writer.send(&command.to_line()).await?;
                    }
                    InputAction::Ignore => {}
                    InputAction::Unrecognized => {
                        write_stdout("Invalid input. Use !who, !quit, or @username <message>.")
                            .await?;
                    }
                }
            }
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum InputAction {
    Quit,
    ListUsers,
    Message { target: String, body: String },
    Ignore,
    Unrecognized,
}

/// Interprets one trimmed line of console input. A directed message needs
/// both a target and a non-empty body; a bare `@target` sends nothing.
fn parse_input(text: &str) -> InputAction {
    if text.is_empty() {
        return InputAction::Ignore;
    }
    if text == "!quit" {
        return InputAction::Quit;
    }
    if text == "!who" {
        return InputAction::ListUsers;
    }
    if let Some(rest) = text.strip_prefix('@') {
        let Some((target, body)) = rest.split_once(' ') else {
            return InputAction::Ignore;
        };
        let body = body.trim();
        if target.is_empty() || body.is_empty() {
            return InputAction::Ignore;
        }
        return InputAction::Message {
            target: target.to_string(),
            body: body.to_string(),
        };
    }
    InputAction::Unrecognized
}

async fn render_event(event: ServerEvent) -> io::Result<()> {
    match event {
        ServerEvent::SendAck => write_stdout("The message was sent successfully").await,
        ServerEvent::NoSuchUser => write_stdout("The destination user does not exist").await,
        ServerEvent::Delivery { from, body } => {
            write_stdout(&format!("From {from}: {body}")).await
        }
        ServerEvent::UserList { users } => {
            write_stdout(&format!("There are {} online users:", users.len())).await?;
            for user in &users {
                write_stdout(user).await?;
            }
            Ok(())
        }
        ServerEvent::ServerBusy => write_stdout("Cannot log in. The server is full!").await,
        ServerEvent::BadRequestHeader => {
            write_stdout("Error: Unknown issue in previous message header.").await
        }
        ServerEvent::BadRequestBody => {
            write_stdout("Error: Unknown issue in previous message body.").await
        }
        ServerEvent::Unknown { raw } => {
            write_stdout(&format!("Error: Unknown message header '{raw}'")).await
        }
    }
}

async fn shutdown_connection(writer: &mut SendHalf) {
    if let Err(error) = writer.shutdown().await {
        warn!(?error, "failed to shutdown the connection cleanly");
    }
}

pub(crate) async fn write_stdout(line: &str) -> io::Result<()> {
    let mut stdout = io::stdout();
    stdout.write_all(line.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await
}
