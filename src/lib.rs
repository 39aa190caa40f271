//! Interactive client for a line-oriented TCP chat protocol.
//!
//! The client logs in with a display name, then lets the user send directed
//! messages (`@user hello`) and list who is online (`!who`) while messages
//! delivered by the server are printed asynchronously. Each module focuses
//! on a concrete responsibility:
//!
//! - [`cli`] parses the command-line interface.
//! - [`protocol`] encodes client commands and classifies server lines.
//! - [`connection`] owns the socket and reassembles newline-framed lines
//!   from the byte stream.
//! - [`session`] drives the login handshake until the server accepts a
//!   username or turns the client away.
//! - [`client`] runs the authenticated chat loop, multiplexing stdin and
//!   server messages until quit or disconnect.
//!
//! Integration tests use this crate directly to exercise the handshake and
//! the wire protocol against in-process fake servers.

pub mod cli;
pub mod client;
pub mod connection;
pub mod protocol;
pub mod session;
