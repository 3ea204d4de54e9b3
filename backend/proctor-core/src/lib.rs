//! Client-side core of the proctored-test application.
//!
//! The centre of this crate is a typed message bus over one persistent
//! WebSocket connection to the desktop bridge process:
//!
//! - [`envelope`]: wire shape (`{"Typ", "Val"}`) and the closed set of message kinds
//! - [`connection`]: the single connection, its state, and raw frame send/receive
//! - [`dispatch`]: fan-out of inbound envelopes to subscribers, with unsubscribe handles
//! - [`bus`]: the facade every screen talks to (`connect`, `send`, `subscribe`)
//!
//! Around it sit the collaborators the screens need: the exam-server HTTP
//! client ([`submission`]), the root subscription set and offline watcher
//! ([`shell`]), and the per-test actions ([`workflow`]).

pub mod bus;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod shell;
pub mod submission;
pub mod workflow;

#[cfg(test)]
mod tests;

pub const BRIDGE_HOSTNAME: &str = "127.0.0.1";
pub const BRIDGE_PORT: u16 = 9753;
pub const DEFAULT_BRIDGE_URL: &str =
    const_format::concatcp!("ws://", BRIDGE_HOSTNAME, ":", BRIDGE_PORT, "/ws");

pub const EXAM_SERVER_HOSTNAME: &str = "127.0.0.1";
pub const EXAM_SERVER_PORT: u16 = 8080;
pub const DEFAULT_EXAM_SERVER_URL: &str =
    const_format::concatcp!("http://", EXAM_SERVER_HOSTNAME, ":", EXAM_SERVER_PORT);
