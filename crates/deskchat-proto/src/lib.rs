//! Wire protocol for deskchat.
//!
//! JSON types exchanged with the chat backend over HTTP and the WebSocket
//! stream. Nothing in this crate performs I/O; it only describes shapes and
//! how to decode them.
//!
//! # Components
//!
//! - [`RawMessage`]: A message record as the server stores it
//! - [`ServerFrame`]: Tagged union of live socket frames
//! - [`HistoryResponse`], [`SendRequest`], [`DeleteRequest`]: HTTP bodies
//! - [`RosterRecord`]: A user entry from the external roster
//! - [`close_code`]: WebSocket close codes and the clean-shutdown rule
//! - [`extract_error_message`]: Normalizes heterogeneous server error bodies

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod close_code;
mod error_body;
pub mod errors;
mod frame;
mod http;
mod message;
mod roster;

pub use error_body::{GENERIC_ERROR_MESSAGE, extract_error_message};
pub use errors::{ProtocolError, Result};
pub use frame::{DeletePayload, ServerFrame};
pub use http::{DecodedHistory, DeleteRequest, HistoryResponse, STATUS_SUCCESS, SendRequest, StatusBody, endpoints};
pub use message::{MessageKind, RawMessage};
pub use roster::RosterRecord;
