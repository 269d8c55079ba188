// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! en-wire: the S-expression wire protocol.
//!
//! Frame format: six lowercase hex digits of payload byte count, then the
//! payload. Three message shapes travel the wire:
//!
//! - request  `(:swank-rpc FORM CALL-ID)`
//! - reply    `(:return (:ok VALUE) CALL-ID)` or
//!            `(:return (:abort CODE DETAIL) CALL-ID)`
//! - event    `(:EVENT-TAG PAYLOAD...)`

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod convert;
mod frame;
mod rpc;
mod sexp;

pub use convert::{
    debug_value_to_wire, event_to_wire, outbound_to_wire, response_to_wire, symbol_to_wire,
    type_info_to_wire,
};
pub use frame::{read_frame, write_frame, MAX_FRAME_LEN};
pub use rpc::parse_frame;
pub use sexp::{parse, SExp};

use en_core::ErrorKind;
use thiserror::Error;

/// Errors from reading, writing, or interpreting frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection closed")]
    ConnectionClosed,

    #[error("invalid frame header: {0}")]
    InvalidHeader(String),

    #[error("frame too large: {0} bytes")]
    FrameTooLarge(usize),

    #[error("malformed message: {0}")]
    Parse(String),

    #[error("malformed rpc: {0}")]
    Malformed(String),

    #[error("unrecognized form: {0}")]
    UnrecognizedForm(String),

    #[error("unrecognized rpc: {0}")]
    UnrecognizedRpc(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// The wire code reported for this error when it reaches the client.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProtocolError::Parse(_)
            | ProtocolError::Malformed(_)
            | ProtocolError::InvalidHeader(_)
            | ProtocolError::FrameTooLarge(_) => ErrorKind::MalformedRpc,
            ProtocolError::UnrecognizedForm(_) => ErrorKind::UnrecognizedForm,
            ProtocolError::UnrecognizedRpc(_) => ErrorKind::UnrecognizedRpc,
            ProtocolError::ConnectionClosed | ProtocolError::Io(_) => ErrorKind::Misc,
        }
    }
}
