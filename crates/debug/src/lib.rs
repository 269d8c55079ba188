// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! en-debug: the target-VM debug controller.
//!
//! A single actor owns at most one VM connection. Requests arrive as
//! [`DebugMsg::Rpc`]; the backend's pump thread posts translated
//! [`vm::VmEvent`]s into the same mailbox, so all bookkeeping (breakpoints,
//! source maps, the pinning table) is actor-private. The only shared
//! mutable object is the VM adapter handle behind its mutex.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod backtrace;
pub mod breakpoints;
pub mod controller;
pub mod jdwp;
pub mod pin;
pub mod source_map;
pub mod summary;
pub mod vm;

#[cfg(test)]
pub(crate) mod test_support;

pub use controller::{DebugManager, DebugMsg};
pub use jdwp::JdwpConnector;
pub use pin::PinTable;
pub use source_map::SourceMap;
pub use vm::{TargetVm, VmConnector, VmEvent};

use thiserror::Error;

/// Errors from the VM adapter and the controller.
#[derive(Debug, Error)]
pub enum DebugError {
    #[error("target vm disconnected")]
    Disconnected,

    #[error("no active debug vm")]
    NotConnected,

    #[error("io: {0}")]
    Io(String),

    #[error("debug wire protocol: {0}")]
    Protocol(String),

    #[error("debug command failed with code {code}")]
    Command { code: u16 },

    #[error("launch failed: {0}")]
    Launch(String),

    #[error("{0}")]
    Invalid(String),
}
