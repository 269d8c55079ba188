// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! en-daemon: the ensign server process.
//!
//! Ties the actors together: configuration loading, the project router
//! owning the client socket, and supervisor startup (cache directory, port
//! file, actor wiring).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod env;
pub mod router;
pub mod supervisor;

pub use config::{load_config, parse_config, ConfigError};
pub use router::{Router, RouterCtrl, RpcHandles};
pub use supervisor::{run, Daemon, StartError};
