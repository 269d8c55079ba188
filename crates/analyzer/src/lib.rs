// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! en-analyzer: the façade actor in front of the language tooling.
//!
//! The actor owns nothing semantic itself; it gates requests until the
//! initial typecheck completes, routes them to the compiler seams, patches
//! sources, keeps prepared-refactoring state, and forwards the two symbol
//! search RPCs to the indexer verbatim.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod actor;
pub mod compiler;
pub mod patch;

#[cfg(test)]
pub(crate) mod test_support;

pub use actor::{Analyzer, AnalyzerDeps, AnalyzerMsg};
pub use compiler::{
    CompilerError, JavaCompiler, NoopCompiler, RefactorTransformer, SemanticCompiler,
    SourceFormatter,
};
pub use patch::apply_edits;

use std::path::PathBuf;

use en_core::ErrorKind;
use thiserror::Error;

/// Errors surfaced by analyzer request handlers.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("format failed: {0}")]
    Format(String),

    #[error(transparent)]
    Compiler(#[from] CompilerError),
}

impl AnalyzerError {
    /// The abort kind reported to the client.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalyzerError::FileNotFound(_) => ErrorKind::FileNotFound,
            AnalyzerError::Format(_) => ErrorKind::FormatFailed,
            AnalyzerError::Compiler(_) => ErrorKind::AnalyzerException,
        }
    }
}
