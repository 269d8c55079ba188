// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! en-index: the classpath symbol index.
//!
//! A classpath walker parses class-file headers into symbol results, a
//! dedicated writer actor drains them into a tantivy index on disk, and
//! keyword/fuzzy/prefix/import-suggestion queries run against the committed
//! reader. Re-index decisions compare content hashes tagged onto the last
//! commit against the proposed classpath.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod actor;
pub mod classfile;
pub mod reindex;
pub mod store;
pub mod suggest;
pub mod tokenize;
pub mod walker;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_support;

pub use actor::{Indexer, IndexerMsg};
pub use reindex::{hash_classpath, should_reindex, IndexMetadata, INDEX_VERSION};
pub use store::SearchIndex;
pub use suggest::EditDistanceCache;
pub use tokenize::{split_type_name, tokenize};
pub use walker::{valid_method, valid_type, IndexFilter};

use thiserror::Error;

/// Errors from index maintenance and queries.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("index io: {0}")]
    Io(#[from] std::io::Error),

    #[error("tantivy: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    #[error("index directory: {0}")]
    OpenDirectory(#[from] tantivy::directory::error::OpenDirectoryError),

    #[error("archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("malformed class file: {0}")]
    ClassFile(String),

    #[error("index metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("index writer stopped")]
    WriterStopped,

    #[error("index initialization timed out")]
    Timeout,

    #[error("index unavailable after failed initialization")]
    Unavailable,
}
