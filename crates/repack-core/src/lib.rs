//! Repack pipeline for shared-library test containers.
//!
//! This crate ties together the record schema and the external toolchain into
//! the `Repacker`: unpack the container, dump the payload, hash the target
//! libraries, apply the `strip` or `sharedlibs` mutation, then rebuild and
//! re-sign. Scratch space is owned by a `Scratch` arena and released on every
//! exit path.

pub mod digest;
pub mod engine;
pub mod payload;
pub mod scratch;
pub mod sharedlibs;
pub mod strip;

pub use digest::{sha512_bytes, sha512_file};
pub use engine::{
    RepackMode, RepackOptions, RepackReport, Repacker, DEFAULT_APEX_NAMESPACE, DEFAULT_TARGET_LIBS,
};
pub use payload::{extract_payload, locate_libraries, remove_dir_if_empty, LibDir, TargetLib};
pub use scratch::Scratch;
pub use sharedlibs::relocate_libraries;
pub use strip::{external_lib_path, strip_libraries};

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("record error: {0}")]
    Schema(#[from] repack_schema::SchemaError),
    #[error("runtime error: {0}")]
    Runtime(#[from] repack_runtime::RuntimeError),
    #[error("library {name} not found in {}", .dir.display())]
    LibraryNotFound { name: String, dir: PathBuf },
    #[error("{} is not a regular file (payload already stripped?)", .0.display())]
    NotRegularFile(PathBuf),
    #[error("no target libraries given")]
    NoTargetLibraries,
    #[error("unknown repack mode '{0}', expected 'strip' or 'sharedlibs'")]
    UnknownMode(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What happened to one target library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryReport {
    pub name: String,
    pub sha512: String,
    /// Absolute in-image path before the mutation, e.g. `/lib64/libc++.so`.
    pub original_path: String,
    /// Absolute in-image path of the library bytes afterwards. For `strip`
    /// this is the external location the symlink points at.
    pub final_path: String,
    pub symlink: bool,
}
