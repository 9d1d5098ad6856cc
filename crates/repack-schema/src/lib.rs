//! Serialized records carried inside a shared-libs test container.
//!
//! This crate defines the schema layer: the protobuf `ApexManifest` and
//! `ApexBuildInfo` records (wrapped in `RecordFile` so unmodelled fields
//! survive a rewrite), the canned fs-config table stored inside the
//! build-info record (`FsConfig`), and the `name:digest` shared-library
//! references listed in the manifest (`SharedLibRef`).

pub mod build_info;
pub mod fs_config;
pub mod manifest;
pub mod record;
pub mod shared_lib;

pub use build_info::ApexBuildInfo;
pub use fs_config::{FsConfig, FsConfigEntry};
pub use manifest::{ApexManifest, CompressedApexMetadata};
pub use record::{Record, RecordFile};
pub use shared_lib::SharedLibRef;

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read record: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode {record}: {source}")]
    Decode {
        record: &'static str,
        #[source]
        source: prost::DecodeError,
    },
    #[error("malformed canned fs-config line {line_no}: '{line}' (expected '<path> <uid> <gid> <mode>')")]
    MalformedFsConfig { line_no: usize, line: String },
    #[error("canned fs-config is not valid UTF-8")]
    FsConfigEncoding(#[from] std::string::FromUtf8Error),
    #[error("invalid shared library reference '{0}', expected '<name>:<digest>'")]
    InvalidSharedLib(String),
}

/// Replace `path` with `bytes` via a temp file in the same directory.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SchemaError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| SchemaError::Io(e.error))?;
    Ok(())
}
