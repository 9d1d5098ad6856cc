//! External collaborators for the shared-libs repack tool.
//!
//! This crate implements everything that touches the world outside the payload
//! tree: unpacking and classifying the container archive (`extract_container`),
//! the pluggable `Toolchain` trait with a host implementation that shells out
//! to `debugfs_static`, `apexer` and `signapk.jar` and an in-process mock,
//! tool location configuration (`ToolConfig`) and prerequisite checking.

pub mod backend;
pub mod config;
pub mod container;
pub mod exec;
pub mod host;
pub mod image;
pub mod mock;
pub mod prereq;

pub use backend::{select_toolchain, PackageRequest, SigningKeys, Toolchain};
pub use config::ToolConfig;
pub use container::{extract_container, extract_zip, ContainerFiles, Payload, PayloadKind};
pub use exec::{display_command, run_and_check_output};
pub use host::HostToolchain;
pub use image::{pack_image, unpack_image};
pub use mock::{MockCall, MockToolchain};
pub use prereq::{check_host_tools, format_missing, MissingPrereq};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(
        "failed to run command '{command}' (exit code {}):\n{output}",
        .code.map_or_else(|| "none".to_owned(), |c| c.to_string())
    )]
    CommandFailed {
        command: String,
        code: Option<i32>,
        output: String,
    },
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt container archive {}: {source}", .path.display())]
    CorruptContainer {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("missing required artifact: {0}")]
    MissingArtifact(String),
    #[error("invalid tool configuration: {0}")]
    Config(String),
    #[error("unknown toolchain '{0}'")]
    UnknownToolchain(String),
}
