use crate::config::ToolConfig;
use crate::container::PayloadKind;
use crate::RuntimeError;
use std::path::{Path, PathBuf};

/// Key material for the two signing steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKeys {
    /// Private key for the payload image signer.
    pub key: PathBuf,
    /// Public key for the payload image signer.
    pub pubkey: PathBuf,
    /// PKCS8 private key for the container signer.
    pub pk8key: PathBuf,
    /// x509 certificate for the container signer.
    pub x509key: PathBuf,
}

/// Inputs for rebuilding an unsigned container.
#[derive(Debug, Clone, Copy)]
pub struct PackageRequest<'a> {
    pub manifest_pb: &'a Path,
    pub manifest_json: Option<&'a Path>,
    pub build_info: &'a Path,
    pub assets: Option<&'a Path>,
    pub payload_dir: &'a Path,
    pub payload_kind: PayloadKind,
    pub keys: &'a SigningKeys,
}

/// The external collaborators used by the repack pipeline.
pub trait Toolchain: Send + Sync {
    fn name(&self) -> &str;

    /// Recursively dump the filesystem image at `image` into `dest`.
    fn dump_image(&self, image: &Path, dest: &Path) -> Result<(), RuntimeError>;

    /// Build an unsigned container at `output`.
    fn package(&self, request: &PackageRequest<'_>, output: &Path) -> Result<(), RuntimeError>;

    /// Sign the container at `unsigned`, writing the result to `output`.
    fn sign(&self, unsigned: &Path, keys: &SigningKeys, output: &Path)
        -> Result<(), RuntimeError>;
}

pub fn select_toolchain(
    name: &str,
    config: &ToolConfig,
) -> Result<Box<dyn Toolchain>, RuntimeError> {
    match name {
        "host" => Ok(Box::new(crate::host::HostToolchain::new(config.clone()))),
        "mock" => Ok(Box::new(crate::mock::MockToolchain::new())),
        other => Err(RuntimeError::UnknownToolchain(other.to_owned())),
    }
}
