use crate::RuntimeError;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

pub const MANIFEST_JSON: &str = "apex_manifest.json";
pub const MANIFEST_PB: &str = "apex_manifest.pb";
pub const BUILD_INFO_PB: &str = "apex_build_info.pb";
pub const ASSETS_DIR: &str = "assets";
pub const PAYLOAD_IMG: &str = "apex_payload.img";
pub const PAYLOAD_ZIP: &str = "apex_payload.zip";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Image,
    Zip,
}

impl PayloadKind {
    /// Value for the packager's `--payload_type` flag.
    pub fn as_str(self) -> &'static str {
        match self {
            PayloadKind::Image => "image",
            PayloadKind::Zip => "zip",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub path: PathBuf,
    pub kind: PayloadKind,
}

/// Well-known files found at the top level of an extracted container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerFiles {
    pub manifest_json: Option<PathBuf>,
    pub manifest_pb: Option<PathBuf>,
    pub build_info: Option<PathBuf>,
    pub assets: Option<PathBuf>,
    pub payload: Option<Payload>,
}

impl ContainerFiles {
    /// Classify the contents of `dir`. An image payload is preferred over a
    /// zip payload when both are present.
    pub fn classify(dir: &Path) -> Self {
        let present = |name: &str| {
            let path = dir.join(name);
            path.exists().then_some(path)
        };

        let payload = present(PAYLOAD_IMG)
            .map(|path| Payload {
                path,
                kind: PayloadKind::Image,
            })
            .or_else(|| {
                present(PAYLOAD_ZIP).map(|path| Payload {
                    path,
                    kind: PayloadKind::Zip,
                })
            });

        Self {
            manifest_json: present(MANIFEST_JSON),
            manifest_pb: present(MANIFEST_PB),
            build_info: present(BUILD_INFO_PB),
            assets: present(ASSETS_DIR),
            payload,
        }
    }

    pub fn require_manifest_pb(&self) -> Result<&Path, RuntimeError> {
        self.manifest_pb
            .as_deref()
            .ok_or_else(|| RuntimeError::MissingArtifact(MANIFEST_PB.to_owned()))
    }

    pub fn require_build_info(&self) -> Result<&Path, RuntimeError> {
        self.build_info
            .as_deref()
            .ok_or_else(|| RuntimeError::MissingArtifact(BUILD_INFO_PB.to_owned()))
    }

    pub fn require_payload(&self) -> Result<&Payload, RuntimeError> {
        self.payload.as_ref().ok_or_else(|| {
            RuntimeError::MissingArtifact(format!("{PAYLOAD_IMG} or {PAYLOAD_ZIP}"))
        })
    }
}

/// Extract every entry of the zip archive at `archive` into `dest`.
pub fn extract_zip(archive: &Path, dest: &Path) -> Result<(), RuntimeError> {
    let corrupt = |source| RuntimeError::CorruptContainer {
        path: archive.to_path_buf(),
        source,
    };
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(file).map_err(corrupt)?;
    debug!(
        "extracting {} entries from {} into {}",
        zip.len(),
        archive.display(),
        dest.display()
    );
    zip.extract(dest).map_err(corrupt)?;
    Ok(())
}

/// Unpack a container archive into `dest` and classify what came out.
pub fn extract_container(archive: &Path, dest: &Path) -> Result<ContainerFiles, RuntimeError> {
    extract_zip(archive, dest)?;
    Ok(ContainerFiles::classify(dest))
}
