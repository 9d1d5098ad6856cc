use crate::digest::sha512_file;
use crate::CoreError;
use repack_runtime::container::{MANIFEST_JSON, MANIFEST_PB};
use repack_runtime::{extract_zip, Payload, PayloadKind, Toolchain};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const LOST_AND_FOUND: &str = "lost+found";

/// Conventional library directory inside the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibDir {
    Lib64,
    Lib,
}

impl LibDir {
    pub fn as_str(self) -> &'static str {
        match self {
            LibDir::Lib64 => "lib64",
            LibDir::Lib => "lib",
        }
    }

    /// `lib64` if `first_lib` is present there (a symlink counts), else `lib`.
    pub fn detect(payload_dir: &Path, first_lib: &str) -> Self {
        let candidate = payload_dir.join(LibDir::Lib64.as_str()).join(first_lib);
        if candidate.symlink_metadata().is_ok() {
            LibDir::Lib64
        } else {
            LibDir::Lib
        }
    }

    /// In-image absolute path of `name` in this directory.
    pub fn image_path(self, name: &str) -> String {
        format!("/{}/{name}", self.as_str())
    }
}

impl fmt::Display for LibDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A target library located in the extracted payload, hashed before any
/// mutation touches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLib {
    pub name: String,
    pub path: PathBuf,
    pub digest: String,
}

/// Dump the payload into `dest` and drop the files the packager re-adds on
/// its own (`apex_manifest.*`, `lost+found/`).
pub fn extract_payload(
    toolchain: &dyn Toolchain,
    payload: &Payload,
    dest: &Path,
) -> Result<(), CoreError> {
    info!("extracting payload {}", payload.path.display());
    match payload.kind {
        PayloadKind::Image => toolchain.dump_image(&payload.path, dest)?,
        PayloadKind::Zip => extract_zip(&payload.path, dest)?,
    }

    for name in [MANIFEST_JSON, MANIFEST_PB] {
        let path = dest.join(name);
        if path.symlink_metadata().is_ok() {
            debug!("removing injected {name}");
            fs::remove_file(&path)?;
        }
    }
    let lost = dest.join(LOST_AND_FOUND);
    if lost.is_dir() {
        debug!("removing {LOST_AND_FOUND}");
        fs::remove_dir_all(&lost)?;
    }
    Ok(())
}

/// Find each of `names` under `lib_dir` and hash it. Order follows `names`.
///
/// Every library must be a regular file in that one directory. A library
/// found only in the other directory is reported as missing rather than
/// silently picked up from there.
pub fn locate_libraries(
    payload_dir: &Path,
    lib_dir: LibDir,
    names: &[String],
) -> Result<Vec<TargetLib>, CoreError> {
    let dir = payload_dir.join(lib_dir.as_str());
    let mut libs = Vec::with_capacity(names.len());
    for name in names {
        let path = dir.join(name);
        let meta = match path.symlink_metadata() {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CoreError::LibraryNotFound {
                    name: name.clone(),
                    dir,
                });
            }
            Err(e) => return Err(e.into()),
        };
        if !meta.is_file() {
            return Err(CoreError::NotRegularFile(path));
        }
        let digest = sha512_file(&path)?;
        debug!("{}/{name}: sha512 {digest}", lib_dir.as_str());
        libs.push(TargetLib {
            name: name.clone(),
            path,
            digest,
        });
    }
    Ok(libs)
}

/// Remove `dir` if it exists and has no entries. Returns whether it was removed.
pub fn remove_dir_if_empty(dir: &Path) -> Result<bool, CoreError> {
    let mut entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    if entries.next().is_some() {
        debug!("{} not empty, leaving it", dir.display());
        return Ok(false);
    }
    fs::remove_dir(dir)?;
    Ok(true)
}
