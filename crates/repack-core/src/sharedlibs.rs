use crate::payload::{LibDir, TargetLib};
use crate::{CoreError, LibraryReport};
use repack_schema::{FsConfig, FsConfigEntry};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const AID_ROOT: u32 = 0;
const AID_SHELL: u32 = 2000;
const AID_SYSTEM: u32 = 1000;
const DIR_MODE: u32 = 0o755;
const FILE_MODE: u32 = 0o644;

/// Move every library to `<libdir>/<name>/<digest>/<name>` inside the payload
/// and rewrite the fs-config rows to match.
///
/// All original rows are dropped before any file moves, matched by exact path.
pub fn relocate_libraries(
    payload_dir: &Path,
    lib_dir: LibDir,
    libs: &[TargetLib],
    fs_config: &mut FsConfig,
) -> Result<Vec<LibraryReport>, CoreError> {
    let originals: Vec<String> = libs.iter().map(|l| lib_dir.image_path(&l.name)).collect();
    let removed = fs_config.remove_paths(&originals);
    debug!("dropped {removed} fs-config rows for relocated libraries");

    let base = payload_dir.join(lib_dir.as_str());
    let mut reports = Vec::with_capacity(libs.len());
    for (lib, original) in libs.iter().zip(originals) {
        // The file and its new directory share a name, so park the file first.
        let parked = base.join(format!("{}.bak", lib.name));
        fs::rename(&lib.path, &parked)?;
        let hash_dir = base.join(&lib.name).join(&lib.digest);
        fs::create_dir_all(&hash_dir)?;
        fs::rename(&parked, hash_dir.join(&lib.name))?;

        let name_dir = original.clone();
        let digest_dir = format!("{name_dir}/{}", lib.digest);
        let final_path = format!("{digest_dir}/{}", lib.name);
        fs_config.push(FsConfigEntry::new(&name_dir, AID_ROOT, AID_SHELL, DIR_MODE));
        fs_config.push(FsConfigEntry::new(&digest_dir, AID_ROOT, AID_SHELL, DIR_MODE));
        fs_config.push(FsConfigEntry::new(&final_path, AID_SYSTEM, AID_SYSTEM, FILE_MODE));
        info!("{original} -> {final_path}");

        reports.push(LibraryReport {
            name: lib.name.clone(),
            sha512: lib.digest.clone(),
            original_path: original,
            final_path,
            symlink: false,
        });
    }
    Ok(reports)
}
