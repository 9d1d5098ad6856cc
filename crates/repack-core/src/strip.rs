use crate::payload::{LibDir, TargetLib};
use crate::{CoreError, LibraryReport};
use repack_schema::{ApexManifest, SharedLibRef};
use std::fs;
use std::os::unix::fs::symlink;
use tracing::{debug, info};

/// Where the shared-libs container mounts `name` with content hash `digest`.
pub fn external_lib_path(namespace: &str, lib_dir: LibDir, name: &str, digest: &str) -> String {
    format!("/apex/{namespace}/{lib_dir}/{name}/{digest}/{name}")
}

/// Replace every library with a symlink to its external location and record
/// `name:digest` in the manifest. The link targets are never created here.
///
/// Existing manifest references must parse; a malformed one fails the call
/// before any library is touched.
pub fn strip_libraries(
    libs: &[TargetLib],
    lib_dir: LibDir,
    namespace: &str,
    manifest: &mut ApexManifest,
) -> Result<Vec<LibraryReport>, CoreError> {
    let existing = manifest.shared_libs()?;
    debug!("manifest already lists {} shared libraries", existing.len());

    let mut reports = Vec::with_capacity(libs.len());
    for lib in libs {
        manifest.add_shared_lib(&SharedLibRef::new(&lib.name, &lib.digest));

        let target = external_lib_path(namespace, lib_dir, &lib.name, &lib.digest);
        fs::remove_file(&lib.path)?;
        symlink(&target, &lib.path)?;
        info!("{} -> {target}", lib_dir.image_path(&lib.name));

        reports.push(LibraryReport {
            name: lib.name.clone(),
            sha512: lib.digest.clone(),
            original_path: lib_dir.image_path(&lib.name),
            final_path: target,
            symlink: true,
        });
    }
    Ok(reports)
}
