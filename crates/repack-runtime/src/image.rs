//! Tar stand-in for filesystem images, used by [`MockToolchain`](crate::MockToolchain).
//!
//! Symlinks are stored as links and never followed, so a stripped payload
//! survives a pack/unpack cycle. Children are visited in name order and
//! headers carry no owner or timestamp.

use crate::RuntimeError;
use std::fs;
use std::path::Path;
use tracing::warn;

pub fn pack_image(source_dir: &Path) -> Result<Vec<u8>, RuntimeError> {
    let mut ar = tar::Builder::new(Vec::new());
    ar.follow_symlinks(false);
    ar.mode(tar::HeaderMode::Deterministic);
    append_tree(&mut ar, source_dir, Path::new(""))?;
    Ok(ar.into_inner()?)
}

pub fn unpack_image(image: &Path, dest: &Path) -> Result<(), RuntimeError> {
    fs::create_dir_all(dest)?;
    let mut ar = tar::Archive::new(fs::File::open(image)?);
    ar.set_preserve_permissions(true);
    ar.set_preserve_mtime(false);
    ar.set_unpack_xattrs(false);
    ar.unpack(dest)?;
    Ok(())
}

fn append_tree(
    ar: &mut tar::Builder<Vec<u8>>,
    dir: &Path,
    prefix: &Path,
) -> Result<(), RuntimeError> {
    let mut children = fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    children.sort_by_key(fs::DirEntry::file_name);
    for child in children {
        let name = prefix.join(child.file_name());
        let file_type = child.file_type()?;
        if !(file_type.is_dir() || file_type.is_file() || file_type.is_symlink()) {
            warn!("skipping unsupported file type: {}", name.display());
            continue;
        }
        ar.append_path_with_name(child.path(), &name)?;
        if file_type.is_dir() {
            append_tree(ar, &child.path(), &name)?;
        }
    }
    Ok(())
}
