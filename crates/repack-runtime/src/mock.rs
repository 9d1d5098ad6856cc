use crate::backend::{PackageRequest, SigningKeys, Toolchain};
use crate::container::{
    PayloadKind, ASSETS_DIR, BUILD_INFO_PB, MANIFEST_JSON, MANIFEST_PB, PAYLOAD_IMG, PAYLOAD_ZIP,
};
use crate::image::{pack_image, unpack_image};
use crate::RuntimeError;
use std::fs::{self, File};
use std::io::{Cursor, Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// A recorded toolchain invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    DumpImage {
        image: PathBuf,
        dest: PathBuf,
    },
    Package {
        payload_dir: PathBuf,
        payload_kind: PayloadKind,
        with_manifest_json: bool,
        with_assets: bool,
        output: PathBuf,
    },
    Sign {
        unsigned: PathBuf,
        output: PathBuf,
    },
}

/// In-process toolchain for tests.
///
/// Images are tar archives (see [`crate::image`]), packaging writes a zip
/// container with the same well-known entry names the real packager uses,
/// and signing copies the container unchanged. Every call is recorded.
#[derive(Default)]
pub struct MockToolchain {
    calls: Mutex<Vec<MockCall>>,
    fail_on: Option<&'static str>,
}

impl MockToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// A toolchain whose `stage` ("dump", "package" or "sign") exits non-zero.
    pub fn failing(stage: &'static str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on: Some(stage),
        }
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: MockCall, stage: &'static str) -> Result<(), RuntimeError> {
        self.calls
            .lock()
            .map_err(|e| RuntimeError::Config(format!("mutex poisoned: {e}")))?
            .push(call);
        if self.fail_on == Some(stage) {
            return Err(RuntimeError::CommandFailed {
                command: format!("mock-{stage}"),
                code: Some(1),
                output: format!("mock {stage} failure\n"),
            });
        }
        Ok(())
    }
}

impl Toolchain for MockToolchain {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn dump_image(&self, image: &Path, dest: &Path) -> Result<(), RuntimeError> {
        self.record(
            MockCall::DumpImage {
                image: image.to_path_buf(),
                dest: dest.to_path_buf(),
            },
            "dump",
        )?;
        unpack_image(image, dest)
    }

    fn package(&self, request: &PackageRequest<'_>, output: &Path) -> Result<(), RuntimeError> {
        self.record(
            MockCall::Package {
                payload_dir: request.payload_dir.to_path_buf(),
                payload_kind: request.payload_kind,
                with_manifest_json: request.manifest_json.is_some(),
                with_assets: request.assets.is_some(),
                output: output.to_path_buf(),
            },
            "package",
        )?;

        let options = SimpleFileOptions::default();
        let mut w = ZipWriter::new(File::create(output)?);
        add_file(&mut w, MANIFEST_PB, &fs::read(request.manifest_pb)?)?;
        if let Some(json) = request.manifest_json {
            add_file(&mut w, MANIFEST_JSON, &fs::read(json)?)?;
        }
        add_file(&mut w, BUILD_INFO_PB, &fs::read(request.build_info)?)?;
        if let Some(assets) = request.assets {
            w.add_directory(format!("{ASSETS_DIR}/"), options)
                .map_err(zip_err)?;
            add_tree(&mut w, assets, assets, ASSETS_DIR)?;
        }
        match request.payload_kind {
            PayloadKind::Image => {
                add_file(&mut w, PAYLOAD_IMG, &pack_image(request.payload_dir)?)?;
            }
            PayloadKind::Zip => {
                let mut inner = ZipWriter::new(Cursor::new(Vec::new()));
                add_tree(&mut inner, request.payload_dir, request.payload_dir, "")?;
                let bytes = inner.finish().map_err(zip_err)?.into_inner();
                add_file(&mut w, PAYLOAD_ZIP, &bytes)?;
            }
        }
        w.finish().map_err(zip_err)?;
        Ok(())
    }

    fn sign(
        &self,
        unsigned: &Path,
        _keys: &SigningKeys,
        output: &Path,
    ) -> Result<(), RuntimeError> {
        self.record(
            MockCall::Sign {
                unsigned: unsigned.to_path_buf(),
                output: output.to_path_buf(),
            },
            "sign",
        )?;
        fs::copy(unsigned, output)?;
        Ok(())
    }
}

fn zip_err(e: zip::result::ZipError) -> RuntimeError {
    RuntimeError::Io(std::io::Error::other(e))
}

fn add_file<W: Write + Seek>(
    w: &mut ZipWriter<W>,
    name: &str,
    data: &[u8],
) -> Result<(), RuntimeError> {
    w.start_file(name, SimpleFileOptions::default())
        .map_err(zip_err)?;
    w.write_all(data)?;
    Ok(())
}

fn add_tree<W: Write + Seek>(
    w: &mut ZipWriter<W>,
    root: &Path,
    current: &Path,
    prefix: &str,
) -> Result<(), RuntimeError> {
    let mut entries: Vec<_> = fs::read_dir(current)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(fs::DirEntry::file_name);
    for entry in entries {
        let full = entry.path();
        let rel = full
            .strip_prefix(root)
            .map_err(|e| RuntimeError::Io(std::io::Error::other(format!("path strip: {e}"))))?
            .to_string_lossy()
            .into_owned();
        let name = if prefix.is_empty() {
            rel
        } else {
            format!("{prefix}/{rel}")
        };
        let ft = full.symlink_metadata()?.file_type();
        if ft.is_symlink() {
            let target = fs::read_link(&full)?;
            w.add_symlink(name, target.to_string_lossy(), SimpleFileOptions::default())
                .map_err(zip_err)?;
        } else if ft.is_dir() {
            w.add_directory(format!("{name}/"), SimpleFileOptions::default())
                .map_err(zip_err)?;
            add_tree(w, root, &full, prefix)?;
        } else {
            add_file(w, &name, &fs::read(&full)?)?;
        }
    }
    Ok(())
}
