use crate::payload::{extract_payload, locate_libraries, remove_dir_if_empty, LibDir};
use crate::scratch::Scratch;
use crate::sharedlibs::relocate_libraries;
use crate::strip::strip_libraries;
use crate::{CoreError, LibraryReport};
use repack_runtime::{extract_container, PackageRequest, SigningKeys, Toolchain};
use repack_schema::{ApexBuildInfo, ApexManifest, RecordFile};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

pub const DEFAULT_TARGET_LIBS: [&str; 2] = ["libc++.so", "libsharedlibtest.so"];
pub const DEFAULT_APEX_NAMESPACE: &str = "com.android.apex.test.sharedlibs";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepackMode {
    /// Replace libraries with symlinks into the shared-libs container.
    #[default]
    Strip,
    /// Move libraries into hash-addressed directories inside the payload.
    SharedLibs,
}

impl RepackMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RepackMode::Strip => "strip",
            RepackMode::SharedLibs => "sharedlibs",
        }
    }
}

impl fmt::Display for RepackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepackMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strip" => Ok(RepackMode::Strip),
            "sharedlibs" => Ok(RepackMode::SharedLibs),
            other => Err(CoreError::UnknownMode(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RepackOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Parent directory for every scratch entry of the run.
    pub tmpdir: PathBuf,
    pub mode: RepackMode,
    pub keys: SigningKeys,
    /// Target library basenames. The first one decides the library directory.
    pub libs: Vec<String>,
    pub namespace: String,
    pub keep_scratch: bool,
}

impl RepackOptions {
    pub fn new(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        tmpdir: impl Into<PathBuf>,
        keys: SigningKeys,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            tmpdir: tmpdir.into(),
            mode: RepackMode::default(),
            keys,
            libs: DEFAULT_TARGET_LIBS.iter().map(|s| (*s).to_owned()).collect(),
            namespace: DEFAULT_APEX_NAMESPACE.to_owned(),
            keep_scratch: false,
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RepackReport {
    pub mode: RepackMode,
    pub lib_dir: String,
    pub payload_type: &'static str,
    pub libraries: Vec<LibraryReport>,
    pub output: PathBuf,
}

/// Drives one repack run against a toolchain.
pub struct Repacker<'a> {
    toolchain: &'a dyn Toolchain,
}

impl<'a> Repacker<'a> {
    pub fn new(toolchain: &'a dyn Toolchain) -> Self {
        Self { toolchain }
    }

    /// Unpack `opts.input`, apply the mode's mutation and write the re-signed
    /// container to `opts.output`. Scratch space is released on return, on
    /// success and on failure alike, unless `keep_scratch` is set.
    pub fn run(&self, opts: &RepackOptions) -> Result<RepackReport, CoreError> {
        if opts.libs.is_empty() {
            return Err(CoreError::NoTargetLibraries);
        }
        info!(
            "repacking {} in {} mode with {} toolchain",
            opts.input.display(),
            opts.mode,
            self.toolchain.name()
        );
        let mut scratch = Scratch::new(&opts.tmpdir, opts.keep_scratch)?;

        let container_dir = scratch.dir("container_files_")?;
        let files = extract_container(&opts.input, &container_dir)?;
        let manifest_pb = files.require_manifest_pb()?;
        let build_info_pb = files.require_build_info()?;
        let payload = files.require_payload()?;

        let payload_dir = scratch.dir("extracted_payload_")?;
        extract_payload(self.toolchain, payload, &payload_dir)?;

        let lib_dir = LibDir::detect(&payload_dir, &opts.libs[0]);
        debug!("library directory: {lib_dir}");
        let libs = locate_libraries(&payload_dir, lib_dir, &opts.libs)?;

        let libraries = match opts.mode {
            RepackMode::Strip => {
                let mut manifest = RecordFile::<ApexManifest>::read(manifest_pb)?;
                let reports =
                    strip_libraries(&libs, lib_dir, &opts.namespace, &mut manifest.record)?;
                manifest.write(manifest_pb)?;
                reports
            }
            RepackMode::SharedLibs => {
                let mut build_info = RecordFile::<ApexBuildInfo>::read(build_info_pb)?;
                let mut fs_config = build_info.record.fs_config()?;
                let reports = relocate_libraries(&payload_dir, lib_dir, &libs, &mut fs_config)?;
                build_info.record.set_fs_config(&fs_config);
                build_info.write(build_info_pb)?;
                reports
            }
        };

        if remove_dir_if_empty(&payload_dir.join(lib_dir.as_str()))? {
            debug!("removed empty {lib_dir}");
        }

        let unsigned = scratch.file("repacked_", ".apex.unsigned")?;
        info!("packaging {}", unsigned.display());
        self.toolchain.package(
            &PackageRequest {
                manifest_pb,
                manifest_json: files.manifest_json.as_deref(),
                build_info: build_info_pb,
                assets: files.assets.as_deref(),
                payload_dir: &payload_dir,
                payload_kind: payload.kind,
                keys: &opts.keys,
            },
            &unsigned,
        )?;

        let signed = scratch.file("repacked_", ".apex")?;
        info!("signing {}", signed.display());
        self.toolchain.sign(&unsigned, &opts.keys, &signed)?;

        fs::copy(&signed, &opts.output)?;
        info!("wrote {}", opts.output.display());

        Ok(RepackReport {
            mode: opts.mode,
            lib_dir: lib_dir.as_str().to_owned(),
            payload_type: payload.kind.as_str(),
            libraries,
            output: opts.output.clone(),
        })
    }
}
