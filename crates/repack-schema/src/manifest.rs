use crate::record::Record;
use crate::shared_lib::SharedLibRef;
use crate::{write_atomic, SchemaError};
use prost::Message;
use std::fs;
use std::path::Path;

/// Container manifest (`apex_manifest.pb`).
///
/// Fields beyond the ones listed here are dropped by `write`. Use
/// [`RecordFile`](crate::RecordFile) to carry them through a rewrite.
#[derive(Clone, PartialEq, Eq, Message)]
pub struct ApexManifest {
    #[prost(string, tag = "1")]
    pub name: String,

    #[prost(int64, tag = "2")]
    pub version: i64,

    #[prost(string, tag = "3")]
    pub pre_install_hook: String,

    #[prost(string, tag = "4")]
    pub post_install_hook: String,

    #[prost(string, tag = "5")]
    pub version_name: String,

    #[prost(bool, tag = "6")]
    pub no_code: bool,

    #[prost(string, repeated, tag = "7")]
    pub provide_native_libs: Vec<String>,

    #[prost(string, repeated, tag = "8")]
    pub require_native_libs: Vec<String>,

    #[prost(string, repeated, tag = "9")]
    pub jni_libs: Vec<String>,

    /// `name:sha512` entries for libraries provided by the shared-libs container.
    #[prost(string, repeated, tag = "10")]
    pub require_shared_apex_libs: Vec<String>,

    #[prost(bool, tag = "11")]
    pub provide_shared_apex_libs: bool,

    /// Set on compressed containers only.
    #[prost(message, optional, tag = "12")]
    pub capex_metadata: Option<CompressedApexMetadata>,

    #[prost(bool, tag = "13")]
    pub supports_rebootless_update: bool,
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct CompressedApexMetadata {
    #[prost(string, tag = "1")]
    pub original_apex_digest: String,
}

impl Record for ApexManifest {
    const NAME: &'static str = "apex manifest";
    const TAGS: &'static [u32] = &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13];
}

impl ApexManifest {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SchemaError> {
        Self::decode(bytes).map_err(|source| SchemaError::Decode {
            record: Self::NAME,
            source,
        })
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Encode the whole record and replace the file at `path`.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), SchemaError> {
        write_atomic(path.as_ref(), &self.encode_to_vec())
    }

    pub fn shared_libs(&self) -> Result<Vec<SharedLibRef>, SchemaError> {
        self.require_shared_apex_libs
            .iter()
            .map(|s| s.parse())
            .collect()
    }

    /// Record a shared library reference, replacing any existing entry
    /// for the same library name.
    pub fn add_shared_lib(&mut self, lib: &SharedLibRef) {
        let encoded = lib.to_string();
        let existing = self
            .require_shared_apex_libs
            .iter()
            .position(|entry| SharedLibRef::name_of(entry) == lib.name);
        match existing {
            Some(idx) => self.require_shared_apex_libs[idx] = encoded,
            None => self.require_shared_apex_libs.push(encoded),
        }
    }
}
