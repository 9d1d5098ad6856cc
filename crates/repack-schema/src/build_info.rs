use crate::fs_config::FsConfig;
use crate::record::Record;
use crate::{write_atomic, SchemaError};
use prost::Message;
use std::fs;
use std::path::Path;

/// Build-info record (`apex_build_info.pb`) written by the packager.
#[derive(Clone, PartialEq, Eq, Message)]
pub struct ApexBuildInfo {
    #[prost(string, tag = "1")]
    pub apexer_command_line: String,

    #[prost(bytes = "vec", tag = "2")]
    pub file_contexts: Vec<u8>,

    /// Newline separated `<path> <uid> <gid> <mode>` rows.
    #[prost(bytes = "vec", tag = "3")]
    pub canned_fs_config: Vec<u8>,

    #[prost(bytes = "vec", tag = "4")]
    pub android_manifest: Vec<u8>,

    #[prost(string, tag = "5")]
    pub min_sdk_version: String,

    #[prost(string, tag = "6")]
    pub target_sdk_version: String,

    #[prost(bool, tag = "7")]
    pub no_hashtree: bool,

    #[prost(string, tag = "8")]
    pub override_apk_package_name: String,

    #[prost(string, tag = "9")]
    pub logging_parent: String,

    #[prost(string, tag = "10")]
    pub payload_fs_type: String,
}

impl Record for ApexBuildInfo {
    const NAME: &'static str = "apex build info";
    const TAGS: &'static [u32] = &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
}

impl ApexBuildInfo {
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

    pub fn fs_config(&self) -> Result<FsConfig, SchemaError> {
        let text = String::from_utf8(self.canned_fs_config.clone())?;
        text.parse()
    }

    pub fn set_fs_config(&mut self, config: &FsConfig) {
        self.canned_fs_config = config.to_string().into_bytes();
    }
}
