use crate::{write_atomic, SchemaError};
use prost::encoding::{decode_key, skip_field, DecodeContext};
use prost::{DecodeError, Message};
use std::fs;
use std::path::Path;

/// A protobuf record type with a fixed set of modelled field tags.
pub trait Record: Message + Default {
    /// Name used in decode errors.
    const NAME: &'static str;
    /// Tags of every field the Rust type models.
    const TAGS: &'static [u32];
}

/// A decoded record together with the encoded bytes of every field the
/// record type does not model. Those bytes are re-appended unchanged on
/// write, so a read/modify/write cycle never loses data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFile<M> {
    pub record: M,
    unknown: Vec<u8>,
}

impl<M: Record> RecordFile<M> {
    pub fn new(record: M) -> Self {
        Self {
            record,
            unknown: Vec::new(),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SchemaError> {
        let decode_error = |source| SchemaError::Decode {
            record: M::NAME,
            source,
        };
        let record = M::decode(bytes).map_err(decode_error)?;
        let unknown = unknown_fields(bytes, M::TAGS).map_err(decode_error)?;
        Ok(Self { record, unknown })
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Raw wire bytes of the fields not modelled by `M`, in input order.
    pub fn unknown_fields(&self) -> &[u8] {
        &self.unknown
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.record.encode_to_vec();
        bytes.extend_from_slice(&self.unknown);
        bytes
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), SchemaError> {
        write_atomic(path.as_ref(), &self.to_bytes())
    }
}

/// Copy out every top-level field whose tag is not in `known`.
fn unknown_fields(bytes: &[u8], known: &[u32]) -> Result<Vec<u8>, DecodeError> {
    let mut unknown = Vec::new();
    let mut buf = bytes;
    while !buf.is_empty() {
        let start = bytes.len() - buf.len();
        let (tag, wire_type) = decode_key(&mut buf)?;
        skip_field(wire_type, tag, &mut buf, DecodeContext::default())?;
        if !known.contains(&tag) {
            unknown.extend_from_slice(&bytes[start..bytes.len() - buf.len()]);
        }
    }
    Ok(unknown)
}
