use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `name:digest` shared library reference as stored in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SharedLibRef {
    pub name: String,
    pub digest: String,
}

impl SharedLibRef {
    pub fn new(name: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            digest: digest.into(),
        }
    }

    /// Library name portion of an encoded entry, without validating it.
    pub(crate) fn name_of(entry: &str) -> &str {
        entry.rsplit_once(':').map_or(entry, |(name, _)| name)
    }
}

impl fmt::Display for SharedLibRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.digest)
    }
}

impl FromStr for SharedLibRef {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once(':') {
            Some((name, digest)) if !name.is_empty() && !digest.is_empty() => {
                Ok(Self::new(name, digest))
            }
            _ => Err(SchemaError::InvalidSharedLib(s.to_owned())),
        }
    }
}
