use crate::RuntimeError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const PREBUILT_JAVA: &str = "prebuilts/jdk/jdk11/linux-x86/bin/java";
const DEFAULT_SDK_TOOLS_PATH: &str = "prebuilts/sdk/tools/linux/bin";
const DEFAULT_SIGNATURE_MODULUS: u32 = 4096;

/// Where the external tools live.
///
/// `tools_dir` is the host tools `bin/` directory holding `debugfs_static`
/// and `apexer`; the signer jar and the JNI libraries for java are looked up
/// in its parent directory unless overridden.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolConfig {
    pub tools_dir: PathBuf,
    #[serde(default)]
    pub java: Option<PathBuf>,
    #[serde(default = "default_sdk_tools_path")]
    pub sdk_tools_path: String,
    #[serde(default)]
    pub signapk_jar: Option<PathBuf>,
    #[serde(default = "default_signature_modulus")]
    pub signature_modulus: u32,
}

fn default_sdk_tools_path() -> String {
    DEFAULT_SDK_TOOLS_PATH.to_owned()
}

fn default_signature_modulus() -> u32 {
    DEFAULT_SIGNATURE_MODULUS
}

impl ToolConfig {
    pub fn new(tools_dir: impl Into<PathBuf>) -> Self {
        Self {
            tools_dir: tools_dir.into(),
            java: None,
            sdk_tools_path: default_sdk_tools_path(),
            signapk_jar: None,
            signature_modulus: DEFAULT_SIGNATURE_MODULUS,
        }
    }

    #[must_use]
    pub fn with_java(mut self, java: impl Into<PathBuf>) -> Self {
        self.java = Some(java.into());
        self
    }

    pub fn load(path: &Path) -> Result<Self, RuntimeError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            RuntimeError::Config(format!("invalid tool config {}: {e}", path.display()))
        })
    }

    pub fn tool(&self, name: &str) -> PathBuf {
        self.tools_dir.join(name)
    }

    /// Parent of the tools `bin/` directory.
    pub fn host_dir(&self) -> PathBuf {
        match self.tools_dir.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    pub fn java(&self) -> PathBuf {
        if let Some(java) = &self.java {
            return java.clone();
        }
        if Path::new(PREBUILT_JAVA).is_file() {
            PathBuf::from(PREBUILT_JAVA)
        } else {
            PathBuf::from("java")
        }
    }

    pub fn java_library_path(&self) -> String {
        let host = self.host_dir();
        format!(
            "{}:{}",
            host.join("lib64").display(),
            host.join("lib").display()
        )
    }

    pub fn signapk_jar(&self) -> PathBuf {
        self.signapk_jar
            .clone()
            .unwrap_or_else(|| self.host_dir().join("framework").join("signapk.jar"))
    }

    pub fn apexer_tool_path(&self) -> String {
        format!("{}:{}", self.tools_dir.display(), self.sdk_tools_path)
    }
}
