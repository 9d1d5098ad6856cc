use crate::SchemaError;
use std::fmt;
use std::str::FromStr;

/// One `<path> <uid> <gid> <mode>` row of a canned fs-config table.
///
/// Fields are kept as written so an untouched table serializes back
/// byte for byte. Anything after the mode (e.g. `capabilities=0x0`)
/// lands in `extra`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsConfigEntry {
    pub path: String,
    pub uid: String,
    pub gid: String,
    pub mode: String,
    pub extra: Vec<String>,
}

impl FsConfigEntry {
    pub fn new(path: impl Into<String>, uid: u32, gid: u32, mode: u32) -> Self {
        Self {
            path: path.into(),
            uid: uid.to_string(),
            gid: gid.to_string(),
            mode: format!("{mode:04o}"),
            extra: Vec::new(),
        }
    }

    fn parse_line(line: &str, line_no: usize) -> Result<Self, SchemaError> {
        let mut fields = line.split_whitespace().map(str::to_owned);
        let malformed = || SchemaError::MalformedFsConfig {
            line_no,
            line: line.to_owned(),
        };
        let path = fields.next().ok_or_else(malformed)?;
        let uid = fields.next().ok_or_else(malformed)?;
        let gid = fields.next().ok_or_else(malformed)?;
        let mode = fields.next().ok_or_else(malformed)?;
        Ok(Self {
            path,
            uid,
            gid,
            mode,
            extra: fields.collect(),
        })
    }
}

impl fmt::Display for FsConfigEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.path, self.uid, self.gid, self.mode)?;
        for field in &self.extra {
            write!(f, " {field}")?;
        }
        Ok(())
    }
}

/// Ordered canned fs-config table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FsConfig {
    entries: Vec<FsConfigEntry>,
}

impl FsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FsConfigEntry> {
        self.entries.iter()
    }

    pub fn find(&self, path: &str) -> Option<&FsConfigEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn push(&mut self, entry: FsConfigEntry) {
        self.entries.push(entry);
    }

    /// Drop every row whose path is exactly one of `paths`. Returns how many
    /// rows were removed.
    pub fn remove_paths<S: AsRef<str>>(&mut self, paths: &[S]) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|e| !paths.iter().any(|p| p.as_ref() == e.path));
        before - self.entries.len()
    }
}

impl FromStr for FsConfig {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut entries = Vec::new();
        for (idx, line) in s.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            entries.push(FsConfigEntry::parse_line(line, idx + 1)?);
        }
        Ok(Self { entries })
    }
}

impl fmt::Display for FsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a FsConfig {
    type Item = &'a FsConfigEntry;
    type IntoIter = std::slice::Iter<'a, FsConfigEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANNED: &str = "\
/ 1000 1000 0755
/apex_manifest.json 1000 1000 0644
/apex_manifest.pb 1000 1000 0644
/bin 0 2000 0755
/bin/foo_test 0 2000 0755
/lib64 0 2000 0755
/lib64/libc++.so 1000 1000 0644
/lib64/libsharedlibtest.so 1000 1000 0644
";

    #[test]
    fn parse_then_serialize_is_identical() {
        let config: FsConfig = CANNED.parse().unwrap();
        assert_eq!(config.len(), 8);
        assert_eq!(config.to_string(), CANNED);
    }

    #[test]
    fn parses_fields() {
        let config: FsConfig = CANNED.parse().unwrap();
        let lib = config.find("/lib64/libc++.so").unwrap();
        assert_eq!(lib.uid, "1000");
        assert_eq!(lib.gid, "1000");
        assert_eq!(lib.mode, "0644");
    }

    #[test]
    fn keeps_trailing_fields() {
        let line = "/bin/ping 0 2000 0755 capabilities=0x2000\n";
        let config: FsConfig = line.parse().unwrap();
        let entry = config.find("/bin/ping").unwrap();
        assert_eq!(entry.extra, vec!["capabilities=0x2000"]);
        assert_eq!(config.to_string(), line);
    }

    #[test]
    fn collapses_whitespace_runs() {
        let config: FsConfig = "/lib64\t0  2000   0755".parse().unwrap();
        assert_eq!(config.to_string(), "/lib64 0 2000 0755\n");
    }

    #[test]
    fn skips_blank_lines() {
        let config: FsConfig = "/ 0 0 0755\n\n   \n/lib 0 0 0755\n".parse().unwrap();
        assert_eq!(config.len(), 2);
    }

    #[test]
    fn rejects_short_line() {
        let err = "/ 0 0 0755\n/lib64 0 2000\n".parse::<FsConfig>().unwrap_err();
        match err {
            SchemaError::MalformedFsConfig { line_no, line } => {
                assert_eq!(line_no, 2);
                assert_eq!(line, "/lib64 0 2000");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn remove_paths_is_exact_match() {
        let mut config: FsConfig = CANNED.parse().unwrap();
        config.push(FsConfigEntry::new("/lib64/libc++.so.1", 1000, 1000, 0o644));
        config.push(FsConfigEntry::new("/lib/libc++.so", 1000, 1000, 0o644));

        let removed = config.remove_paths(&["/lib64/libc++.so", "/lib64/libsharedlibtest.so"]);
        assert_eq!(removed, 2);
        assert!(config.find("/lib64/libc++.so").is_none());
        assert!(config.find("/lib64/libsharedlibtest.so").is_none());
        assert!(config.find("/lib64/libc++.so.1").is_some());
        assert!(config.find("/lib/libc++.so").is_some());
        assert!(config.find("/lib64").is_some());
    }

    #[test]
    fn remove_paths_without_match_is_noop() {
        let mut config: FsConfig = CANNED.parse().unwrap();
        assert_eq!(config.remove_paths(&["/lib/libc++.so"]), 0);
        assert_eq!(config.to_string(), CANNED);
    }

    #[test]
    fn new_entry_formats_mode_as_octal() {
        let entry = FsConfigEntry::new("/lib64/libc++.so", 0, 2000, 0o755);
        assert_eq!(entry.to_string(), "/lib64/libc++.so 0 2000 0755");
    }

    #[test]
    fn empty_table_serializes_empty() {
        assert_eq!(FsConfig::new().to_string(), "");
    }
}
