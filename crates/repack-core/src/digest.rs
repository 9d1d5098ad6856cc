use sha2::{Digest, Sha512};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

const BLOCK_SIZE: usize = 64 * 1024;

/// Lowercase hex SHA-512 of a file, read in fixed size blocks.
pub fn sha512_file(path: &Path) -> Result<String, std::io::Error> {
    let mut file = File::open(path)?;
    let mut hasher = Sha512::new();
    let mut buf = vec![0u8; BLOCK_SIZE];
    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn sha512_bytes(data: &[u8]) -> String {
    hex::encode(Sha512::digest(data))
}
