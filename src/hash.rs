//! Canonical tree digests for dependency directories.
//!
//! A dependency's content hash is the SHA-256 of its NAR serialization, rendered
//! in the SRI form Nix expects (`sha256-<base64>`). Known non-semantic files are
//! excluded from the archive so their presence or absence never changes a hash.

use crate::error::GenerateError;
use crate::nar;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Base names excluded from hashing, compared case-insensitively.
const DENYLIST: &[&str] = &[".ds_store"];

fn is_denylisted(path: &Path) -> bool {
    match path.file_name() {
        Some(name) => {
            let name = name.to_string_lossy().to_lowercase();
            DENYLIST.iter().any(|d| *d == name)
        }
        None => false,
    }
}

/// Compute the SRI hash of the tree rooted at `dir`.
///
/// The digest is a deterministic function of the tree's semantic contents
/// (names, file bytes, types, executable bits) and is independent of the order
/// in which the filesystem yields entries. The caller guarantees `dir` exists.
pub fn nar_sha256(dir: &Path) -> Result<String, GenerateError> {
    let mut hasher = Sha256::new();
    nar::dump_path_filter(&mut hasher, dir, |path, _| !is_denylisted(path))?;
    let digest = hasher.finalize();
    Ok(format!("sha256-{}", BASE64.encode(digest)))
}
