//! Nix ARchive (NAR) serialization of filesystem trees.
//!
//! NAR is the canonical byte representation Nix uses for a file tree: every token
//! is a length-prefixed string padded to an 8-byte boundary, directory entries are
//! emitted sorted by name, and only type, executable bit, file contents, and
//! symlink targets are encoded. Two trees with identical semantic content
//! serialize to identical bytes regardless of filesystem iteration order, which
//! is what makes the digest in [`crate::hash`] reproducible.

use crate::error::GenerateError;
use std::fs::{self, Metadata};
use std::io::{self, Write};
use std::path::Path;

const NAR_VERSION_MAGIC: &str = "nix-archive-1";

/// Node kind passed to the entry filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Regular,
    Symlink,
    Directory,
}

/// Serialize the tree rooted at `path` into `writer`.
///
/// `filter` is consulted for every node below the root; returning `false`
/// excludes the entry (and, for a directory, its entire subtree) from the
/// archive. The root itself is never filtered.
pub fn dump_path_filter<W, F>(writer: &mut W, path: &Path, filter: F) -> Result<(), GenerateError>
where
    W: Write,
    F: Fn(&Path, NodeType) -> bool,
{
    write_str(writer, path, NAR_VERSION_MAGIC)?;
    let meta = fs::symlink_metadata(path).map_err(|e| GenerateError::io(path, e))?;
    dump_node(writer, path, &meta, &filter)
}

/// Serialize the tree rooted at `path` without filtering.
pub fn dump_path<W: Write>(writer: &mut W, path: &Path) -> Result<(), GenerateError> {
    dump_path_filter(writer, path, |_, _| true)
}

fn node_type(path: &Path, meta: &Metadata) -> Result<NodeType, GenerateError> {
    let ft = meta.file_type();
    if ft.is_symlink() {
        Ok(NodeType::Symlink)
    } else if ft.is_file() {
        Ok(NodeType::Regular)
    } else if ft.is_dir() {
        Ok(NodeType::Directory)
    } else {
        // Sockets, devices, fifos: NAR has no representation for these.
        Err(GenerateError::UnsupportedNode(path.to_path_buf()))
    }
}

fn dump_node<W, F>(
    writer: &mut W,
    path: &Path,
    meta: &Metadata,
    filter: &F,
) -> Result<(), GenerateError>
where
    W: Write,
    F: Fn(&Path, NodeType) -> bool,
{
    write_str(writer, path, "(")?;
    write_str(writer, path, "type")?;

    match node_type(path, meta)? {
        NodeType::Regular => {
            write_str(writer, path, "regular")?;
            if is_executable(meta) {
                write_str(writer, path, "executable")?;
                write_str(writer, path, "")?;
            }
            write_str(writer, path, "contents")?;
            write_file_contents(writer, path, meta.len())?;
        }
        NodeType::Symlink => {
            write_str(writer, path, "symlink")?;
            write_str(writer, path, "target")?;
            let target = fs::read_link(path).map_err(|e| GenerateError::io(path, e))?;
            write_bytes(writer, path, target.as_os_str().as_encoded_bytes())?;
        }
        NodeType::Directory => {
            write_str(writer, path, "directory")?;

            // Collect and sort children by name bytes so the stream is
            // independent of directory iteration order.
            let mut children = Vec::new();
            let entries = fs::read_dir(path).map_err(|e| GenerateError::io(path, e))?;
            for entry in entries {
                let entry = entry.map_err(|e| GenerateError::io(path, e))?;
                let child_path = entry.path();
                let child_meta = fs::symlink_metadata(&child_path)
                    .map_err(|e| GenerateError::io(&child_path, e))?;
                children.push((entry.file_name(), child_path, child_meta));
            }
            children.sort_by(|a, b| a.0.as_encoded_bytes().cmp(b.0.as_encoded_bytes()));

            for (name, child_path, child_meta) in children {
                if !filter(&child_path, node_type(&child_path, &child_meta)?) {
                    continue;
                }
                write_str(writer, &child_path, "entry")?;
                write_str(writer, &child_path, "(")?;
                write_str(writer, &child_path, "name")?;
                write_bytes(writer, &child_path, name.as_encoded_bytes())?;
                write_str(writer, &child_path, "node")?;
                dump_node(writer, &child_path, &child_meta, filter)?;
                write_str(writer, &child_path, ")")?;
            }
        }
    }

    write_str(writer, path, ")")
}

#[cfg(unix)]
fn is_executable(meta: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &Metadata) -> bool {
    false
}

/// Stream the contents of the file at `path` as a NAR string.
///
/// The length prefix comes from the metadata captured at directory-listing
/// time; if the file yields a different byte count the archive would be
/// corrupt, so that is reported as an error instead.
fn write_file_contents<W: Write>(
    writer: &mut W,
    path: &Path,
    len: u64,
) -> Result<(), GenerateError> {
    write_int(writer, path, len)?;

    let mut file = fs::File::open(path).map_err(|e| GenerateError::io(path, e))?;
    let copied = io::copy(&mut file, writer).map_err(|e| GenerateError::io(path, e))?;
    if copied != len {
        return Err(GenerateError::InconsistentFile {
            path: path.to_path_buf(),
            expected: len,
            actual: copied,
        });
    }

    write_padding(writer, path, len)
}

fn write_str<W: Write>(writer: &mut W, path: &Path, s: &str) -> Result<(), GenerateError> {
    write_bytes(writer, path, s.as_bytes())
}

fn write_bytes<W: Write>(writer: &mut W, path: &Path, bytes: &[u8]) -> Result<(), GenerateError> {
    write_int(writer, path, bytes.len() as u64)?;
    writer
        .write_all(bytes)
        .map_err(|e| GenerateError::io(path, e))?;
    write_padding(writer, path, bytes.len() as u64)
}

fn write_int<W: Write>(writer: &mut W, path: &Path, n: u64) -> Result<(), GenerateError> {
    writer
        .write_all(&n.to_le_bytes())
        .map_err(|e| GenerateError::io(path, e))
}

fn write_padding<W: Write>(writer: &mut W, path: &Path, len: u64) -> Result<(), GenerateError> {
    let remainder = (len % 8) as usize;
    if remainder > 0 {
        let zeros = [0u8; 8];
        writer
            .write_all(&zeros[..8 - remainder])
            .map_err(|e| GenerateError::io(path, e))?;
    }
    Ok(())
}
