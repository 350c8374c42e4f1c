//! Package records and the `gomod2nix.toml` manifest.
//!
//! The manifest is the persisted output of a run and doubles as the cache input
//! for the next run: a record is reused only when its stored version matches the
//! currently resolved version, so a stale manifest silently degrades to
//! recomputation instead of producing wrong hashes.

use crate::error::GenerateError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Manifest schema version, bumped on incompatible format changes.
pub const SCHEMA_VERSION: u32 = 3;

/// One hashed dependency in the output collection.
///
/// `import_path` is the effective identity: for replaced modules it is the
/// path the importing code uses, while `replaced_path` carries the module path
/// the content was actually downloaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub import_path: String,
    pub version: String,
    pub hash: String,
    pub replaced_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ManifestEntry {
    version: String,
    hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    replaced: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Manifest {
    schema: u32,
    // BTreeMap so serialization emits import paths in sorted order.
    #[serde(rename = "mod", default)]
    modules: BTreeMap<String, ManifestEntry>,
}

/// Serialize packages into `gomod2nix.toml` contents.
pub fn render_manifest(packages: &[Package]) -> Result<String, GenerateError> {
    let manifest = Manifest {
        schema: SCHEMA_VERSION,
        modules: packages
            .iter()
            .map(|pkg| {
                (
                    pkg.import_path.clone(),
                    ManifestEntry {
                        version: pkg.version.clone(),
                        hash: pkg.hash.clone(),
                        replaced: pkg.replaced_path.clone(),
                    },
                )
            })
            .collect(),
    };
    Ok(toml::to_string_pretty(&manifest)?)
}

/// Parse `gomod2nix.toml` contents into packages, sorted by import path.
pub fn parse_manifest(contents: &str, path: &Path) -> Result<Vec<Package>, GenerateError> {
    let manifest: Manifest =
        toml::from_str(contents).map_err(|source| GenerateError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(manifest
        .modules
        .into_iter()
        .map(|(import_path, entry)| Package {
            import_path,
            version: entry.version,
            hash: entry.hash,
            replaced_path: entry.replaced,
        })
        .collect())
}

/// Read-only map of previously computed package records, keyed by import path.
#[derive(Debug, Default)]
pub struct Cache {
    entries: HashMap<String, Package>,
}

impl Cache {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_packages(packages: impl IntoIterator<Item = Package>) -> Self {
        Self {
            entries: packages
                .into_iter()
                .map(|pkg| (pkg.import_path.clone(), pkg))
                .collect(),
        }
    }

    /// Load the cache from a previous manifest. A missing, unreadable, or
    /// malformed manifest yields an empty cache: every record is then simply
    /// recomputed.
    pub fn load(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => {
                debug!(path = %path.display(), "No previous manifest, starting with empty cache");
                return Self::empty();
            }
        };
        match parse_manifest(&contents, path) {
            Ok(packages) => {
                let cache = Self::from_packages(packages);
                debug!(path = %path.display(), entries = cache.len(), "Loaded hash cache");
                cache
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Ignoring unparseable manifest");
                Self::empty()
            }
        }
    }

    pub fn lookup(&self, import_path: &str) -> Option<&Package> {
        self.entries.get(import_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
