//! Cache consultation, scheduling, and result merging.
//!
//! This is the pipeline core: for each resolved dependency, reuse the cached
//! record when its version still matches, dispatch everything else to the
//! worker pool for NAR hashing, then merge hits and fresh results into one
//! deterministically sorted collection. The run is all-or-nothing: the first
//! hashing error aborts it and no partial output is returned.

use crate::download::{self, ModDownload};
use crate::error::GenerateError;
use crate::hash;
use crate::modfile;
use crate::pool::WorkerPool;
use crate::schema::{Cache, Package};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// One resolved dependency ready for hashing.
#[derive(Debug, Clone)]
pub struct Dependency {
    /// Effective import path (the original path for replaced modules).
    pub import_path: String,
    pub version: String,
    /// Local directory holding the module's extracted contents.
    pub dir: PathBuf,
    /// The replacement-target path when this module was redirected by a
    /// `replace` directive.
    pub replaced_path: Option<String>,
}

impl Dependency {
    /// Resolve a downloaded module against the replace map.
    ///
    /// The download step reports replaced modules under their replacement
    /// target's path; the effective identity for cache lookup and output is
    /// the original import path, with the target path kept as metadata.
    pub fn from_download(dl: ModDownload, replace: &HashMap<String, String>) -> Self {
        match replace.get(&dl.path) {
            Some(original) => Self {
                import_path: original.clone(),
                version: dl.version,
                dir: dl.dir,
                replaced_path: Some(dl.path),
            },
            None => Self {
                import_path: dl.path,
                version: dl.version,
                dir: dl.dir,
                replaced_path: None,
            },
        }
    }
}

/// Hash all dependencies, reusing cached records where safe.
///
/// A cache entry is reused only when its stored version exactly matches the
/// resolved version; a mismatch is silently treated as a miss. The returned
/// collection is sorted ascending by import path regardless of completion
/// order. On any hashing error the whole run fails with that error.
pub fn compute_packages(
    deps: Vec<Dependency>,
    cache: &Cache,
    workers: usize,
) -> Result<Vec<Package>, GenerateError> {
    let start = Instant::now();
    let total = deps.len();
    let mut cache_hits = 0usize;

    let pool = WorkerPool::new(workers);
    let results = Arc::new(Mutex::new(Vec::with_capacity(total)));

    for dep in deps {
        if let Some(cached) = cache.lookup(&dep.import_path) {
            if cached.version == dep.version {
                results.lock().push(cached.clone());
                cache_hits += 1;
                continue;
            }
            debug!(
                import_path = %dep.import_path,
                cached_version = %cached.version,
                resolved_version = %dep.version,
                "Cached version differs, recomputing"
            );
        }

        let results = Arc::clone(&results);
        pool.submit(move || {
            debug!(import_path = %dep.import_path, "Calculating NAR hash");
            let hash = hash::nar_sha256(&dep.dir)?;
            results.lock().push(Package {
                import_path: dep.import_path,
                version: dep.version,
                hash,
                replaced_path: dep.replaced_path,
            });
            Ok(())
        });
    }

    pool.wait()?;

    let mut packages = std::mem::take(&mut *results.lock());
    packages.sort_by(|a, b| a.import_path.cmp(&b.import_path));

    info!(
        total,
        cache_hits,
        computed = total - cache_hits,
        duration_ms = start.elapsed().as_millis() as u64,
        "Hashed dependency set"
    );
    Ok(packages)
}

/// End-to-end generation for the Go module in `project_dir`.
///
/// Parses `go.mod` for replace directives, runs the download step, loads the
/// previous manifest as the hash cache, and computes the package records.
/// Writing the resulting manifest back out is the caller's job.
pub fn generate_pkgs(
    project_dir: &Path,
    manifest_path: &Path,
    workers: usize,
) -> Result<Vec<Package>, GenerateError> {
    info!(go_mod = %project_dir.join("go.mod").display(), "Parsing go.mod");
    let replace = modfile::load_replace_directives(project_dir)?;

    let downloads = download::download_modules(project_dir)?;
    let cache = Cache::load(manifest_path);

    let deps = downloads
        .into_iter()
        .map(|dl| Dependency::from_download(dl, &replace))
        .collect();
    compute_packages(deps, &cache, workers)
}
