//! End-to-end pipeline tests: replacement resolution, deterministic merging,
//! cache reuse, and whole-run failure semantics over real temporary trees.

use gomod2nix::download::ModDownload;
use gomod2nix::generate::{compute_packages, Dependency};
use gomod2nix::modfile;
use gomod2nix::schema::{parse_manifest, render_manifest, Cache, Package};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn module_dir(root: &Path, name: &str, content: &str) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("go.mod"), format!("module example.com/{name}\n")).unwrap();
    fs::write(dir.join(format!("{name}.go")), content).unwrap();
    dir
}

fn dep(import_path: &str, version: &str, dir: PathBuf) -> Dependency {
    Dependency {
        import_path: import_path.to_string(),
        version: version.to_string(),
        dir,
        replaced_path: None,
    }
}

#[test]
fn test_submission_order_does_not_affect_output() {
    let temp_dir = TempDir::new().unwrap();
    let names = ["delta", "alpha", "charlie", "bravo"];
    let dirs: HashMap<&str, PathBuf> = names
        .iter()
        .map(|name| (*name, module_dir(temp_dir.path(), name, "package x\n")))
        .collect();

    let build = |order: &[&str]| -> Vec<Dependency> {
        order
            .iter()
            .map(|name| {
                dep(
                    &format!("example.com/{name}"),
                    "v1.0.0",
                    dirs[*name].clone(),
                )
            })
            .collect()
    };

    let forward = compute_packages(build(&names), &Cache::empty(), 3).unwrap();
    let mut reversed_names = names;
    reversed_names.reverse();
    let reversed = compute_packages(build(&reversed_names), &Cache::empty(), 3).unwrap();

    assert_eq!(forward, reversed);
    assert_eq!(
        render_manifest(&forward).unwrap(),
        render_manifest(&reversed).unwrap()
    );
}

#[test]
fn test_cache_hit_requires_exact_version_match() {
    let temp_dir = TempDir::new().unwrap();
    let dir = module_dir(temp_dir.path(), "dep", "package dep\n");

    let cache = Cache::from_packages([Package {
        import_path: "example.com/dep".to_string(),
        version: "v1.0.0".to_string(),
        hash: "sha256-from-cache".to_string(),
        replaced_path: None,
    }]);

    // Same version: the cached hash is reused verbatim.
    let same = compute_packages(
        vec![dep("example.com/dep", "v1.0.0", dir.clone())],
        &cache,
        2,
    )
    .unwrap();
    assert_eq!(same[0].hash, "sha256-from-cache");

    // Bumped version: cache is ignored and the tree is hashed for real.
    let bumped =
        compute_packages(vec![dep("example.com/dep", "v1.1.0", dir)], &cache, 2).unwrap();
    assert_eq!(bumped[0].version, "v1.1.0");
    assert!(bumped[0].hash.starts_with("sha256-"));
    assert_ne!(bumped[0].hash, "sha256-from-cache");
}

#[test]
fn test_replace_directive_flows_into_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let fork_dir = module_dir(temp_dir.path(), "fork", "package fork\n");

    let replace = modfile::parse_replace_directives(
        "module example.com/app\n\nreplace example.com/upstream => example.com/fork v1.0.1\n",
    )
    .unwrap();

    let dl = ModDownload {
        path: "example.com/fork".to_string(),
        version: "v1.0.1".to_string(),
        dir: fork_dir,
        sum: String::new(),
        go_mod_sum: String::new(),
        error: None,
    };
    let deps = vec![Dependency::from_download(dl, &replace)];
    let packages = compute_packages(deps, &Cache::empty(), 1).unwrap();

    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].import_path, "example.com/upstream");
    assert_eq!(
        packages[0].replaced_path.as_deref(),
        Some("example.com/fork")
    );

    let rendered = render_manifest(&packages).unwrap();
    assert!(rendered.contains(r#"[mod."example.com/upstream"]"#));
    assert!(rendered.contains(r#"replaced = "example.com/fork""#));
}

#[test]
fn test_one_failure_means_no_usable_output() {
    let temp_dir = TempDir::new().unwrap();
    let mut deps: Vec<Dependency> = (0..4)
        .map(|i| {
            dep(
                &format!("example.com/ok{i}"),
                "v1.0.0",
                module_dir(temp_dir.path(), &format!("ok{i}"), "package x\n"),
            )
        })
        .collect();
    deps.insert(
        2,
        dep(
            "example.com/vanished",
            "v1.0.0",
            temp_dir.path().join("removed-mid-run"),
        ),
    );

    assert!(compute_packages(deps, &Cache::empty(), 5).is_err());
}

#[test]
fn test_second_run_with_warm_cache_is_byte_identical_and_hash_free() {
    let temp_dir = TempDir::new().unwrap();
    let names = ["one", "two", "three"];
    let deps: Vec<Dependency> = names
        .iter()
        .map(|name| {
            dep(
                &format!("example.com/{name}"),
                "v1.0.0",
                module_dir(temp_dir.path(), name, "package x\n"),
            )
        })
        .collect();

    // First run: cold cache, everything hashed; persist the manifest.
    let first = compute_packages(deps, &Cache::empty(), 2).unwrap();
    let manifest_path = temp_dir.path().join("gomod2nix.toml");
    fs::write(&manifest_path, render_manifest(&first).unwrap()).unwrap();

    // Second run: warm cache; dependency directories are gone, so any hashing
    // attempt would fail. Success proves the run was fully served from cache.
    let cache = Cache::load(&manifest_path);
    let missing_deps: Vec<Dependency> = names
        .iter()
        .map(|name| {
            dep(
                &format!("example.com/{name}"),
                "v1.0.0",
                temp_dir.path().join("evicted").join(name),
            )
        })
        .collect();
    let second = compute_packages(missing_deps, &cache, 2).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        render_manifest(&first).unwrap(),
        render_manifest(&second).unwrap()
    );
}

#[test]
fn test_manifest_round_trips_through_cache_load() {
    let temp_dir = TempDir::new().unwrap();
    let dir = module_dir(temp_dir.path(), "pkg", "package pkg\n");

    let packages =
        compute_packages(vec![dep("example.com/pkg", "v2.3.4", dir)], &Cache::empty(), 1).unwrap();
    let rendered = render_manifest(&packages).unwrap();
    let parsed = parse_manifest(&rendered, &temp_dir.path().join("gomod2nix.toml")).unwrap();

    assert_eq!(parsed, packages);
}
