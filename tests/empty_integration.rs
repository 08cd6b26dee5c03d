use rusty_tidy::classify::{classify_empty, EmptyOptions};
use rusty_tidy::scanner::resolve_root;
use rusty_tidy::{CancelToken, ExclusionRules};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn deep(root: &Path, rules: &ExclusionRules) -> Vec<PathBuf> {
    classify_empty(
        root,
        &EmptyOptions::new().with_recursive(true),
        rules,
        &CancelToken::new(),
    )
    .unwrap()
    .found
}

/// Build a tree from relative paths; a trailing '/' marks a directory.
fn build_tree(entries: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for entry in entries {
        let path = tmp.path().join(entry.trim_end_matches('/'));
        if entry.ends_with('/') {
            fs::create_dir_all(&path).unwrap();
        } else {
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "content").unwrap();
        }
    }
    tmp
}

#[test]
fn sibling_file_keeps_parent() {
    let tmp = build_tree(&["a/b/", "a/file.txt"]);
    let root = resolve_root(tmp.path()).unwrap();

    assert_eq!(deep(tmp.path(), &ExclusionRules::none()), vec![root.join("a/b")]);
}

#[test]
fn nested_empty_chain_is_reported_whole() {
    let tmp = build_tree(&["x/y/"]);
    let root = resolve_root(tmp.path()).unwrap();

    assert_eq!(
        deep(tmp.path(), &ExclusionRules::none()),
        vec![root.join("x"), root.join("x/y")]
    );
}

#[test]
fn reported_set_is_closed_under_subdirectories() {
    let tmp = build_tree(&[
        "p/q/r/",
        "p/q/s/",
        "p/t/u/",
        "p/t/keep.txt",
        "w/",
        "z/deep/deeper/file.bin",
    ]);
    let found = deep(tmp.path(), &ExclusionRules::none());

    for dir in &found {
        for child in fs::read_dir(dir).unwrap() {
            let child = child.unwrap().path();
            assert!(child.is_dir(), "{} holds a file", dir.display());
            assert!(found.contains(&child), "{} not reported", child.display());
        }
    }

    let root = resolve_root(tmp.path()).unwrap();
    assert!(found.contains(&root.join("p/q")));
    assert!(!found.contains(&root.join("p")));
    assert!(!found.contains(&root.join("z")));
}

#[test]
fn shallow_mode_only_reports_leaf_children() {
    let tmp = build_tree(&["leaf/", "nested/inner/", "full/file"]);
    let root = resolve_root(tmp.path()).unwrap();

    let report = classify_empty(
        tmp.path(),
        &EmptyOptions::new(),
        &ExclusionRules::none(),
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(report.found, vec![root.join("leaf")]);
}

#[test]
fn excluded_names_are_pruned_not_reported() {
    let tmp = build_tree(&["node_modules/pkg/", "src/gen/"]);
    let rules = ExclusionRules::builder()
        .exclude_names(["node_modules"])
        .build()
        .unwrap();
    let root = resolve_root(tmp.path()).unwrap();

    assert_eq!(
        deep(tmp.path(), &rules),
        vec![root.join("src"), root.join("src/gen")]
    );
}

#[test]
fn path_glob_excludes_subtree() {
    let tmp = build_tree(&["cache/a/", "docs/b/"]);
    let rules = ExclusionRules::builder()
        .exclude_glob_path("**/cache")
        .build()
        .unwrap();
    let found = deep(tmp.path(), &rules);

    assert!(found.iter().all(|p| !p.to_string_lossy().contains("cache")));
    assert_eq!(found.len(), 2);
}

#[test]
fn repeated_runs_agree() {
    let tmp = build_tree(&["a/b/c/", "a/d/file", "e/"]);
    let rules = ExclusionRules::none();
    assert_eq!(deep(tmp.path(), &rules), deep(tmp.path(), &rules));
}
