use dupe_krill::{AbortFlag, Config, Root, Scanner};
use std::fs;
use tempdir::TempDir;

fn scan(cfg: Config, dir: &std::path::Path, recurse: bool) -> dupe_krill::ScanResult {
    let roots = vec![Root { path: dir.to_path_buf(), recurse }];
    let abort = AbortFlag::new();
    Scanner::new(cfg).scan(&roots, &abort).expect("scan")
}

#[test]
fn empty_directory_has_no_groups() {
    let dir = TempDir::new("scantest_empty").unwrap();
    let result = scan(Config::default(), dir.path(), false);
    assert!(result.groups.is_empty());
}

#[test]
fn scan_hardlink_requires_flag() {
    let dir = TempDir::new("scantest_hardlink").unwrap();
    let a_path = dir.path().join("a");
    let b_path = dir.path().join("b");
    fs::write(&a_path, b"dupe").unwrap();
    fs::hard_link(&a_path, &b_path).unwrap();

    let result = scan(Config::default(), dir.path(), false);
    assert_eq!(result.groups.len(), 0);

    let mut cfg = Config::default();
    cfg.hardlinks_as_dupes = true;
    let result = scan(cfg, dir.path(), false);
    assert_eq!(result.groups.len(), 1);
    assert_eq!(result.groups[0].members.len(), 2);
}

#[test]
fn multiple_roots_find_cross_root_duplicates() {
    let root_a = TempDir::new("scantest_root_a").unwrap();
    let root_b = TempDir::new("scantest_root_b").unwrap();
    fs::write(root_a.path().join("dup.bin"), "shared content").unwrap();
    fs::write(root_b.path().join("dup.bin"), "shared content").unwrap();

    let cfg = Config::default();
    let roots = vec![
        Root { path: root_a.path().to_path_buf(), recurse: false },
        Root { path: root_b.path().to_path_buf(), recurse: false },
    ];
    let abort = AbortFlag::new();
    let result = Scanner::new(cfg).scan(&roots, &abort).expect("scan");
    assert_eq!(result.groups.len(), 1);
    assert_eq!(result.groups[0].members.len(), 2);
}

#[test]
fn isolate_splits_matches_within_one_root() {
    // Two subdirectories recursed from a single command-line root share
    // that root's user_order, so --isolate (which keys off user_order, not
    // directory identity) separates them even though they're nested under
    // the same top-level argument.
    let top = TempDir::new("scantest_iso").unwrap();
    let sub_a = top.path().join("sub_a");
    let sub_b = top.path().join("sub_b");
    fs::create_dir(&sub_a).unwrap();
    fs::create_dir(&sub_b).unwrap();
    fs::write(sub_a.join("dup.bin"), "shared content").unwrap();
    fs::write(sub_b.join("dup.bin"), "shared content").unwrap();

    let result = scan(Config::default(), top.path(), true);
    assert_eq!(result.groups.len(), 1);

    let mut cfg = Config::default();
    cfg.isolate = true;
    let result = scan(cfg, top.path(), true);
    assert_eq!(result.groups.len(), 0);
}

#[test]
fn quick_mode_skips_byte_confirmation() {
    let dir = TempDir::new("scantest_quick").unwrap();
    fs::write(dir.path().join("a"), "abcdefghij").unwrap();
    fs::write(dir.path().join("b"), "abcdefghij").unwrap();

    let mut cfg = Config::default();
    cfg.quick = true;
    let result = scan(cfg, dir.path(), false);
    assert_eq!(result.groups.len(), 1);
}
