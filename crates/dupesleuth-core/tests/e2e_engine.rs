/// End-to-end engine tests.
///
/// These run the real walker, worker pool, hasher, and remediation against a
/// temporary directory. Nothing is mocked except, in a couple of tests, the
/// walker itself, to inject paths that misbehave between discovery and
/// hashing.
use dupesleuth_core::analysis::aggregate;
use dupesleuth_core::hasher::fingerprint_file;
use dupesleuth_core::model::IssueKind;
use dupesleuth_core::scanner::cancel::StopSignal;
use dupesleuth_core::scanner::progress::{ProgressSink, ScanProgress};
use dupesleuth_core::scanner::walker::WalkItem;
use dupesleuth_core::{
    remediate, scan, start_scan, AnalysisReport, CancelToken, DeletionStatus, EngineError,
    FileCategory, ScanOptions, ScanStatus,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// ```text
/// root/
///   a.txt   "hello"
///   b.txt   "hello"
///   c.jpg   "world!"
/// ```
fn build_basic_tree(root: &Path) {
    fs::write(root.join("a.txt"), b"hello").unwrap();
    fs::write(root.join("b.txt"), b"hello").unwrap();
    fs::write(root.join("c.jpg"), b"world!").unwrap();
}

/// A deeper tree with two duplicate sets of different sizes. `other.mp3`
/// shares its size with the songs but not their content.
fn build_nested_tree(root: &Path) {
    fs::create_dir_all(root.join("docs/old")).unwrap();
    fs::create_dir_all(root.join("media")).unwrap();
    fs::write(root.join("docs/report.pdf"), vec![7u8; 4096]).unwrap();
    fs::write(root.join("docs/old/report-copy.pdf"), vec![7u8; 4096]).unwrap();
    fs::write(root.join("media/report.bin"), vec![7u8; 4096]).unwrap();
    fs::write(root.join("media/song.mp3"), b"la la la").unwrap();
    fs::write(root.join("media/song-again.mp3"), b"la la la").unwrap();
    fs::write(root.join("media/other.mp3"), b"ta ta ta").unwrap();
}

fn scan_default(root: &Path) -> AnalysisReport {
    scan(root, &ScanOptions::default(), &CancelToken::new()).unwrap()
}

/// Permission tests cannot run as a user the OS does not restrict (root).
/// Say so on stderr rather than passing silently.
#[cfg(unix)]
fn skip_unenforced_permissions(test: &str) {
    eprintln!("{test}: skipped, file permissions are not enforced for this user");
}

fn canonical(root: &Path) -> PathBuf {
    fs::canonicalize(root).unwrap()
}

/// Group members as bare file names, group order and member order kept.
fn group_names(report: &AnalysisReport) -> Vec<Vec<String>> {
    report
        .duplicate_groups
        .iter()
        .map(|g| {
            g.members
                .iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
                .collect()
        })
        .collect()
}

// ── Scanning ─────────────────────────────────────────────────────────────────

#[test]
fn basic_tree_counts_categories_and_duplicates() {
    let tmp = TempDir::new().unwrap();
    build_basic_tree(tmp.path());
    let root = canonical(tmp.path());

    let report = scan_default(tmp.path());

    assert_eq!(report.status, ScanStatus::Complete);
    assert_eq!(report.root, root);
    assert_eq!(report.total_files, 3);
    assert_eq!(report.total_size, 16);
    assert_eq!(
        report.category_counts,
        BTreeMap::from([(FileCategory::Documents, 2), (FileCategory::Images, 1)])
    );
    assert!(report.errors.is_empty());

    assert_eq!(report.duplicate_groups.len(), 1);
    let group = &report.duplicate_groups[0];
    assert_eq!(group.members, vec![root.join("a.txt"), root.join("b.txt")]);
    assert_eq!(group.size, 5);
    assert_eq!(group.fingerprint, fingerprint_file(&root.join("a.txt")).unwrap());
    assert_eq!(
        group.fingerprint.to_hex(),
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
}

#[test]
fn files_are_listed_in_walk_order() {
    let tmp = TempDir::new().unwrap();
    build_nested_tree(tmp.path());
    let root = canonical(tmp.path());

    let report = scan_default(tmp.path());
    let paths: Vec<PathBuf> = report.files.iter().map(|f| f.path.clone()).collect();
    assert_eq!(
        paths,
        vec![
            root.join("docs/old/report-copy.pdf"),
            root.join("docs/report.pdf"),
            root.join("media/other.mp3"),
            root.join("media/report.bin"),
            root.join("media/song-again.mp3"),
            root.join("media/song.mp3"),
        ]
    );
}

/// Groups come largest-reclaimable first.
#[test]
fn nested_tree_groups_are_ordered_by_reclaimable_size() {
    let tmp = TempDir::new().unwrap();
    build_nested_tree(tmp.path());

    let report = scan_default(tmp.path());
    assert_eq!(
        group_names(&report),
        vec![
            vec!["report-copy.pdf", "report.pdf", "report.bin"],
            vec!["song-again.mp3", "song.mp3"],
        ]
    );
    assert_eq!(report.duplicate_groups[0].reclaimable_size(), 8192);
    assert_eq!(report.total_reclaimable(), 8192 + 8);
    assert_eq!(report.redundant_files(), 3);
    assert_eq!(report.category_counts[&FileCategory::Audio], 3);
}

#[test]
fn empty_root_yields_empty_report() {
    let tmp = TempDir::new().unwrap();
    let report = scan_default(tmp.path());

    assert_eq!(report.status, ScanStatus::Complete);
    assert_eq!(report.total_files, 0);
    assert_eq!(report.total_size, 0);
    assert!(report.category_counts.is_empty());
    assert!(report.duplicate_groups.is_empty());
    assert!(report.errors.is_empty());
}

/// Two scans of an unchanged tree agree on everything but timing.
#[test]
fn rescanning_unchanged_tree_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    build_nested_tree(tmp.path());

    let first = scan_default(tmp.path());
    let second = scan_default(tmp.path());

    assert_eq!(first.total_files, second.total_files);
    assert_eq!(first.total_size, second.total_size);
    assert_eq!(first.category_counts, second.category_counts);
    assert_eq!(first.duplicate_groups, second.duplicate_groups);
    let paths = |r: &AnalysisReport| r.files.iter().map(|f| f.path.clone()).collect::<Vec<_>>();
    assert_eq!(paths(&first), paths(&second));
}

#[test]
fn size_gate_does_not_change_groups() {
    let tmp = TempDir::new().unwrap();
    build_nested_tree(tmp.path());

    let gated = scan(tmp.path(), &ScanOptions::default(), &CancelToken::new()).unwrap();
    let ungated = scan(
        tmp.path(),
        &ScanOptions::default().with_size_gate(false),
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(gated.duplicate_groups, ungated.duplicate_groups);
    // Every size in this tree is shared, so both modes hash everything.
    assert!(ungated.files.iter().all(|f| f.fingerprint.is_some()));
    assert!(gated.files.iter().all(|f| f.fingerprint.is_some()));
}

#[test]
fn unique_size_is_never_hashed_when_gated() {
    let tmp = TempDir::new().unwrap();
    build_basic_tree(tmp.path());

    let report = scan_default(tmp.path());
    let jpg = report.files.iter().find(|f| f.name == "c.jpg").unwrap();
    assert!(jpg.fingerprint.is_none());

    let ungated = scan(
        tmp.path(),
        &ScanOptions::default().with_size_gate(false),
        &CancelToken::new(),
    )
    .unwrap();
    let jpg = ungated.files.iter().find(|f| f.name == "c.jpg").unwrap();
    assert!(jpg.fingerprint.is_some());
    assert_eq!(ungated.duplicate_groups, report.duplicate_groups);
}

#[test]
fn one_byte_difference_is_not_a_duplicate() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("x.bin"), b"abcdefgh").unwrap();
    fs::write(tmp.path().join("y.bin"), b"abcdefgi").unwrap();

    let report = scan_default(tmp.path());
    assert_eq!(report.total_files, 2);
    assert!(report.duplicate_groups.is_empty());
}

#[test]
fn empty_files_form_a_group() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("e1"), b"").unwrap();
    fs::write(tmp.path().join("e2"), b"").unwrap();

    let report = scan_default(tmp.path());
    assert_eq!(report.duplicate_groups.len(), 1);
    assert_eq!(report.duplicate_groups[0].size, 0);
    assert_eq!(report.duplicate_groups[0].reclaimable_size(), 0);
}

#[test]
fn worker_count_does_not_change_result() {
    let tmp = TempDir::new().unwrap();
    build_nested_tree(tmp.path());

    let single = scan(
        tmp.path(),
        &ScanOptions::default().with_concurrency(1),
        &CancelToken::new(),
    )
    .unwrap();
    let many = scan(
        tmp.path(),
        &ScanOptions::default().with_concurrency(8),
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(single.duplicate_groups, many.duplicate_groups);
    assert_eq!(single.total_size, many.total_size);
}

#[test]
fn bad_roots_fail_without_a_report() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("plain.txt");
    fs::write(&file, b"x").unwrap();

    assert!(matches!(
        scan(&tmp.path().join("missing"), &ScanOptions::default(), &CancelToken::new()),
        Err(EngineError::PathNotFound(_))
    ));
    assert!(matches!(
        scan(&file, &ScanOptions::default(), &CancelToken::new()),
        Err(EngineError::NotADirectory(_))
    ));
}

// ── Per-file failures ────────────────────────────────────────────────────────

/// A path that vanishes between discovery and stat is recorded as an issue
/// and the rest of the scan is unaffected.
#[test]
fn vanished_file_is_an_issue_not_a_failure() {
    let tmp = TempDir::new().unwrap();
    build_basic_tree(tmp.path());
    let root = canonical(tmp.path());
    let ghost = root.join("ghost.txt");

    let walk = vec![
        WalkItem::File(root.join("a.txt")),
        WalkItem::File(ghost.clone()),
        WalkItem::File(root.join("b.txt")),
    ];
    let report = aggregate(
        root.clone(),
        walk.into_iter(),
        &ScanOptions::default(),
        &StopSignal::never(),
        &ProgressSink::silent(),
    )
    .unwrap();

    assert_eq!(report.total_files, 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].path, ghost);
    assert_eq!(report.errors[0].kind, IssueKind::Unreadable);
    assert_eq!(report.duplicate_groups.len(), 1);
}

/// A file that can be stat'd but not opened drops out of the totals and its
/// size bucket; the remaining files still group.
#[cfg(unix)]
#[test]
fn unreadable_file_is_excluded_from_totals_and_groups() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    let root = canonical(tmp.path());
    for name in ["a.dat", "b.dat", "c.dat"] {
        fs::write(root.join(name), b"same").unwrap();
    }
    let locked = root.join("b.dat");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
        skip_unenforced_permissions("unreadable_file_is_excluded_from_totals_and_groups");
        return;
    }

    let report = scan_default(&root);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(report.total_files, 2);
    assert_eq!(report.total_size, 8);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, IssueKind::PermissionDenied);
    let record = report.files.iter().find(|f| f.path == locked).unwrap();
    assert!(!record.readable);
    assert_eq!(
        report.duplicate_groups[0].members,
        vec![root.join("a.dat"), root.join("c.dat")]
    );
}

#[cfg(unix)]
#[test]
fn unreadable_directory_is_reported_and_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    build_basic_tree(tmp.path());
    let locked = tmp.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("hidden.txt"), b"hello").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        skip_unenforced_permissions("unreadable_directory_is_reported_and_skipped");
        return;
    }

    let report = scan_default(tmp.path());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(report.status, ScanStatus::Complete);
    assert_eq!(report.total_files, 3);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].path, canonical(tmp.path()).join("locked"));
    assert_eq!(report.errors[0].kind, IssueKind::PermissionDenied);
    assert_eq!(report.duplicate_groups.len(), 1);
}

/// Files whose content no longer matches their stat'd size by the time they
/// are hashed. `/proc` files stat as zero bytes but read as non-empty, which
/// makes the change deterministic without any special privileges.
#[cfg(target_os = "linux")]
#[test]
fn file_changed_before_hashing_is_excluded_from_its_bucket() {
    let tmp = TempDir::new().unwrap();
    let root = canonical(tmp.path());
    fs::write(root.join("e1"), b"").unwrap();
    fs::write(root.join("e2"), b"").unwrap();
    let moving = PathBuf::from("/proc/self/status");
    assert_eq!(fs::metadata(&moving).unwrap().len(), 0);

    let walk = vec![
        WalkItem::File(root.join("e1")),
        WalkItem::File(moving.clone()),
        WalkItem::File(root.join("e2")),
    ];
    let report = aggregate(
        root.clone(),
        walk.into_iter(),
        &ScanOptions::default(),
        &StopSignal::never(),
        &ProgressSink::silent(),
    )
    .unwrap();

    assert_eq!(report.total_files, 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].path, moving);
    assert_eq!(report.errors[0].kind, IssueKind::Changed);
    let record = report.files.iter().find(|f| f.path == moving).unwrap();
    assert!(!record.readable);
    assert!(record.fingerprint.is_none());
    assert_eq!(report.duplicate_groups.len(), 1);
    assert_eq!(
        report.duplicate_groups[0].members,
        vec![root.join("e1"), root.join("e2")]
    );
}

// ── Cancellation ─────────────────────────────────────────────────────────────

#[test]
fn cancelled_token_yields_cancelled_report() {
    let tmp = TempDir::new().unwrap();
    build_nested_tree(tmp.path());
    let token = CancelToken::new();
    token.cancel();

    let report = scan(tmp.path(), &ScanOptions::default(), &token).unwrap();
    assert_eq!(report.status, ScanStatus::Cancelled);
    assert!(report.total_files <= 6);
    assert!(matches!(
        report.into_complete(),
        Err(EngineError::Cancelled { .. })
    ));
}

#[test]
fn expired_deadline_yields_cancelled_report() {
    let tmp = TempDir::new().unwrap();
    build_basic_tree(tmp.path());

    let options = ScanOptions::default().with_timeout(Duration::ZERO);
    let report = scan(tmp.path(), &options, &CancelToken::new()).unwrap();
    assert!(report.is_cancelled());
}

// ── Background scans ─────────────────────────────────────────────────────────

#[test]
fn background_scan_reports_progress_and_returns_report() {
    let tmp = TempDir::new().unwrap();
    build_nested_tree(tmp.path());

    let handle = start_scan(tmp.path().to_path_buf(), ScanOptions::default()).unwrap();
    let mut terminal = None;
    for msg in handle.progress_rx.iter() {
        if matches!(msg, ScanProgress::Complete { .. } | ScanProgress::Cancelled) {
            terminal = Some(msg);
            break;
        }
    }
    assert!(matches!(
        terminal,
        Some(ScanProgress::Complete {
            duplicate_groups: 2,
            error_count: 0,
            ..
        })
    ));

    let stats = handle.stats();
    let report = handle.wait().unwrap();
    assert_eq!(stats.files_found, 6);
    assert_eq!(stats.hash_candidates, 6);
    assert_eq!(stats.hashed, 6);
    assert_eq!(report.duplicate_groups.len(), 2);
}

#[test]
fn background_scan_of_missing_root_reports_failure() {
    let tmp = TempDir::new().unwrap();
    let handle = start_scan(tmp.path().join("nope"), ScanOptions::default()).unwrap();

    let messages: Vec<ScanProgress> = handle.progress_rx.iter().collect();
    assert!(matches!(messages.last(), Some(ScanProgress::Failed { .. })));
    assert!(matches!(handle.wait(), Err(EngineError::PathNotFound(_))));
}

// ── Remediation ──────────────────────────────────────────────────────────────

#[test]
fn remediation_then_rescan_leaves_no_duplicates() {
    let tmp = TempDir::new().unwrap();
    build_basic_tree(tmp.path());
    let root = canonical(tmp.path());

    let report = scan_default(tmp.path());
    let fp = report.duplicate_groups[0].fingerprint;
    let outcomes = remediate(&report, &fp, 0).unwrap();

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].path, root.join("b.txt"));
    assert_eq!(outcomes[0].status, DeletionStatus::Deleted);
    assert!(root.join("a.txt").exists());

    let after = scan_default(tmp.path());
    assert_eq!(after.total_files, 2);
    assert!(after.duplicate_groups.is_empty());

    // The stale report still names the group; a second pass is harmless.
    let again = remediate(&report, &fp, 0).unwrap();
    assert_eq!(again[0].status, DeletionStatus::AlreadyAbsent);
}

/// A scanned link and its target form a group; keeping the link must leave
/// the content reachable.
#[cfg(unix)]
#[test]
fn keeping_a_symlink_never_removes_the_last_copy() {
    let tmp = TempDir::new().unwrap();
    let root = canonical(tmp.path());
    fs::write(root.join("b_real.txt"), b"precious").unwrap();
    std::os::unix::fs::symlink(root.join("b_real.txt"), root.join("a_link.txt")).unwrap();

    let report = scan_default(&root);
    let group = &report.duplicate_groups[0];
    assert_eq!(
        group.members,
        vec![root.join("a_link.txt"), root.join("b_real.txt")]
    );

    let outcomes = remediate(&report, &group.fingerprint, 0).unwrap();
    assert!(matches!(outcomes[0].status, DeletionStatus::Failed(_)));
    assert!(root.join("b_real.txt").exists());
    assert_eq!(fs::read(root.join("a_link.txt")).unwrap(), b"precious");
}
