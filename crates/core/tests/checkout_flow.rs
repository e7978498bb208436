//! End-to-end checkout tests against a real filesystem store.
//!
//! Each test builds an [`FsStore`] in a temp directory, publishes
//! component versions, seeds a working copy, and drives the orchestrator
//! through the same paths the CLI would.

use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tempfile::TempDir;

use compvc_core::checkout::{CheckoutOrchestrator, CheckoutStatus};
use compvc_core::component::{
    CheckoutOptions, ComponentId, MergeStrategy, TargetDirective, Version,
};
use compvc_core::merge::MergeAction;
use compvc_core::snapshot::FileSnapshot;
use compvc_core::store::{FsStore, VersionStore, Workspace};

// ===========================================================================
// Helpers
// ===========================================================================

fn setup() -> (TempDir, Arc<FsStore>) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FsStore::new(dir.path()));
    (dir, store)
}

fn publish(store: &FsStore, id: &ComponentId, version: &str, files: &[(&str, &str)]) {
    let snapshot = FileSnapshot::from_files(files.iter().copied());
    store.publish(id, &Version::new(version), &snapshot).unwrap();
}

fn orchestrator(store: &Arc<FsStore>, strategy: MergeStrategy) -> CheckoutOrchestrator<FsStore> {
    CheckoutOrchestrator::new(store.clone(), strategy, CheckoutOptions::default())
}

fn wc_content(store: &FsStore, id: &ComponentId, path: &str) -> Option<String> {
    store
        .read_working_copy(id)
        .unwrap()
        .get(Path::new(path))
        .map(|c| c.text.clone())
}

// ===========================================================================
// Fast path and idempotence
// ===========================================================================

#[tokio::test]
async fn unmodified_checkout_matches_target_snapshot_exactly() {
    let (_dir, store) = setup();
    let id = ComponentId::new("utils", "sort");
    publish(&store, &id, "v1", &[("a.txt", "one\n"), ("b.txt", "two\n")]);
    publish(
        &store,
        &id,
        "v2",
        &[("a.txt", "one updated\n"), ("c.txt", "three\n")],
    );
    store.init_working_copy(&id, &Version::new("v1")).unwrap();

    let results = orchestrator(&store, MergeStrategy::Unspecified)
        .checkout_many(
            &[id.clone()],
            &TargetDirective::Explicit(Version::new("v2")),
        )
        .await;

    assert!(!results.has_failures());
    let result = &results.components[0];
    assert_eq!(result.status, CheckoutStatus::Succeeded);
    assert_eq!(result.applied_version, Version::new("v2"));

    // Working copy equals the v2 snapshot: a.txt updated, b.txt removed,
    // c.txt added, and no conflicts anywhere.
    assert_eq!(wc_content(&store, &id, "a.txt").as_deref(), Some("one updated\n"));
    assert_eq!(wc_content(&store, &id, "b.txt"), None);
    assert_eq!(wc_content(&store, &id, "c.txt").as_deref(), Some("three\n"));
    assert!(result.conflicted_paths().is_empty());
    assert_eq!(store.base_version(&id).unwrap(), Version::new("v2"));
}

#[tokio::test]
async fn checkout_to_current_version_is_idempotent() {
    let (_dir, store) = setup();
    let id = ComponentId::new("utils", "sort");
    publish(&store, &id, "v1", &[("a.txt", "one\n")]);
    store.init_working_copy(&id, &Version::new("v1")).unwrap();

    let results = orchestrator(&store, MergeStrategy::Unspecified)
        .checkout_many(
            &[id.clone()],
            &TargetDirective::Explicit(Version::new("v1")),
        )
        .await;

    let result = &results.components[0];
    assert_eq!(result.status, CheckoutStatus::Succeeded);
    assert!(result
        .files
        .iter()
        .all(|f| f.action == MergeAction::Unchanged));
}

// ===========================================================================
// Reset
// ===========================================================================

#[tokio::test]
async fn reset_discards_all_local_modifications() {
    let (_dir, store) = setup();
    let id = ComponentId::new("utils", "sort");
    publish(&store, &id, "v1", &[("a.txt", "one\n"), ("b.txt", "two\n")]);
    store.init_working_copy(&id, &Version::new("v1")).unwrap();

    store
        .write_file(&id, Path::new("a.txt"), "scribbled over\n")
        .unwrap();
    store
        .write_file(&id, Path::new("stray.txt"), "should vanish\n")
        .unwrap();
    store.remove_file(&id, Path::new("b.txt")).unwrap();

    let results = orchestrator(&store, MergeStrategy::Unspecified)
        .checkout_many(&[id.clone()], &TargetDirective::Reset)
        .await;

    assert!(!results.has_failures());
    assert_eq!(results.components[0].status, CheckoutStatus::Succeeded);

    // Working copy equals the base snapshot exactly.
    let wc = store.read_working_copy(&id).unwrap();
    assert_eq!(wc.len(), 2);
    assert_eq!(wc_content(&store, &id, "a.txt").as_deref(), Some("one\n"));
    assert_eq!(wc_content(&store, &id, "b.txt").as_deref(), Some("two\n"));
    assert_eq!(wc_content(&store, &id, "stray.txt"), None);
}

#[tokio::test]
async fn reset_on_unmodified_component_is_a_safe_noop() {
    let (_dir, store) = setup();
    let id = ComponentId::new("utils", "sort");
    publish(&store, &id, "v1", &[("a.txt", "one\n")]);
    store.init_working_copy(&id, &Version::new("v1")).unwrap();

    let results = orchestrator(&store, MergeStrategy::Unspecified)
        .checkout_many(&[id.clone()], &TargetDirective::Reset)
        .await;

    let result = &results.components[0];
    assert_eq!(result.status, CheckoutStatus::Succeeded);
    assert!(result
        .files
        .iter()
        .all(|f| f.action == MergeAction::Unchanged));
}

#[tokio::test]
async fn reset_without_recorded_base_fails_per_component() {
    let (_dir, store) = setup();
    let id = ComponentId::new("utils", "sort");
    publish(&store, &id, "v1", &[("a.txt", "one\n")]);
    // No working copy initialized, so there is no base to restore.

    let results = orchestrator(&store, MergeStrategy::Unspecified)
        .checkout_many(&[id.clone()], &TargetDirective::Reset)
        .await;

    assert!(results.components.is_empty());
    assert_eq!(results.failed_components.len(), 1);
    assert!(results.failed_components[0]
        .failure_message
        .contains("no base version"));
}

// ===========================================================================
// Merge scenarios
// ===========================================================================

/// Local edits `a.txt`, target `v2` only changes `b.txt`: no overlap, so
/// `a.txt` keeps the local edit and `b.txt` takes target content.
#[tokio::test]
async fn disjoint_file_changes_merge_cleanly() {
    let (_dir, store) = setup();
    let id = ComponentId::new("utils", "sort");
    publish(
        &store,
        &id,
        "v1",
        &[("a.txt", "line1\nline2\nline3\n"), ("b.txt", "beta\n")],
    );
    publish(
        &store,
        &id,
        "v2",
        &[("a.txt", "line1\nline2\nline3\n"), ("b.txt", "beta v2\n")],
    );
    store.init_working_copy(&id, &Version::new("v1")).unwrap();
    store
        .write_file(&id, Path::new("a.txt"), "line1\nLOCAL EDIT\nline3\n")
        .unwrap();

    let results = orchestrator(&store, MergeStrategy::Unspecified)
        .checkout_many(
            &[id.clone()],
            &TargetDirective::Explicit(Version::new("v2")),
        )
        .await;

    let result = &results.components[0];
    assert_eq!(result.status, CheckoutStatus::Succeeded);
    assert_eq!(
        wc_content(&store, &id, "a.txt").as_deref(),
        Some("line1\nLOCAL EDIT\nline3\n")
    );
    assert_eq!(wc_content(&store, &id, "b.txt").as_deref(), Some("beta v2\n"));
}

/// Both sides edit the same line of `a.txt`: conflicted under the default
/// strategy, fully resolved to target content under `Theirs`.
#[tokio::test]
async fn overlapping_edit_resolved_by_theirs() {
    let (_dir, store) = setup();
    let id = ComponentId::new("utils", "sort");
    publish(&store, &id, "v1", &[("a.txt", "line1\nline2\nline3\n")]);
    publish(&store, &id, "v2", &[("a.txt", "line1\nTARGET\nline3\n")]);
    store.init_working_copy(&id, &Version::new("v1")).unwrap();
    store
        .write_file(&id, Path::new("a.txt"), "line1\nLOCAL\nline3\n")
        .unwrap();

    let results = orchestrator(&store, MergeStrategy::Theirs)
        .checkout_many(
            &[id.clone()],
            &TargetDirective::Explicit(Version::new("v2")),
        )
        .await;

    let result = &results.components[0];
    // Strategy-resolved, not SucceededWithConflicts.
    assert_eq!(result.status, CheckoutStatus::Succeeded);
    assert_eq!(
        result.files[0].action,
        MergeAction::ResolvedByStrategy(MergeStrategy::Theirs)
    );
    let content = wc_content(&store, &id, "a.txt").unwrap();
    assert_eq!(content, "line1\nTARGET\nline3\n");
    assert!(!content.contains("<<<<<<<"));
}

#[tokio::test]
async fn overlapping_edit_resolved_by_ours_keeps_local() {
    let (_dir, store) = setup();
    let id = ComponentId::new("utils", "sort");
    publish(&store, &id, "v1", &[("a.txt", "line1\nline2\nline3\n")]);
    publish(&store, &id, "v2", &[("a.txt", "line1\nTARGET\nline3\n")]);
    store.init_working_copy(&id, &Version::new("v1")).unwrap();
    store
        .write_file(&id, Path::new("a.txt"), "line1\nLOCAL\nline3\n")
        .unwrap();

    let results = orchestrator(&store, MergeStrategy::Ours)
        .checkout_many(
            &[id.clone()],
            &TargetDirective::Explicit(Version::new("v2")),
        )
        .await;

    assert_eq!(results.components[0].status, CheckoutStatus::Succeeded);
    assert_eq!(
        wc_content(&store, &id, "a.txt").as_deref(),
        Some("line1\nLOCAL\nline3\n")
    );
    // The base still advances to the target version.
    assert_eq!(store.base_version(&id).unwrap(), Version::new("v2"));
}

#[tokio::test]
async fn unresolved_conflict_leaves_markers_and_flags_status() {
    let (_dir, store) = setup();
    let id = ComponentId::new("utils", "sort");
    publish(&store, &id, "v1", &[("a.txt", "line1\nline2\nline3\n")]);
    publish(&store, &id, "v2", &[("a.txt", "line1\nTARGET\nline3\n")]);
    store.init_working_copy(&id, &Version::new("v1")).unwrap();
    store
        .write_file(&id, Path::new("a.txt"), "line1\nLOCAL\nline3\n")
        .unwrap();

    let results = orchestrator(&store, MergeStrategy::Manual)
        .checkout_many(
            &[id.clone()],
            &TargetDirective::Explicit(Version::new("v2")),
        )
        .await;

    let result = &results.components[0];
    assert_eq!(result.status, CheckoutStatus::SucceededWithConflicts);
    assert_eq!(result.conflicted_paths().len(), 1);
    let content = wc_content(&store, &id, "a.txt").unwrap();
    assert!(content.contains("<<<<<<<"));
    assert!(content.contains("LOCAL"));
    assert!(content.contains("TARGET"));
}

#[tokio::test]
async fn target_deleting_locally_modified_file_conflicts() {
    let (_dir, store) = setup();
    let id = ComponentId::new("utils", "sort");
    publish(&store, &id, "v1", &[("a.txt", "keep me\n"), ("b.txt", "b\n")]);
    // v2 drops a.txt entirely.
    publish(&store, &id, "v2", &[("b.txt", "b\n")]);
    store.init_working_copy(&id, &Version::new("v1")).unwrap();
    store
        .write_file(&id, Path::new("a.txt"), "locally edited\n")
        .unwrap();

    let results = orchestrator(&store, MergeStrategy::Unspecified)
        .checkout_many(
            &[id.clone()],
            &TargetDirective::Explicit(Version::new("v2")),
        )
        .await;

    // The deletion is not applied silently: the file survives with markers.
    let result = &results.components[0];
    assert_eq!(result.status, CheckoutStatus::SucceededWithConflicts);
    let content = wc_content(&store, &id, "a.txt").unwrap();
    assert!(content.contains("locally edited"));
    assert!(content.contains("<<<<<<<"));
}

#[tokio::test]
async fn theirs_applies_a_conflicting_deletion() {
    let (_dir, store) = setup();
    let id = ComponentId::new("utils", "sort");
    publish(&store, &id, "v1", &[("a.txt", "keep me\n"), ("b.txt", "b\n")]);
    publish(&store, &id, "v2", &[("b.txt", "b\n")]);
    store.init_working_copy(&id, &Version::new("v1")).unwrap();
    store
        .write_file(&id, Path::new("a.txt"), "locally edited\n")
        .unwrap();

    let results = orchestrator(&store, MergeStrategy::Theirs)
        .checkout_many(
            &[id.clone()],
            &TargetDirective::Explicit(Version::new("v2")),
        )
        .await;

    assert_eq!(results.components[0].status, CheckoutStatus::Succeeded);
    assert_eq!(wc_content(&store, &id, "a.txt"), None);
}

// ===========================================================================
// Batch behaviour
// ===========================================================================

/// `latest` resolves per component: X's latest is v3, Y's is v5, and the
/// output preserves input order.
#[tokio::test]
async fn latest_resolves_per_component_in_input_order() {
    let (_dir, store) = setup();
    let x = ComponentId::new("utils", "x");
    let y = ComponentId::new("utils", "y");
    for v in ["v1", "v2", "v3"] {
        publish(&store, &x, v, &[("x.txt", v)]);
    }
    for v in ["v1", "v2", "v3", "v4", "v5"] {
        publish(&store, &y, v, &[("y.txt", v)]);
    }
    store.init_working_copy(&x, &Version::new("v1")).unwrap();
    store.init_working_copy(&y, &Version::new("v1")).unwrap();

    let results = orchestrator(&store, MergeStrategy::Unspecified)
        .checkout_many(&[x.clone(), y.clone()], &TargetDirective::Latest)
        .await;

    assert_eq!(results.components.len(), 2);
    assert_eq!(results.components[0].id.to_string_without_version(), "utils/x");
    assert_eq!(results.components[0].applied_version, Version::new("v3"));
    assert_eq!(results.components[1].id.to_string_without_version(), "utils/y");
    assert_eq!(results.components[1].applied_version, Version::new("v5"));
}

#[tokio::test]
async fn one_failing_component_does_not_abort_the_batch() {
    let (_dir, store) = setup();
    let good = ComponentId::new("utils", "good");
    let missing = ComponentId::new("utils", "missing");
    publish(&store, &good, "v1", &[("a.txt", "one\n")]);
    publish(&store, &good, "v2", &[("a.txt", "two\n")]);
    store.init_working_copy(&good, &Version::new("v1")).unwrap();

    let results = orchestrator(&store, MergeStrategy::Unspecified)
        .checkout_many(
            &[missing.clone(), good.clone()],
            &TargetDirective::Explicit(Version::new("v2")),
        )
        .await;

    assert_eq!(results.failed_components.len(), 1);
    assert_eq!(results.failed_components[0].id, missing);
    assert!(results.failed_components[0]
        .failure_message
        .contains("not found"));

    assert_eq!(results.components.len(), 1);
    assert_eq!(
        results.components[0].id.to_string_without_version(),
        "utils/good"
    );
    assert_eq!(wc_content(&store, &good, "a.txt").as_deref(), Some("two\n"));
}

#[tokio::test]
async fn missing_version_fails_only_that_component() {
    let (_dir, store) = setup();
    let id = ComponentId::new("utils", "sort");
    publish(&store, &id, "v1", &[("a.txt", "one\n")]);
    store.init_working_copy(&id, &Version::new("v1")).unwrap();

    let results = orchestrator(&store, MergeStrategy::Unspecified)
        .checkout_many(
            &[id.clone()],
            &TargetDirective::Explicit(Version::new("v99")),
        )
        .await;

    assert_eq!(results.failed_components.len(), 1);
    assert!(results.failed_components[0]
        .failure_message
        .contains("v99"));
}

#[tokio::test]
async fn cancelled_batch_reports_unstarted_components_as_failed() {
    let (_dir, store) = setup();
    let id = ComponentId::new("utils", "sort");
    publish(&store, &id, "v1", &[("a.txt", "one\n")]);
    store.init_working_copy(&id, &Version::new("v1")).unwrap();

    let orch = orchestrator(&store, MergeStrategy::Unspecified);
    orch.cancel_handle().store(true, Ordering::SeqCst);

    let results = orch
        .checkout_many(
            &[id.clone()],
            &TargetDirective::Explicit(Version::new("v1")),
        )
        .await;

    assert!(results.components.is_empty());
    assert!(results.failed_components[0]
        .failure_message
        .contains("cancelled"));
    // Nothing was touched.
    assert_eq!(wc_content(&store, &id, "a.txt").as_deref(), Some("one\n"));
}

// ===========================================================================
// Configuration boundary
// ===========================================================================

#[test]
fn conflicting_strategy_flags_are_rejected_before_processing() {
    // `--ours --theirs` together is an invocation-level error.
    let err = MergeStrategy::from_flags(false, true, true, false).unwrap_err();
    assert!(err.to_string().contains("conflicting"));
}

#[tokio::test]
async fn untracked_working_copy_takes_plain_overwrite_path() {
    let (_dir, store) = setup();
    let id = ComponentId::new("utils", "sort");
    publish(&store, &id, "v1", &[("a.txt", "one\n")]);
    // Working copy exists but has no recorded base.
    store
        .write_file(&id, Path::new("scratch.txt"), "scratch\n")
        .unwrap();

    let results = orchestrator(&store, MergeStrategy::Unspecified)
        .checkout_many(
            &[id.clone()],
            &TargetDirective::Explicit(Version::new("v1")),
        )
        .await;

    assert!(!results.has_failures());
    assert_eq!(wc_content(&store, &id, "a.txt").as_deref(), Some("one\n"));
    // Plain overwrite brings the copy to the target snapshot exactly.
    assert_eq!(wc_content(&store, &id, "scratch.txt"), None);
    assert_eq!(store.base_version(&id).unwrap(), Version::new("v1"));
}
