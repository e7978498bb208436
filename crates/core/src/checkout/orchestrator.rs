//! Batch checkout orchestration.
//!
//! The [`CheckoutOrchestrator`] drives the per-component pipeline --
//! directive resolution, modification detection, merge, resolution,
//! working-copy writes -- and assembles the batch outcome:
//!
//! 1. Resolve the target directive to a concrete version (per component
//!    under `Latest`).
//! 2. Detect local modifications; unmodified working copies take a plain
//!    overwrite fast path, `Reset` bypasses merging entirely.
//! 3. Three-way merge and strategy resolution for modified copies.
//! 4. Apply final content and record the new base version.
//!
//! Components are independent: one component's failure becomes a
//! `FailedComponent` entry and never aborts its siblings, and output
//! order always matches input order regardless of completion order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::checkout::hooks::{DependencyInstaller, DistWriter, NoopHooks};
use crate::checkout::results::{
    ApplyVersionResults, CheckoutStatus, ComponentCheckoutResult, FileOutcome,
};
use crate::component::{CheckoutOptions, ComponentId, MergeStrategy, TargetDirective, Version};
use crate::errors::CheckoutError;
use crate::merge::engine::{MergeAction, MergeEngine, MergedFile};
use crate::merge::resolver::{ConflictResolver, ResolutionPrompt, ResolutionSummary};
use crate::snapshot::FileSnapshot;
use crate::status::{ModificationDetector, ModificationStatus};
use crate::store::{with_retry, VersionStore, Workspace};

struct Inner<S> {
    store: Arc<S>,
    strategy: MergeStrategy,
    options: CheckoutOptions,
    prompt: Option<Arc<dyn ResolutionPrompt>>,
    installer: Arc<dyn DependencyInstaller>,
    dist_writer: Arc<dyn DistWriter>,
    /// Cooperative cancellation flag shared with the caller.
    cancelled: Arc<AtomicBool>,
}

/// Drives checkouts across a batch of components.
pub struct CheckoutOrchestrator<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for CheckoutOrchestrator<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S> CheckoutOrchestrator<S>
where
    S: VersionStore + Workspace + 'static,
{
    pub fn new(store: Arc<S>, strategy: MergeStrategy, options: CheckoutOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                strategy,
                options,
                prompt: None,
                installer: Arc::new(NoopHooks),
                dist_writer: Arc::new(NoopHooks),
                cancelled: Arc::new(AtomicBool::new(false)),
            }),
        }
    }

    /// Attach the interactive resolution prompt collaborator.
    pub fn with_prompt(mut self, prompt: Arc<dyn ResolutionPrompt>) -> Self {
        Arc::get_mut(&mut self.inner)
            .expect("configure the orchestrator before cloning it")
            .prompt = Some(prompt);
        self
    }

    /// Attach the post-checkout dependency installer.
    pub fn with_installer(mut self, installer: Arc<dyn DependencyInstaller>) -> Self {
        Arc::get_mut(&mut self.inner)
            .expect("configure the orchestrator before cloning it")
            .installer = installer;
        self
    }

    /// Attach the post-checkout dist writer.
    pub fn with_dist_writer(mut self, dist_writer: Arc<dyn DistWriter>) -> Self {
        Arc::get_mut(&mut self.inner)
            .expect("configure the orchestrator before cloning it")
            .dist_writer = dist_writer;
        self
    }

    /// A handle the caller can set to cancel the batch. Components already
    /// applied stay applied; components not yet started fail with a
    /// cancellation reason. No global rollback.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.inner.cancelled.clone()
    }

    fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    // -----------------------------------------------------------------------
    // Batch entry point
    // -----------------------------------------------------------------------

    /// Check out every id in `ids` to the state `directive` requests.
    ///
    /// `ids` must already be wildcard-expanded and deduplicated by the
    /// caller. Output order matches `ids` order.
    pub async fn checkout_many(
        &self,
        ids: &[ComponentId],
        directive: &TargetDirective,
    ) -> ApplyVersionResults {
        info!(
            components = ids.len(),
            directive = %directive,
            strategy = %self.inner.strategy,
            "starting batch checkout"
        );

        // The interactive strategy suspends on a per-file prompt, so the
        // batch runs sequentially; otherwise components fan out.
        let outcomes = if self.inner.strategy == MergeStrategy::ManualInteractive {
            let mut outcomes = Vec::with_capacity(ids.len());
            for id in ids {
                let outcome = self.checkout_one(id, directive).await;
                outcomes.push((id.clone(), outcome));
            }
            outcomes
        } else {
            self.checkout_concurrent(ids, directive).await
        };

        let results = ApplyVersionResults::aggregate(outcomes);
        info!(
            succeeded = results.components.len(),
            failed = results.failed_components.len(),
            with_conflicts = results.conflicted_count(),
            "batch checkout complete"
        );
        results
    }

    async fn checkout_concurrent(
        &self,
        ids: &[ComponentId],
        directive: &TargetDirective,
    ) -> Vec<(ComponentId, Result<ComponentCheckoutResult, CheckoutError>)> {
        let mut set = JoinSet::new();
        for (idx, id) in ids.iter().enumerate() {
            let this = self.clone();
            let id = id.clone();
            let directive = directive.clone();
            set.spawn(async move {
                let outcome = this.checkout_one(&id, &directive).await;
                (idx, outcome)
            });
        }

        // Buffer completions by input index so output order is stable.
        let mut slots: Vec<Option<Result<ComponentCheckoutResult, CheckoutError>>> =
            ids.iter().map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, outcome)) => slots[idx] = Some(outcome),
                Err(e) => warn!(error = %e, "checkout task aborted"),
            }
        }

        ids.iter()
            .cloned()
            .zip(slots)
            .map(|(id, slot)| {
                let outcome = slot.unwrap_or(Err(CheckoutError::Cancelled));
                (id, outcome)
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Per-component pipeline
    // -----------------------------------------------------------------------

    async fn checkout_one(
        &self,
        id: &ComponentId,
        directive: &TargetDirective,
    ) -> Result<ComponentCheckoutResult, CheckoutError> {
        if self.is_cancelled() {
            return Err(CheckoutError::Cancelled);
        }
        match directive {
            TargetDirective::Reset => self.reset_component(id).await,
            _ => self.switch_component(id, directive).await,
        }
    }

    /// Switch `id` to the directive's target version, merging local
    /// modifications as needed.
    async fn switch_component(
        &self,
        id: &ComponentId,
        directive: &TargetDirective,
    ) -> Result<ComponentCheckoutResult, CheckoutError> {
        let store = &self.inner.store;

        let target_version = match directive {
            TargetDirective::Explicit(v) => v.clone(),
            TargetDirective::Latest => {
                with_retry("resolve_latest", || store.resolve_latest(id)).await?
            }
            TargetDirective::Reset => unreachable!("reset handled by reset_component"),
        };
        debug!(component = %id, target = %target_version, "resolved target version");

        let target = with_retry("snapshot", || store.snapshot(id, &target_version)).await?;
        let modification =
            with_retry("detect", || ModificationDetector::detect(store.as_ref(), id)).await?;

        let (files, summary) = match modification {
            ModificationStatus::Unmodified | ModificationStatus::Untracked => {
                // Plain overwrite: no merge needed.
                let local = with_retry("read_working_copy", || store.read_working_copy(id)).await?;
                (fast_forward(&local, &target), ResolutionSummary::default())
            }
            ModificationStatus::Modified(changed) => {
                info!(
                    component = %id,
                    changed = changed.len(),
                    "local modifications found, merging"
                );
                let base_version = with_retry("base_version", || store.base_version(id)).await?;
                let base = with_retry("snapshot", || store.snapshot(id, &base_version)).await?;
                let local = with_retry("read_working_copy", || store.read_working_copy(id)).await?;

                let mut merged = MergeEngine::merge_snapshots(&base, &local, &target)?;
                let summary = ConflictResolver::resolve(
                    id,
                    &mut merged,
                    self.inner.strategy,
                    self.inner.prompt.as_deref(),
                );
                (merged, summary)
            }
        };

        self.apply_files(id, &files).await?;
        with_retry("set_base_version", || {
            store.set_base_version(id, &target_version)
        })
        .await?;

        let status = if summary.has_unresolved() {
            CheckoutStatus::SucceededWithConflicts
        } else {
            CheckoutStatus::Succeeded
        };
        if status == CheckoutStatus::Succeeded {
            self.run_hooks(id);
        }

        Ok(self.build_result(id, target_version, files, status))
    }

    /// Restore the working copy to the base snapshot, discarding every
    /// local modification. Bypasses merge and resolution entirely.
    async fn reset_component(
        &self,
        id: &ComponentId,
    ) -> Result<ComponentCheckoutResult, CheckoutError> {
        let store = &self.inner.store;

        let base_version = with_retry("base_version", || store.base_version(id)).await?;
        let base = with_retry("snapshot", || store.snapshot(id, &base_version)).await?;
        let local = with_retry("read_working_copy", || store.read_working_copy(id)).await?;

        let files = fast_forward(&local, &base);
        let restored = files
            .iter()
            .filter(|f| f.action != MergeAction::Unchanged)
            .count();
        info!(component = %id, base = %base_version, restored, "reset working copy");

        self.apply_files(id, &files).await?;
        with_retry("set_base_version", || {
            store.set_base_version(id, &base_version)
        })
        .await?;

        Ok(self.build_result(id, base_version, files, CheckoutStatus::Succeeded))
    }

    /// Write final content into the working copy. `None` content removes
    /// the file; `Unchanged` entries are skipped so an idempotent checkout
    /// touches nothing.
    async fn apply_files(
        &self,
        id: &ComponentId,
        files: &[MergedFile],
    ) -> Result<(), CheckoutError> {
        let store = &self.inner.store;
        for file in files {
            if file.action == MergeAction::Unchanged {
                continue;
            }
            match &file.content {
                Some(content) => {
                    with_retry("write_file", || store.write_file(id, &file.path, content))
                        .await?;
                }
                None => {
                    with_retry("remove_file", || store.remove_file(id, &file.path)).await?;
                }
            }
            if self.inner.options.verbose {
                debug!(component = %id, path = %file.path.display(), action = ?file.action, "applied file");
            }
        }
        Ok(())
    }

    fn run_hooks(&self, id: &ComponentId) {
        if !self.inner.options.skip_dependency_install {
            if let Err(e) = self.inner.installer.install(id) {
                warn!(component = %id, error = %e, "dependency install failed");
            }
        }
        if !self.inner.options.skip_dist_write {
            if let Err(e) = self.inner.dist_writer.write_dist(id) {
                warn!(component = %id, error = %e, "dist write failed");
            }
        }
    }

    fn build_result(
        &self,
        id: &ComponentId,
        applied_version: Version,
        files: Vec<MergedFile>,
        status: CheckoutStatus,
    ) -> ComponentCheckoutResult {
        let files = files
            .into_iter()
            .map(|f| FileOutcome {
                path: f.path,
                action: f.action,
            })
            .collect();
        ComponentCheckoutResult {
            id: id.with_version(applied_version.clone()),
            applied_version,
            files,
            status,
            completed_at: Utc::now(),
        }
    }
}

/// Per-file outcomes for a plain overwrite of `local` with `target`.
///
/// Used by both the unmodified fast path and the reset path: matching
/// hashes are `Unchanged`, differing or target-only files take target
/// content, local-only files are removed.
fn fast_forward(local: &FileSnapshot, target: &FileSnapshot) -> Vec<MergedFile> {
    local
        .union_paths(target)
        .into_iter()
        .map(|path| {
            let (action, content) = match (local.get(path), target.get(path)) {
                (Some(l), Some(t)) if l.hash == t.hash => {
                    (MergeAction::Unchanged, Some(t.text.clone()))
                }
                (_, Some(t)) => (MergeAction::FastForwarded, Some(t.text.clone())),
                (Some(_), None) => (MergeAction::FastForwarded, None),
                (None, None) => unreachable!("path came from the union"),
            };
            MergedFile {
                path: path.clone(),
                action,
                content,
                sides: None,
            }
        })
        .collect()
}
