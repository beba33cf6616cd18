//! Mass-copy synchronizer: fans one origin out to many targets.
//!
//! Targets run concurrently on a `JoinSet`, bounded by a semaphore. Each
//! target is an independent duplication; one failing never rolls back the
//! others. Cancelling the token stops targets that have not started yet.
//! Targets that already hold a permit run to completion.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use botmaas_types::config::{MassCopyConfig, ReclonePolicy};
use botmaas_types::error::CloneError;
use botmaas_types::lineage::OriginId;
use botmaas_types::mass_copy::{CopyTarget, MassCopyReport, MassCopyRequest, TargetOutcome, TargetResult};

use crate::repository::lineage::{CloneCommitter, LineageLedger};
use crate::repository::space::SpaceAccess;
use crate::repository::template::TemplateStore;
use crate::repository::workflow::WorkflowRepository;
use crate::service::duplication::DuplicationEngine;
use crate::service::validation::validate_mass_copy;

pub struct MassCopySynchronizer<T, W, L, A>
where
    T: TemplateStore + 'static,
    W: WorkflowRepository + 'static,
    L: LineageLedger + CloneCommitter + 'static,
    A: SpaceAccess + 'static,
{
    engine: Arc<DuplicationEngine<T, W, L, A>>,
    config: MassCopyConfig,
}

impl<T, W, L, A> MassCopySynchronizer<T, W, L, A>
where
    T: TemplateStore + 'static,
    W: WorkflowRepository + 'static,
    L: LineageLedger + CloneCommitter + 'static,
    A: SpaceAccess + 'static,
{
    pub fn new(engine: Arc<DuplicationEngine<T, W, L, A>>, config: MassCopyConfig) -> Self {
        Self { engine, config }
    }

    /// Duplicate `request.origin_id` once per target.
    ///
    /// Only a malformed request fails the whole call. Per-target failures,
    /// skips and cancellations are reported in the returned report, one
    /// result per target in request order.
    #[tracing::instrument(skip_all, fields(origin = %request.origin_id, targets = request.targets.len()))]
    pub async fn synchronize(
        &self,
        request: MassCopyRequest,
        token: CancellationToken,
    ) -> Result<MassCopyReport, CloneError> {
        validate_mass_copy(&request, self.config.max_targets)?;

        let MassCopyRequest { origin_id, targets } = request;
        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel_targets.max(1)));
        let policy = self.config.reclone_policy;
        let mut join_set = JoinSet::new();

        for (index, target) in targets.iter().cloned().enumerate() {
            let engine = Arc::clone(&self.engine);
            let semaphore = Arc::clone(&semaphore);
            let token = token.clone();

            join_set.spawn(async move {
                let permit = tokio::select! {
                    biased;
                    _ = token.cancelled() => None,
                    permit = semaphore.acquire_owned() => permit.ok(),
                };
                let outcome = match permit {
                    Some(_permit) if !token.is_cancelled() => {
                        run_target(&engine, &origin_id, target, policy).await
                    }
                    _ => TargetOutcome::Cancelled,
                };
                (index, outcome)
            });
        }

        let mut outcomes: Vec<Option<TargetOutcome>> = vec![None; targets.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => tracing::error!(error = %e, "mass-copy target task failed to join"),
            }
        }

        let results: Vec<TargetResult> = targets
            .into_iter()
            .zip(outcomes)
            .map(|(target, outcome)| TargetResult {
                target,
                outcome: outcome.unwrap_or_else(|| TargetOutcome::failed(&CloneError::Storage {
                    message: "target task did not complete".to_string(),
                    retryable: true,
                })),
            })
            .collect();

        let report = MassCopyReport::new(origin_id, results);
        tracing::info!(
            cloned = report.success_count,
            failed = report.failures().len(),
            cancelled = report.cancelled_count(),
            "mass copy finished"
        );
        Ok(report)
    }
}

async fn run_target<T, W, L, A>(
    engine: &DuplicationEngine<T, W, L, A>,
    origin_id: &OriginId,
    target: CopyTarget,
    policy: ReclonePolicy,
) -> TargetOutcome
where
    T: TemplateStore,
    W: WorkflowRepository,
    L: LineageLedger + CloneCommitter,
    A: SpaceAccess,
{
    if policy == ReclonePolicy::SkipExisting {
        match engine
            .ledger()
            .find_clone_for(&target.uid, origin_id, target.space_id.as_ref())
            .await
        {
            Ok(Some(existing)) => {
                return TargetOutcome::Skipped {
                    existing: existing.current_id,
                };
            }
            Ok(None) => {}
            Err(e) => return TargetOutcome::failed(&CloneError::from(e)),
        }
    }

    match engine
        .create_from_template(&target.uid, origin_id, target.space_id, target.name)
        .await
    {
        Ok((workflow, record)) => TargetOutcome::Cloned {
            workflow_id: workflow.id,
            record_id: record.id,
        },
        Err(e) => {
            tracing::warn!(uid = %target.uid, error = %e, "mass-copy target failed");
            TargetOutcome::failed(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botmaas_types::error::CloneErrorKind;
    use botmaas_types::template::TemplateId;

    use crate::service::catalog::TemplateCatalog;
    use crate::service::testing::{
        CommitGate, MemoryLineageLedger, MemorySpaceAccess, MemoryTemplateStore,
        MemoryWorkflowRepository, sample_template, test_engine,
    };

    fn request(origin: TemplateId, uids: &[&str]) -> MassCopyRequest {
        MassCopyRequest {
            origin_id: OriginId::Template(origin),
            targets: uids
                .iter()
                .map(|uid| CopyTarget {
                    uid: uid.to_string(),
                    space_id: None,
                    name: None,
                })
                .collect(),
        }
    }

    fn config(parallel: usize, policy: ReclonePolicy) -> MassCopyConfig {
        MassCopyConfig {
            max_parallel_targets: parallel,
            max_targets: 50,
            reclone_policy: policy,
        }
    }

    #[tokio::test]
    async fn test_mass_copy_all_targets_succeed() {
        let (engine, templates, _, ledger, _) = test_engine();
        let template = sample_template("T");
        templates.insert(template.clone());
        let sync = MassCopySynchronizer::new(Arc::new(engine), config(4, ReclonePolicy::AlwaysNew));

        let report = sync
            .synchronize(request(template.id, &["u1", "u2", "u3"]), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.success_count, 3);
        assert!(report.partial_failure().is_none());
        assert_eq!(ledger.record_count(), 3);
        let uids: Vec<_> = report.results.iter().map(|r| r.target.uid.as_str()).collect();
        assert_eq!(uids, ["u1", "u2", "u3"]);
    }

    #[tokio::test]
    async fn test_mass_copy_partial_failure_keeps_successes() {
        let (engine, templates, _, ledger, access) = test_engine();
        let template = sample_template("T");
        templates.insert(template.clone());
        access.deny("u3");
        let sync = MassCopySynchronizer::new(Arc::new(engine), config(2, ReclonePolicy::AlwaysNew));

        let report = sync
            .synchronize(request(template.id, &["u1", "u2", "u3", "u4"]), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.success_count, 3);
        assert_eq!(ledger.record_count(), 3);
        let partial = report.partial_failure().unwrap();
        assert_eq!(partial.failures.len(), 1);
        assert_eq!(partial.failures[0].index, 2);
        assert_eq!(partial.failures[0].kind, CloneErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn test_mass_copy_missing_origin_fails_every_target() {
        let (engine, _, _, ledger, _) = test_engine();
        let sync = MassCopySynchronizer::new(Arc::new(engine), config(2, ReclonePolicy::AlwaysNew));

        let report = sync
            .synchronize(request(TemplateId::new(), &["u1", "u2"]), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.success_count, 0);
        assert_eq!(report.failures().len(), 2);
        assert!(report.failures().iter().all(|f| f.kind == CloneErrorKind::OriginNotFound));
        assert_eq!(ledger.record_count(), 0);
    }

    #[tokio::test]
    async fn test_mass_copy_rejects_empty_batch() {
        let (engine, _, _, _, _) = test_engine();
        let sync = MassCopySynchronizer::new(Arc::new(engine), config(2, ReclonePolicy::AlwaysNew));
        let err = sync
            .synchronize(request(TemplateId::new(), &[]), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CloneError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_mass_copy_reclones_by_default() {
        let (engine, templates, _, ledger, _) = test_engine();
        let template = sample_template("T");
        templates.insert(template.clone());
        let sync = MassCopySynchronizer::new(Arc::new(engine), config(2, ReclonePolicy::AlwaysNew));

        for _ in 0..2 {
            let report = sync
                .synchronize(request(template.id, &["u1"]), CancellationToken::new())
                .await
                .unwrap();
            assert_eq!(report.success_count, 1);
        }
        assert_eq!(ledger.record_count(), 2);
    }

    #[tokio::test]
    async fn test_mass_copy_skip_existing_policy() {
        let (engine, templates, _, ledger, _) = test_engine();
        let template = sample_template("T");
        templates.insert(template.clone());
        let sync = MassCopySynchronizer::new(Arc::new(engine), config(2, ReclonePolicy::SkipExisting));

        let first = sync
            .synchronize(request(template.id, &["u1"]), CancellationToken::new())
            .await
            .unwrap();
        let second = sync
            .synchronize(request(template.id, &["u1", "u2"]), CancellationToken::new())
            .await
            .unwrap();

        let TargetOutcome::Cloned { workflow_id, .. } = first.results[0].outcome else {
            panic!("first copy should clone");
        };
        assert_eq!(
            second.results[0].outcome,
            TargetOutcome::Skipped { existing: workflow_id }
        );
        assert!(second.results[1].outcome.is_cloned());
        assert_eq!(ledger.record_count(), 2);
    }

    #[tokio::test]
    async fn test_mass_copy_cancelled_before_start() {
        let (engine, templates, _, ledger, _) = test_engine();
        let template = sample_template("T");
        templates.insert(template.clone());
        let sync = MassCopySynchronizer::new(Arc::new(engine), config(2, ReclonePolicy::AlwaysNew));

        let token = CancellationToken::new();
        token.cancel();
        let report = sync
            .synchronize(request(template.id, &["u1", "u2"]), token)
            .await
            .unwrap();

        assert_eq!(report.cancelled_count(), 2);
        assert_eq!(report.success_count, 0);
        assert_eq!(ledger.record_count(), 0);
    }

    #[tokio::test]
    async fn test_mass_copy_cancel_keeps_in_flight_target() {
        let templates = MemoryTemplateStore::default();
        let workflows = MemoryWorkflowRepository::default();
        let gate = CommitGate::new();
        let ledger = MemoryLineageLedger::new(workflows.clone()).with_gate(gate.clone());
        let template = sample_template("T");
        templates.insert(template.clone());
        let engine = DuplicationEngine::new(
            TemplateCatalog::new(templates, workflows),
            ledger.clone(),
            MemorySpaceAccess::default(),
        );
        let sync = Arc::new(MassCopySynchronizer::new(
            Arc::new(engine),
            config(1, ReclonePolicy::AlwaysNew),
        ));

        let token = CancellationToken::new();
        let handle = {
            let sync = Arc::clone(&sync);
            let token = token.clone();
            let req = request(template.id, &["u1", "u2", "u3"]);
            tokio::spawn(async move { sync.synchronize(req, token).await })
        };

        // One target holds the only permit and is blocked inside its commit.
        gate.entered.notified().await;
        token.cancel();
        gate.release.add_permits(3);

        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.success_count, 1);
        assert_eq!(report.cancelled_count(), 2);
        assert_eq!(ledger.record_count(), 1);
    }
}
