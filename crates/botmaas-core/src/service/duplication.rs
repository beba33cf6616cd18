//! Duplication engine.
//!
//! Turns one origin (template or existing workflow) into a new, fully
//! independent bot workflow owned by the caller, and records where it came
//! from. Every successful call produces a new workflow; there is no dedup.

use chrono::Utc;

use botmaas_types::error::{CloneError, RepositoryError};
use botmaas_types::lineage::{CloneRecord, CloneSynchronize, OriginId};
use botmaas_types::workflow::{BotWorkflow, SpaceId, WorkflowId, new_flow_id};

use crate::repository::lineage::{CloneCommitter, LineageLedger};
use crate::repository::space::SpaceAccess;
use crate::repository::template::TemplateStore;
use crate::repository::workflow::WorkflowRepository;
use crate::service::catalog::{ResolvedOrigin, TemplateCatalog};
use crate::service::graph::deep_copy_graph;
use crate::service::validation::{validate_clone_synchronize, validate_name, validate_uid};

/// Single-clone engine, generic over its storage ports.
pub struct DuplicationEngine<T, W, L, A>
where
    T: TemplateStore,
    W: WorkflowRepository,
    L: LineageLedger + CloneCommitter,
    A: SpaceAccess,
{
    catalog: TemplateCatalog<T, W>,
    ledger: L,
    access: A,
}

impl<T, W, L, A> DuplicationEngine<T, W, L, A>
where
    T: TemplateStore,
    W: WorkflowRepository,
    L: LineageLedger + CloneCommitter,
    A: SpaceAccess,
{
    pub fn new(catalog: TemplateCatalog<T, W>, ledger: L, access: A) -> Self {
        Self {
            catalog,
            ledger,
            access,
        }
    }

    pub fn catalog(&self) -> &TemplateCatalog<T, W> {
        &self.catalog
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Clone `origin_id` into a new workflow owned by `uid`.
    ///
    /// Steps run in a fixed order and the first failure wins:
    /// 1. validate inputs
    /// 2. resolve the origin (`OriginNotFound`)
    /// 3. check space access (`PermissionDenied`)
    /// 4. deep copy the graph (`DuplicationConflict`)
    /// 5. commit workflow and lineage together (`DuplicateProducedId` / `Storage`)
    #[tracing::instrument(skip(self, override_name), fields(origin = %origin_id))]
    pub async fn create_from_template(
        &self,
        uid: &str,
        origin_id: &OriginId,
        target_space: Option<SpaceId>,
        override_name: Option<String>,
    ) -> Result<(BotWorkflow, CloneRecord), CloneError> {
        validate_uid(uid)?;
        let override_name = override_name.as_deref().map(validate_name).transpose()?;

        let origin = self.catalog.resolve_origin(origin_id).await?;
        self.authorize(uid, origin_id, target_space.as_ref(), &origin).await?;

        let graph = deep_copy_graph(&origin.graph)
            .map_err(|e| CloneError::DuplicationConflict(e.to_string()))?;

        let now = Utc::now();
        let workflow = BotWorkflow {
            id: WorkflowId::new(),
            uid: uid.to_string(),
            space_id: target_space,
            name: override_name.unwrap_or(origin.name),
            description: origin.description,
            flow_id: new_flow_id(),
            graph,
            created_at: now,
            updated_at: now,
        };
        let record = CloneRecord::new(uid, *origin_id, workflow.id, target_space, origin.flow_id);

        self.ledger
            .commit_clone(&workflow, &record)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => CloneError::DuplicateProducedId(workflow.id),
                other => CloneError::from(other),
            })?;

        tracing::info!(
            workflow_id = %workflow.id,
            record_id = %record.id,
            nodes = workflow.graph.nodes.len(),
            "workflow cloned"
        );

        Ok((workflow, record))
    }

    /// Record lineage for a copy that was materialized outside this engine.
    ///
    /// The origin must exist and be clonable by `uid` at the time of the call.
    #[tracing::instrument(skip(self, sync), fields(origin = %sync.origin_id, current = %sync.current_id))]
    pub async fn record_lineage(&self, sync: &CloneSynchronize) -> Result<CloneRecord, CloneError> {
        validate_clone_synchronize(sync)?;

        let origin = self.catalog.resolve_origin(&sync.origin_id).await?;
        self.authorize(&sync.uid, &sync.origin_id, sync.space_id.as_ref(), &origin)
            .await?;

        let record = CloneRecord::new(
            sync.uid.clone(),
            sync.origin_id,
            sync.current_id,
            sync.space_id,
            sync.flow_id.clone(),
        );
        let stored = self
            .ledger
            .record_clone(&record)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => CloneError::DuplicateProducedId(sync.current_id),
                other => CloneError::from(other),
            })?;

        tracing::debug!(record_id = %stored.id, "lineage synchronized");
        Ok(stored)
    }

    /// Whether `uid` may read `workflow`: its owner, or a member of the
    /// space it lives in.
    pub async fn can_read_workflow(&self, uid: &str, workflow: &BotWorkflow) -> Result<bool, CloneError> {
        if workflow.uid == uid {
            return Ok(true);
        }
        match workflow.space_id.as_ref() {
            Some(space) => Ok(self.access.can_access(uid, None, Some(space)).await?),
            None => Ok(false),
        }
    }

    async fn authorize(
        &self,
        uid: &str,
        origin_id: &OriginId,
        target_space: Option<&SpaceId>,
        origin: &ResolvedOrigin,
    ) -> Result<(), CloneError> {
        // A personal workflow is readable by its owner only; a workflow in a
        // space is covered by the origin-space membership check below.
        let personal_foreign = origin.space_id.is_none()
            && origin.owner.as_deref().is_some_and(|owner| owner != uid);
        let allowed = !personal_foreign
            && self
                .access
                .can_access(uid, target_space, origin.space_id.as_ref())
                .await?;
        if !allowed {
            tracing::warn!(uid, "clone denied");
            return Err(CloneError::PermissionDenied {
                uid: uid.to_string(),
                origin: *origin_id,
            });
        }
        Ok(())
    }
}
