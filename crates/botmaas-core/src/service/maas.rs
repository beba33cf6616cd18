//! Bot MaaS service facade.
//!
//! The single entry point used by the HTTP handlers and the CLI. Wraps the
//! duplication engine, the mass-copy synchronizer and lineage queries.

use std::sync::Arc;

use futures_util::{StreamExt, TryStreamExt};
use tokio_util::sync::CancellationToken;

use botmaas_types::config::GlobalConfig;
use botmaas_types::error::{CloneError, RepositoryError};
use botmaas_types::lineage::{CloneRecord, CloneSynchronize, OriginId};
use botmaas_types::mass_copy::{MaasDuplicate, MassCopyReport, MassCopyRequest};
use botmaas_types::template::{MaasTemplate, TemplateGroup, TemplateQuery};
use botmaas_types::workflow::{BotInfo, BotWorkflow, WorkflowId};

use crate::repository::lineage::{CloneCommitter, LineageLedger};
use crate::repository::space::SpaceAccess;
use crate::repository::template::TemplateStore;
use crate::repository::workflow::WorkflowRepository;
use crate::service::duplication::DuplicationEngine;
use crate::service::mass_copy::MassCopySynchronizer;
use crate::service::validation::validate_uid;

pub struct BotMaasService<T, W, L, A>
where
    T: TemplateStore + 'static,
    W: WorkflowRepository + 'static,
    L: LineageLedger + CloneCommitter + 'static,
    A: SpaceAccess + 'static,
{
    engine: Arc<DuplicationEngine<T, W, L, A>>,
    synchronizer: MassCopySynchronizer<T, W, L, A>,
    config: GlobalConfig,
}

impl<T, W, L, A> BotMaasService<T, W, L, A>
where
    T: TemplateStore + 'static,
    W: WorkflowRepository + 'static,
    L: LineageLedger + CloneCommitter + 'static,
    A: SpaceAccess + 'static,
{
    pub fn new(engine: DuplicationEngine<T, W, L, A>, config: GlobalConfig) -> Self {
        let engine = Arc::new(engine);
        let synchronizer = MassCopySynchronizer::new(Arc::clone(&engine), config.mass_copy.clone());
        Self {
            engine,
            synchronizer,
            config,
        }
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Clone one origin for `uid` and describe the produced bot.
    pub async fn create_from_template(&self, uid: &str, request: MaasDuplicate) -> Result<BotInfo, CloneError> {
        let (workflow, record) = self
            .engine
            .create_from_template(uid, &request.origin_id, request.space_id, request.name)
            .await?;
        Ok(bot_info(workflow, &record))
    }

    pub async fn mass_copy(
        &self,
        request: MassCopyRequest,
        token: CancellationToken,
    ) -> Result<MassCopyReport, CloneError> {
        self.synchronizer.synchronize(request, token).await
    }

    /// Record lineage for an externally produced copy. Returns the number of
    /// records written.
    pub async fn mass_copy_synchronize(&self, sync: CloneSynchronize) -> Result<usize, CloneError> {
        self.engine.record_lineage(&sync).await?;
        Ok(1)
    }

    pub async fn template_list(&self, query: &TemplateQuery) -> Result<Vec<MaasTemplate>, CloneError> {
        self.engine.catalog().template_list(query).await
    }

    pub async fn template_groups(&self) -> Result<Vec<TemplateGroup>, CloneError> {
        self.engine.catalog().groups().await
    }

    /// Load a workflow on behalf of `uid`. `PermissionDenied` when it exists
    /// but belongs to another user outside any space `uid` is a member of.
    pub async fn get_workflow(&self, uid: &str, id: &WorkflowId) -> Result<Option<BotWorkflow>, CloneError> {
        let Some(workflow) = self.engine.catalog().workflows().get_workflow(id).await? else {
            return Ok(None);
        };
        if !self.engine.can_read_workflow(uid, &workflow).await? {
            return Err(CloneError::PermissionDenied {
                uid: uid.to_string(),
                origin: OriginId::Workflow(*id),
            });
        }
        Ok(Some(workflow))
    }

    /// Workflows owned by `uid`, newest first.
    pub async fn list_workflows(&self, uid: &str) -> Result<Vec<BotWorkflow>, CloneError> {
        validate_uid(uid)?;
        Ok(self.engine.catalog().workflows().list_by_owner(uid).await?)
    }

    /// The record that produced `id`, if it was cloned.
    pub async fn ancestor(&self, id: &WorkflowId) -> Result<Option<CloneRecord>, CloneError> {
        Ok(self.engine.ledger().find_ancestor(id).await?)
    }

    /// Descendants of `origin_id` in insertion order, at most `limit` of them.
    pub async fn descendants(&self, origin_id: &OriginId, limit: Option<usize>) -> Result<Vec<CloneRecord>, CloneError> {
        let stream = self.engine.ledger().find_descendants(origin_id);
        let records: Vec<CloneRecord> = match limit {
            Some(n) => stream.take(n).try_collect::<Vec<_>>().await?,
            None => stream.try_collect::<Vec<_>>().await?,
        };
        Ok(records)
    }

    /// Flag the clone `id` as diverged from its origin. Returns `false`
    /// when `id` has no lineage record.
    pub async fn mark_diverged(&self, id: &WorkflowId) -> Result<bool, CloneError> {
        match self.engine.ledger().mark_diverged(id).await {
            Ok(()) => Ok(true),
            Err(RepositoryError::NotFound) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn bot_info(workflow: BotWorkflow, record: &CloneRecord) -> BotInfo {
    BotInfo {
        workflow_id: workflow.id,
        node_count: workflow.graph.nodes.len(),
        uid: workflow.uid,
        space_id: workflow.space_id,
        name: workflow.name,
        description: workflow.description,
        flow_id: workflow.flow_id,
        origin_id: record.origin_id,
        clone_record_id: record.id,
        created_at: workflow.created_at,
    }
}
