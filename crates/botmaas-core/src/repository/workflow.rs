//! Workflow persistence trait definition.

use botmaas_types::error::RepositoryError;
use botmaas_types::workflow::{BotWorkflow, WorkflowGraph, WorkflowId};

/// Repository trait for produced workflow instances.
///
/// Clones are written through `CloneCommitter::commit_clone` so that the
/// workflow and its lineage land together; `create_workflow` is for
/// workflows that have no lineage.
pub trait WorkflowRepository: Send + Sync {
    /// Persist a new workflow. Returns its id.
    fn create_workflow(
        &self,
        workflow: &BotWorkflow,
    ) -> impl std::future::Future<Output = Result<WorkflowId, RepositoryError>> + Send;

    fn get_workflow(
        &self,
        id: &WorkflowId,
    ) -> impl std::future::Future<Output = Result<Option<BotWorkflow>, RepositoryError>> + Send;

    /// Replace a workflow's graph. `NotFound` if the workflow does not exist.
    fn update_graph(
        &self,
        id: &WorkflowId,
        graph: &WorkflowGraph,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// List workflows owned by a user, newest first.
    fn list_by_owner(
        &self,
        uid: &str,
    ) -> impl std::future::Future<Output = Result<Vec<BotWorkflow>, RepositoryError>> + Send;
}
