//! Template store trait definition.

use botmaas_types::error::RepositoryError;
use botmaas_types::template::{TemplateGroup, TemplateId, TemplateQuery, WorkflowTemplate};

/// Read side of the template store.
///
/// Templates are authored elsewhere; the clone engine only reads them, so
/// no coordination is needed between concurrent readers.
pub trait TemplateStore: Send + Sync {
    /// Get a template by id, including soft-deleted ones.
    fn get_template(
        &self,
        id: &TemplateId,
    ) -> impl std::future::Future<Output = Result<Option<WorkflowTemplate>, RepositoryError>> + Send;

    /// List templates matching the query.
    fn list_templates(
        &self,
        query: &TemplateQuery,
    ) -> impl std::future::Future<Output = Result<Vec<WorkflowTemplate>, RepositoryError>> + Send;

    /// List non-deleted template groups ordered by sort order.
    fn list_groups(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<TemplateGroup>, RepositoryError>> + Send;
}
