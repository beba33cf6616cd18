//! Template catalog: template listing and origin resolution.

use botmaas_types::error::CloneError;
use botmaas_types::lineage::OriginId;
use botmaas_types::template::{MaasTemplate, TemplateGroup, TemplateQuery};
use botmaas_types::workflow::{SpaceId, WorkflowGraph};

use crate::repository::template::TemplateStore;
use crate::repository::workflow::WorkflowRepository;

/// Everything the duplication engine needs to know about an origin.
#[derive(Debug, Clone)]
pub struct ResolvedOrigin {
    pub origin_id: OriginId,
    pub name: String,
    pub description: String,
    pub flow_id: String,
    pub graph: WorkflowGraph,
    /// Space owning the origin; `None` for public templates and personal workflows.
    pub space_id: Option<SpaceId>,
    /// Owning user of a workflow origin; `None` for templates.
    pub owner: Option<String>,
}

/// Read-only view over templates and existing workflows.
pub struct TemplateCatalog<T: TemplateStore, W: WorkflowRepository> {
    templates: T,
    workflows: W,
}

impl<T: TemplateStore, W: WorkflowRepository> TemplateCatalog<T, W> {
    pub fn new(templates: T, workflows: W) -> Self {
        Self {
            templates,
            workflows,
        }
    }

    pub fn workflows(&self) -> &W {
        &self.workflows
    }

    /// List templates as catalog summaries.
    pub async fn template_list(&self, query: &TemplateQuery) -> Result<Vec<MaasTemplate>, CloneError> {
        if let Some(limit) = query.limit {
            if limit < 0 {
                return Err(CloneError::InvalidRequest("limit must not be negative".to_string()));
            }
        }
        if let Some(offset) = query.offset {
            if offset < 0 {
                return Err(CloneError::InvalidRequest("offset must not be negative".to_string()));
            }
        }

        let templates = self.templates.list_templates(query).await?;
        Ok(templates.iter().map(MaasTemplate::from).collect())
    }

    pub async fn groups(&self) -> Result<Vec<TemplateGroup>, CloneError> {
        Ok(self.templates.list_groups().await?)
    }

    /// Load the origin's definition.
    ///
    /// Soft-deleted templates resolve to `OriginNotFound`, the same as
    /// templates that never existed.
    pub async fn resolve_origin(&self, origin_id: &OriginId) -> Result<ResolvedOrigin, CloneError> {
        match origin_id {
            OriginId::Template(id) => {
                let template = self
                    .templates
                    .get_template(id)
                    .await?
                    .filter(|t| !t.is_deleted)
                    .ok_or(CloneError::OriginNotFound(*origin_id))?;
                Ok(ResolvedOrigin {
                    origin_id: *origin_id,
                    name: template.name,
                    description: template.description,
                    flow_id: template.flow_id,
                    graph: template.definition,
                    space_id: template.space_id,
                    owner: None,
                })
            }
            OriginId::Workflow(id) => {
                let workflow = self
                    .workflows
                    .get_workflow(id)
                    .await?
                    .ok_or(CloneError::OriginNotFound(*origin_id))?;
                Ok(ResolvedOrigin {
                    origin_id: *origin_id,
                    name: format!("{} (Clone)", workflow.name),
                    description: workflow.description,
                    flow_id: workflow.flow_id,
                    graph: workflow.graph,
                    space_id: workflow.space_id,
                    owner: Some(workflow.uid),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{MemoryTemplateStore, MemoryWorkflowRepository, sample_template, sample_workflow};
    use botmaas_types::template::TemplateId;
    use botmaas_types::workflow::WorkflowId;

    #[tokio::test]
    async fn test_resolve_template_origin() {
        let store = MemoryTemplateStore::default();
        let template = sample_template("Customer Support");
        store.insert(template.clone());
        let catalog = TemplateCatalog::new(store, MemoryWorkflowRepository::default());

        let resolved = catalog
            .resolve_origin(&OriginId::Template(template.id))
            .await
            .unwrap();
        assert_eq!(resolved.name, "Customer Support");
        assert_eq!(resolved.flow_id, template.flow_id);
        assert_eq!(resolved.graph, template.definition);
        assert!(resolved.owner.is_none());
    }

    #[tokio::test]
    async fn test_resolve_deleted_template_is_not_found() {
        let store = MemoryTemplateStore::default();
        let mut template = sample_template("Old");
        template.is_deleted = true;
        store.insert(template.clone());
        let catalog = TemplateCatalog::new(store, MemoryWorkflowRepository::default());

        let err = catalog
            .resolve_origin(&OriginId::Template(template.id))
            .await
            .unwrap_err();
        assert!(matches!(err, CloneError::OriginNotFound(_)));

        let err = catalog
            .resolve_origin(&OriginId::Template(TemplateId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, CloneError::OriginNotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_workflow_origin_appends_clone_suffix() {
        let workflows = MemoryWorkflowRepository::default();
        let workflow = sample_workflow("u1", "Sales Bot");
        workflows.insert(workflow.clone());
        let catalog = TemplateCatalog::new(MemoryTemplateStore::default(), workflows);

        let resolved = catalog
            .resolve_origin(&OriginId::Workflow(workflow.id))
            .await
            .unwrap();
        assert_eq!(resolved.name, "Sales Bot (Clone)");
        assert_eq!(resolved.owner.as_deref(), Some("u1"));

        let err = catalog
            .resolve_origin(&OriginId::Workflow(WorkflowId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, CloneError::OriginNotFound(_)));
    }

    #[tokio::test]
    async fn test_template_list_rejects_negative_paging() {
        let catalog = TemplateCatalog::new(MemoryTemplateStore::default(), MemoryWorkflowRepository::default());
        let query = TemplateQuery {
            limit: Some(-1),
            ..Default::default()
        };
        assert!(matches!(
            catalog.template_list(&query).await,
            Err(CloneError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_template_list_maps_summaries() {
        let store = MemoryTemplateStore::default();
        store.insert(sample_template("A"));
        store.insert(sample_template("B"));
        let catalog = TemplateCatalog::new(store, MemoryWorkflowRepository::default());

        let list = catalog.template_list(&TemplateQuery::default()).await.unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.iter().all(|t| t.node_count == 3));
    }
}
