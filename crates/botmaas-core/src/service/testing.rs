//! In-memory port implementations shared by the service tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::json;
use tokio::sync::{Notify, Semaphore};

use botmaas_types::error::RepositoryError;
use botmaas_types::lineage::{CloneRecord, OriginId, SyncState};
use botmaas_types::template::{TemplateGroup, TemplateId, TemplateQuery, WorkflowTemplate};
use botmaas_types::workflow::{
    BotWorkflow, SpaceId, WorkflowEdge, WorkflowGraph, WorkflowId, WorkflowNode, new_flow_id,
};

use crate::repository::lineage::{CloneCommitter, CloneRecordStream, LineageLedger};
use crate::repository::space::SpaceAccess;
use crate::repository::template::TemplateStore;
use crate::repository::workflow::WorkflowRepository;
use crate::service::catalog::TemplateCatalog;
use crate::service::duplication::DuplicationEngine;

pub type TestEngine =
    DuplicationEngine<MemoryTemplateStore, MemoryWorkflowRepository, MemoryLineageLedger, MemorySpaceAccess>;

/// Build an engine over fresh in-memory stores. The returned handles share
/// state with the engine.
pub fn test_engine() -> (
    TestEngine,
    MemoryTemplateStore,
    MemoryWorkflowRepository,
    MemoryLineageLedger,
    MemorySpaceAccess,
) {
    let templates = MemoryTemplateStore::default();
    let workflows = MemoryWorkflowRepository::default();
    let ledger = MemoryLineageLedger::new(workflows.clone());
    let access = MemorySpaceAccess::default();
    let engine = DuplicationEngine::new(
        TemplateCatalog::new(templates.clone(), workflows.clone()),
        ledger.clone(),
        access.clone(),
    );
    (engine, templates, workflows, ledger, access)
}

pub fn sample_graph() -> WorkflowGraph {
    let node = |id: &str, node_type: &str, data| WorkflowNode {
        id: id.to_string(),
        node_type: node_type.to_string(),
        data,
    };
    let edge = |id: &str, source: &str, target: &str| WorkflowEdge {
        id: id.to_string(),
        source: source.to_string(),
        target: target.to_string(),
        source_handle: None,
        target_handle: None,
    };
    WorkflowGraph {
        nodes: vec![
            node("start", "start", json!({"outputs": ["query"]})),
            node("llm", "llm", json!({"ref": "start", "model": "spark"})),
            node("end", "end", json!({"source": "llm"})),
        ],
        edges: vec![edge("e1", "start", "llm"), edge("e2", "llm", "end")],
    }
}

pub fn sample_template(name: &str) -> WorkflowTemplate {
    let now = Utc::now();
    WorkflowTemplate {
        id: TemplateId::new(),
        name: name.to_string(),
        description: format!("{name} template"),
        group_id: 1,
        version: "1.0".to_string(),
        flow_id: new_flow_id(),
        definition: sample_graph(),
        space_id: None,
        cover_url: None,
        is_deleted: false,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_workflow(uid: &str, name: &str) -> BotWorkflow {
    let now = Utc::now();
    BotWorkflow {
        id: WorkflowId::new(),
        uid: uid.to_string(),
        space_id: None,
        name: name.to_string(),
        description: String::new(),
        flow_id: new_flow_id(),
        graph: sample_graph(),
        created_at: now,
        updated_at: now,
    }
}

#[derive(Clone, Default)]
pub struct MemoryTemplateStore {
    templates: Arc<Mutex<HashMap<TemplateId, WorkflowTemplate>>>,
    groups: Arc<Mutex<Vec<TemplateGroup>>>,
}

impl MemoryTemplateStore {
    pub fn insert(&self, template: WorkflowTemplate) {
        self.templates.lock().unwrap().insert(template.id, template);
    }

    pub fn insert_group(&self, group: TemplateGroup) {
        self.groups.lock().unwrap().push(group);
    }
}

impl TemplateStore for MemoryTemplateStore {
    async fn get_template(&self, id: &TemplateId) -> Result<Option<WorkflowTemplate>, RepositoryError> {
        Ok(self.templates.lock().unwrap().get(id).cloned())
    }

    async fn list_templates(&self, query: &TemplateQuery) -> Result<Vec<WorkflowTemplate>, RepositoryError> {
        let mut list: Vec<_> = self
            .templates
            .lock()
            .unwrap()
            .values()
            .filter(|t| query.include_deleted || !t.is_deleted)
            .filter(|t| query.group_id.is_none_or(|g| g == t.group_id))
            .cloned()
            .collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(list)
    }

    async fn list_groups(&self) -> Result<Vec<TemplateGroup>, RepositoryError> {
        let mut groups: Vec<_> = self
            .groups
            .lock()
            .unwrap()
            .iter()
            .filter(|g| !g.is_deleted)
            .cloned()
            .collect();
        groups.sort_by_key(|g| g.sort_order);
        Ok(groups)
    }
}

#[derive(Clone, Default)]
pub struct MemoryWorkflowRepository {
    workflows: Arc<Mutex<HashMap<WorkflowId, BotWorkflow>>>,
}

impl MemoryWorkflowRepository {
    pub fn insert(&self, workflow: BotWorkflow) {
        self.workflows.lock().unwrap().insert(workflow.id, workflow);
    }
}

impl WorkflowRepository for MemoryWorkflowRepository {
    async fn create_workflow(&self, workflow: &BotWorkflow) -> Result<WorkflowId, RepositoryError> {
        let mut map = self.workflows.lock().unwrap();
        if map.contains_key(&workflow.id) {
            return Err(RepositoryError::Conflict(workflow.id.to_string()));
        }
        map.insert(workflow.id, workflow.clone());
        Ok(workflow.id)
    }

    async fn get_workflow(&self, id: &WorkflowId) -> Result<Option<BotWorkflow>, RepositoryError> {
        Ok(self.workflows.lock().unwrap().get(id).cloned())
    }

    async fn update_graph(&self, id: &WorkflowId, graph: &WorkflowGraph) -> Result<(), RepositoryError> {
        let mut map = self.workflows.lock().unwrap();
        let workflow = map.get_mut(id).ok_or(RepositoryError::NotFound)?;
        workflow.graph = graph.clone();
        workflow.updated_at = Utc::now();
        Ok(())
    }

    async fn list_by_owner(&self, uid: &str) -> Result<Vec<BotWorkflow>, RepositoryError> {
        Ok(self
            .workflows
            .lock()
            .unwrap()
            .values()
            .filter(|w| w.uid == uid)
            .cloned()
            .collect())
    }
}

/// Holds a commit open until the test releases it.
#[derive(Clone)]
pub struct CommitGate {
    pub entered: Arc<Notify>,
    pub release: Arc<Semaphore>,
}

impl CommitGate {
    pub fn new() -> Self {
        Self {
            entered: Arc::new(Notify::new()),
            release: Arc::new(Semaphore::new(0)),
        }
    }
}

#[derive(Clone)]
pub struct MemoryLineageLedger {
    records: Arc<Mutex<Vec<CloneRecord>>>,
    workflows: MemoryWorkflowRepository,
    fail_uids: Arc<Mutex<HashSet<String>>>,
    gate: Option<CommitGate>,
}

impl MemoryLineageLedger {
    pub fn new(workflows: MemoryWorkflowRepository) -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            workflows,
            fail_uids: Arc::new(Mutex::new(HashSet::new())),
            gate: None,
        }
    }

    pub fn with_gate(mut self, gate: CommitGate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Make every commit for `uid` fail with a storage error.
    pub fn fail_for(&self, uid: &str) {
        self.fail_uids.lock().unwrap().insert(uid.to_string());
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    fn insert_record(&self, record: &CloneRecord) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().unwrap();
        if records.iter().any(|r| r.current_id == record.current_id) {
            return Err(RepositoryError::Conflict(format!(
                "clone record for {} already exists",
                record.current_id
            )));
        }
        records.push(record.clone());
        Ok(())
    }
}

impl LineageLedger for MemoryLineageLedger {
    async fn record_clone(&self, record: &CloneRecord) -> Result<CloneRecord, RepositoryError> {
        self.insert_record(record)?;
        Ok(record.clone())
    }

    async fn find_ancestor(&self, current_id: &WorkflowId) -> Result<Option<CloneRecord>, RepositoryError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| &r.current_id == current_id)
            .cloned())
    }

    fn find_descendants(&self, origin_id: &OriginId) -> CloneRecordStream {
        let matching: Vec<_> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| &r.origin_id == origin_id)
            .cloned()
            .collect();
        Box::pin(futures_util::stream::iter(matching.into_iter().map(Ok)))
    }

    async fn find_clone_for(
        &self,
        uid: &str,
        origin_id: &OriginId,
        space_id: Option<&SpaceId>,
    ) -> Result<Option<CloneRecord>, RepositoryError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.uid == uid && &r.origin_id == origin_id && r.space_id.as_ref() == space_id)
            .cloned())
    }

    async fn mark_diverged(&self, current_id: &WorkflowId) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| &r.current_id == current_id)
            .ok_or(RepositoryError::NotFound)?;
        record.sync_state = SyncState::Diverged;
        Ok(())
    }
}

impl CloneCommitter for MemoryLineageLedger {
    async fn commit_clone(&self, workflow: &BotWorkflow, record: &CloneRecord) -> Result<(), RepositoryError> {
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            if let Ok(permit) = gate.release.acquire().await {
                permit.forget();
            }
        }
        if self.fail_uids.lock().unwrap().contains(&workflow.uid) {
            return Err(RepositoryError::Query("injected failure".to_string()));
        }
        self.insert_record(record)?;
        self.workflows.insert(workflow.clone());
        Ok(())
    }
}

/// Grants everything except uids on the deny list.
#[derive(Clone, Default)]
pub struct MemorySpaceAccess {
    denied: Arc<Mutex<HashSet<String>>>,
}

impl MemorySpaceAccess {
    pub fn deny(&self, uid: &str) {
        self.denied.lock().unwrap().insert(uid.to_string());
    }
}

impl SpaceAccess for MemorySpaceAccess {
    async fn can_access(
        &self,
        uid: &str,
        _target_space: Option<&SpaceId>,
        _origin_space: Option<&SpaceId>,
    ) -> Result<bool, RepositoryError> {
        Ok(!self.denied.lock().unwrap().contains(uid))
    }
}
