//! Template and request files read by the CLI.
//!
//! Files ending in `.json` are parsed as JSON; everything else as YAML.

use std::path::Path;

use chrono::Utc;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use botmaas_types::mass_copy::MassCopyRequest;
use botmaas_types::template::{TemplateId, WorkflowTemplate};
use botmaas_types::workflow::{SpaceId, WorkflowGraph, new_flow_id};

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

/// A template definition as authored on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateFile {
    /// Present when re-importing an existing template.
    #[serde(default)]
    pub id: Option<TemplateId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub group_id: i64,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub space_id: Option<SpaceId>,
    #[serde(default)]
    pub cover_url: Option<String>,
    pub definition: WorkflowGraph,
}

impl TemplateFile {
    /// Build the template to store.
    ///
    /// When `existing` is given the id, flow id and creation time are kept
    /// and the version is bumped unless the file sets one explicitly.
    pub fn into_template(self, existing: Option<&WorkflowTemplate>) -> WorkflowTemplate {
        let now = Utc::now();
        let version = match (self.version, existing) {
            (Some(v), _) => v,
            (None, Some(prev)) => bump_version(&prev.version),
            (None, None) => "1.0".to_string(),
        };

        WorkflowTemplate {
            id: existing
                .map(|t| t.id)
                .or(self.id)
                .unwrap_or_default(),
            name: self.name,
            description: self.description,
            group_id: self.group_id,
            version,
            flow_id: existing
                .map(|t| t.flow_id.clone())
                .unwrap_or_else(new_flow_id),
            definition: self.definition,
            space_id: self.space_id,
            cover_url: self.cover_url,
            is_deleted: false,
            created_at: existing.map(|t| t.created_at).unwrap_or(now),
            updated_at: now,
        }
    }
}

/// `"1.4"` -> `"1.5"`. Versions that do not end in a number get `".1"` appended.
fn bump_version(version: &str) -> String {
    match version.rsplit_once('.') {
        Some((head, tail)) => match tail.parse::<u64>() {
            Ok(n) => format!("{head}.{}", n + 1),
            Err(_) => format!("{version}.1"),
        },
        None => match version.parse::<u64>() {
            Ok(n) => (n + 1).to_string(),
            Err(_) => format!("{version}.1"),
        },
    }
}

async fn read_structured<T: DeserializeOwned>(path: &Path) -> Result<T, BundleError> {
    let display = path.display().to_string();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| BundleError::Io {
            path: display.clone(),
            source,
        })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let parsed = if is_json {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    } else {
        serde_yaml_ng::from_str(&content).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| BundleError::Parse {
        path: display,
        message,
    })
}

pub async fn load_template_file(path: &Path) -> Result<TemplateFile, BundleError> {
    read_structured(path).await
}

pub async fn load_mass_copy_request(path: &Path) -> Result<MassCopyRequest, BundleError> {
    read_structured(path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TEMPLATE_YAML: &str = r#"
name: Customer Support
description: Answers product questions
group_id: 2
definition:
  nodes:
    - id: start
      type: start
      data: {}
    - id: llm
      type: llm
      data:
        input: start
  edges:
    - id: e1
      source: start
      target: llm
"#;

    #[tokio::test]
    async fn test_load_template_yaml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("support.yaml");
        tokio::fs::write(&path, TEMPLATE_YAML).await.unwrap();

        let file = load_template_file(&path).await.unwrap();
        assert_eq!(file.name, "Customer Support");
        assert_eq!(file.group_id, 2);
        assert_eq!(file.definition.nodes.len(), 2);
        assert_eq!(file.definition.nodes[1].node_type, "llm");

        let template = file.into_template(None);
        assert_eq!(template.version, "1.0");
        assert!(!template.is_deleted);
    }

    #[tokio::test]
    async fn test_reimport_keeps_identity_and_bumps_version() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("support.yml");
        tokio::fs::write(&path, TEMPLATE_YAML).await.unwrap();

        let first = load_template_file(&path).await.unwrap().into_template(None);
        let second = load_template_file(&path).await.unwrap().into_template(Some(&first));

        assert_eq!(second.id, first.id);
        assert_eq!(second.flow_id, first.flow_id);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.version, "1.1");
    }

    #[tokio::test]
    async fn test_load_mass_copy_request_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("batch.json");
        let origin = TemplateId::new();
        let body = serde_json::json!({
            "origin_id": format!("template:{origin}"),
            "targets": [{"uid": "u1"}, {"uid": "u2", "name": "Copy"}],
        });
        tokio::fs::write(&path, body.to_string()).await.unwrap();

        let request = load_mass_copy_request(&path).await.unwrap();
        assert_eq!(request.targets.len(), 2);
        assert_eq!(request.targets[1].name.as_deref(), Some("Copy"));
    }

    #[tokio::test]
    async fn test_parse_error_names_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let err = load_mass_copy_request(&path).await.unwrap_err();
        assert!(matches!(err, BundleError::Parse { .. }));
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn test_bump_version() {
        assert_eq!(bump_version("1.0"), "1.1");
        assert_eq!(bump_version("2.9"), "2.10");
        assert_eq!(bump_version("3"), "4");
        assert_eq!(bump_version("beta"), "beta.1");
    }
}
