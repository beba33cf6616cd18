//! Request validation, run before any request reaches the clone engine.

use botmaas_types::error::CloneError;
use botmaas_types::lineage::CloneSynchronize;
use botmaas_types::mass_copy::MassCopyRequest;

/// Longest accepted user id.
pub const MAX_UID_LEN: usize = 128;

/// Longest accepted workflow name.
pub const MAX_NAME_LEN: usize = 120;

/// A uid must be non-empty, at most `MAX_UID_LEN` bytes, and free of
/// whitespace and control characters.
pub fn validate_uid(uid: &str) -> Result<(), CloneError> {
    if uid.is_empty() {
        return Err(CloneError::InvalidRequest("uid must not be empty".to_string()));
    }
    if uid.len() > MAX_UID_LEN {
        return Err(CloneError::InvalidRequest(format!(
            "uid exceeds {MAX_UID_LEN} characters"
        )));
    }
    if uid.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(CloneError::InvalidRequest(format!(
            "uid '{uid}' contains whitespace or control characters"
        )));
    }
    Ok(())
}

/// Trim and check an override name. Returns the trimmed name.
pub fn validate_name(name: &str) -> Result<String, CloneError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CloneError::InvalidRequest("name must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(CloneError::InvalidRequest(format!(
            "name exceeds {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Check the batch shape: at least one target, at most `max_targets`, and
/// every target uid and override name valid.
///
/// Duplicate targets are allowed; each one produces its own clone.
pub fn validate_mass_copy(request: &MassCopyRequest, max_targets: usize) -> Result<(), CloneError> {
    if request.targets.is_empty() {
        return Err(CloneError::InvalidRequest(
            "mass copy needs at least one target".to_string(),
        ));
    }
    if request.targets.len() > max_targets {
        return Err(CloneError::InvalidRequest(format!(
            "mass copy has {} targets, limit is {max_targets}",
            request.targets.len()
        )));
    }
    for (index, target) in request.targets.iter().enumerate() {
        validate_uid(&target.uid)
            .map_err(|e| CloneError::InvalidRequest(format!("target {index}: {e}")))?;
        if let Some(name) = &target.name {
            validate_name(name)
                .map_err(|e| CloneError::InvalidRequest(format!("target {index}: {e}")))?;
        }
    }
    Ok(())
}

/// Check a lineage synchronization record.
pub fn validate_clone_synchronize(sync: &CloneSynchronize) -> Result<(), CloneError> {
    validate_uid(&sync.uid)?;
    if sync.flow_id.trim().is_empty() {
        return Err(CloneError::InvalidRequest("flow_id must not be empty".to_string()));
    }
    if let botmaas_types::lineage::OriginId::Workflow(origin) = sync.origin_id {
        if origin == sync.current_id {
            return Err(CloneError::InvalidRequest(
                "a workflow cannot be its own origin".to_string(),
            ));
        }
    }
    Ok(())
}
