//! Configuration loading for botmaas.
//!
//! Reads `config.toml` from the data directory (`~/.botmaas/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use botmaas_types::config::GlobalConfig;

/// Resolve the botmaas data directory.
///
/// Priority:
/// 1. `BOTMAAS_DATA_DIR` environment variable
/// 2. `~/.botmaas`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("BOTMAAS_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".botmaas");
    }

    // Last resort: current directory
    PathBuf::from(".botmaas")
}

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`GlobalConfig::default()`].
/// - Unreadable or invalid file: logs a warning and returns the default.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => sanitize(config),
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

/// Clamp values that would stall the engine.
fn sanitize(mut config: GlobalConfig) -> GlobalConfig {
    if config.mass_copy.max_parallel_targets == 0 {
        tracing::warn!("mass_copy.max_parallel_targets = 0 is invalid, using 1");
        config.mass_copy.max_parallel_targets = 1;
    }
    if config.mass_copy.max_targets == 0 {
        tracing::warn!("mass_copy.max_targets = 0 is invalid, using 1");
        config.mass_copy.max_targets = 1;
    }
    if config.lineage.page_size == 0 {
        tracing::warn!("lineage.page_size = 0 is invalid, using 1");
        config.lineage.page_size = 1;
    }
    config
}
