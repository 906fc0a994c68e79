//! Timer definition loading
//!
//! Load timer definitions from a TOML file or a directory tree of TOML
//! files. Definitions are validated on load so a bad `rate_secs` surfaces
//! as a loading error instead of a silently-cleared timer at registration.

use std::fs;
use std::path::Path;

use super::definition::{TimerConfig, TimerDefinition};
use super::error::DefinitionError;

/// Load and validate timer definitions from a single TOML file
pub fn load_definitions_from_file(path: &Path) -> Result<Vec<TimerDefinition>, DefinitionError> {
    let content = fs::read_to_string(path).map_err(|e| DefinitionError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: TimerConfig = toml::from_str(&content).map_err(|e| DefinitionError::ParseToml {
        path: path.to_path_buf(),
        source: e,
    })?;

    for definition in &config.timers {
        validate_definition(path, definition)?;
    }

    tracing::debug!(
        path = %path.display(),
        count = config.timers.len(),
        "loaded timer definitions"
    );
    Ok(config.timers)
}

/// Load definitions from every `.toml` file under `dir`, recursively.
/// A missing directory yields an empty set.
pub fn load_definitions_from_dir(dir: &Path) -> Result<Vec<TimerDefinition>, DefinitionError> {
    let mut definitions = Vec::new();
    if !dir.exists() {
        return Ok(definitions);
    }
    load_dir_recursive(dir, &mut definitions)?;
    Ok(definitions)
}

fn load_dir_recursive(
    dir: &Path,
    definitions: &mut Vec<TimerDefinition>,
) -> Result<(), DefinitionError> {
    let entries = fs::read_dir(dir).map_err(|e| DefinitionError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            load_dir_recursive(&path, definitions)?;
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            definitions.extend(load_definitions_from_file(&path)?);
        }
    }
    Ok(())
}

fn validate_definition(path: &Path, definition: &TimerDefinition) -> Result<(), DefinitionError> {
    if definition.id.is_empty() {
        return Err(DefinitionError::InvalidDefinition {
            path: path.to_path_buf(),
            id: definition.id.clone(),
            reason: "id must not be empty".to_string(),
        });
    }
    if !(definition.rate_secs > 0.0) {
        return Err(DefinitionError::InvalidDefinition {
            path: path.to_path_buf(),
            id: definition.id.clone(),
            reason: format!("rate_secs must be positive, got {}", definition.rate_secs),
        });
    }
    if definition.first_delay_secs.is_some_and(|delay| delay < 0.0) {
        return Err(DefinitionError::InvalidDefinition {
            path: path.to_path_buf(),
            id: definition.id.clone(),
            reason: "first_delay_secs must not be negative".to_string(),
        });
    }
    Ok(())
}
