use crate::core::{EditError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How [`EditableSet::commit_changes`](crate::EditableSet::commit_changes)
/// behaves when one entity fails to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// Apply entity by entity. A failure stops the commit and entities that
    /// were already applied stay applied.
    #[default]
    Sequential,
    /// Validate every pending value in the set first and apply nothing if any
    /// value is rejected.
    ValidateFirst,
}

/// Editing behaviour shared by a set and every wrapper it creates
///
/// Similar in shape to a connection config: plain fields, builder-style
/// setters and a `Default` matching the documented behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditConfig {
    /// Commit strategy across entities
    pub commit_mode: CommitMode,

    /// Tolerance used when comparing float values against the original
    pub float_tolerance: f64,

    /// Notify every known property after commit/undo instead of only the
    /// properties that had pending values
    pub notify_all_on_commit: bool,

    /// Label attached to tracing spans
    pub set_name: String,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            commit_mode: CommitMode::Sequential,
            float_tolerance: f64::EPSILON,
            notify_all_on_commit: true,
            set_name: "editable_set".to_string(),
        }
    }
}

impl EditConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit_mode(mut self, mode: CommitMode) -> Self {
        self.commit_mode = mode;
        self
    }

    pub fn float_tolerance(mut self, tolerance: f64) -> Self {
        self.float_tolerance = tolerance;
        self
    }

    pub fn notify_all_on_commit(mut self, enabled: bool) -> Self {
        self.notify_all_on_commit = enabled;
        self
    }

    pub fn set_name(mut self, name: &str) -> Self {
        self.set_name = name.to_string();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.float_tolerance.is_finite() || self.float_tolerance < 0.0 {
            return Err(EditError::Config(format!(
                "float_tolerance must be a finite non-negative number, got {}",
                self.float_tolerance
            )));
        }
        if self.set_name.trim().is_empty() {
            return Err(EditError::Config("set_name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Parse from a JSON document. Missing fields take their defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use editable_collections::{CommitMode, EditConfig};
    ///
    /// let config = EditConfig::from_json_str(r#"{ "commit_mode": "validate_first" }"#).unwrap();
    /// assert_eq!(config.commit_mode, CommitMode::ValidateFirst);
    /// assert!(config.notify_all_on_commit);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| EditError::Config(format!("invalid config JSON: {}", err)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|err| {
            EditError::Config(format!("cannot read '{}': {}", path.display(), err))
        })?;
        Self::from_json_str(&contents)
    }
}
