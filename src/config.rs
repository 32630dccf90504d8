//! Generator configuration.
//!
//! Loaded from a JSON file when one is given, then overridden by
//! `LIST_GENERATOR_*` environment variables. Every field has a default so an
//! empty `{}` file (or no file at all) is a valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{GeneratorError, Result};
use crate::levels::DEFAULT_LEVEL_PATTERN;
use crate::tree_builder::ContentColumns;

const ENV_PREFIX: &str = "LIST_GENERATOR_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Regex selecting hierarchy level columns.
    pub level_pattern: String,
    pub id_column: String,
    pub label_column: String,
    pub control_column: String,
    pub values_column: String,
    /// Directory of `*.liquid` templates.
    pub template_dir: PathBuf,
    pub default_template: String,
    pub bind_addr: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let columns = ContentColumns::default();
        Self {
            level_pattern: DEFAULT_LEVEL_PATTERN.to_string(),
            id_column: columns.id,
            label_column: columns.label,
            control_column: columns.control,
            values_column: columns.values,
            template_dir: PathBuf::from("views"),
            default_template: "settings_list_model".to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Parse a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| GeneratorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            GeneratorError::MalformedInput(format!("Failed to parse config {:?}: {}", path, e))
        })?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Defaults (or `LIST_GENERATOR_CONFIG` when set) with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        let base = match std::env::var(format!("{}CONFIG", ENV_PREFIX)) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        Ok(base.with_overrides(|key| std::env::var(format!("{}{}", ENV_PREFIX, key)).ok()))
    }

    /// Apply overrides looked up by upper-case field name.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let fields: [(&str, &mut String); 7] = [
            ("LEVEL_PATTERN", &mut self.level_pattern),
            ("ID_COLUMN", &mut self.id_column),
            ("LABEL_COLUMN", &mut self.label_column),
            ("CONTROL_COLUMN", &mut self.control_column),
            ("VALUES_COLUMN", &mut self.values_column),
            ("DEFAULT_TEMPLATE", &mut self.default_template),
            ("BIND_ADDR", &mut self.bind_addr),
        ];
        for (key, field) in fields {
            if let Some(value) = lookup(key) {
                *field = value;
            }
        }
        if let Some(dir) = lookup("TEMPLATE_DIR") {
            self.template_dir = PathBuf::from(dir);
        }
        self
    }

    pub fn content_columns(&self) -> ContentColumns {
        ContentColumns {
            id: self.id_column.clone(),
            label: self.label_column.clone(),
            control: self.control_column.clone(),
            values: self.values_column.clone(),
        }
    }
}
