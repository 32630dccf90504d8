//! Liquid-backed template store.
//!
//! Templates are loaded from a directory of `*.liquid` files (name = file stem)
//! or registered at runtime. Every render parses the source afresh.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use tracing::info;

use crate::error::{GeneratorError, Result, TemplateError};
use crate::renderer::{TemplateEngine, Variables};

const TEMPLATE_EXTENSION: &str = "liquid";

/// In-memory store of template sources, backed by `RwLock` for runtime registration.
pub struct TemplateStore {
    parser: liquid::Parser,
    templates: RwLock<HashMap<String, String>>,
}

impl std::fmt::Debug for TemplateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateStore")
            .field("templates", &self.list())
            .finish()
    }
}

impl TemplateStore {
    /// An empty store using the Liquid standard library.
    pub fn new() -> Result<Self> {
        let parser = liquid::ParserBuilder::with_stdlib().build().map_err(|e| {
            TemplateError::Parse {
                template: "<parser>".to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(Self {
            parser,
            templates: RwLock::new(HashMap::new()),
        })
    }

    /// Load every `*.liquid` file in `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let store = Self::new()?;
        let io_err = |source: std::io::Error| GeneratorError::Io {
            path: dir.to_path_buf(),
            source,
        };

        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.extension().map(|e| e == TEMPLATE_EXTENSION).unwrap_or(false) {
                let Some(name) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                    continue;
                };
                let source = std::fs::read_to_string(&path).map_err(|source| GeneratorError::Io {
                    path: path.clone(),
                    source,
                })?;
                info!("Loaded template: {} from {:?}", name, path);
                store.insert(&name, source);
            }
        }

        Ok(store)
    }

    /// Insert or replace a template.
    pub fn insert(&self, name: &str, source: impl Into<String>) {
        self.write().insert(name.to_string(), source.into());
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.read().get(name).cloned()
    }

    /// Template names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, String>> {
        self.templates.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, String>> {
        self.templates.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TemplateEngine for TemplateStore {
    fn render(&self, template: &str, variables: &Variables) -> Result<String, TemplateError> {
        let source = self
            .get(template)
            .ok_or_else(|| TemplateError::NotFound(template.to_string()))?;

        let parsed = self.parser.parse(&source).map_err(|e| TemplateError::Parse {
            template: template.to_string(),
            message: e.to_string(),
        })?;

        let globals = to_globals(template, variables)?;

        parsed.render(&globals).map_err(|e| TemplateError::Render {
            template: template.to_string(),
            message: e.to_string(),
        })
    }
}

fn to_globals(template: &str, variables: &Variables) -> Result<liquid::Object, TemplateError> {
    let mut globals = liquid::Object::new();
    for (key, value) in variables {
        let value = liquid::model::to_value(value).map_err(|e| TemplateError::Render {
            template: template.to_string(),
            message: format!("variable '{}': {}", key, e),
        })?;
        globals.insert(key.clone().into(), value);
    }
    Ok(globals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(value: serde_json::Value) -> Variables {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_render_registered_template() {
        let store = TemplateStore::new().unwrap();
        store.insert("greeting", "{{ label }} ({{ parentLevel }})");

        let out = store
            .render("greeting", &vars(json!({"label": "Volume", "parentLevel": 2})))
            .unwrap();
        assert_eq!(out, "Volume (2)");
    }

    #[test]
    fn test_nil_variables_render_empty() {
        let store = TemplateStore::new().unwrap();
        store.insert("control", "[{{ control }}]");

        let out = store.render("control", &vars(json!({"control": null}))).unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_iterates_nested_nodes() {
        let store = TemplateStore::new().unwrap();
        store.insert(
            "names",
            "{% for node in nodes %}{{ node.name }}>{{ node.children | join: '|' }};{% endfor %}",
        );

        let out = store
            .render(
                "names",
                &vars(json!({"nodes": [
                    {"name": "Media", "parent": "Features", "children": ["DAB", "AM-FM-HD Radio"]},
                    {"name": "Phone", "parent": "Features", "children": []}
                ]})),
            )
            .unwrap();
        assert_eq!(out, "Media>DAB|AM-FM-HD Radio;Phone>;");
    }

    #[test]
    fn test_globals_keep_nil_and_nested_values() {
        let globals = to_globals(
            "menu",
            &vars(json!({"control": null, "nodes": [{"name": "Media"}], "parentLevel": 4})),
        )
        .unwrap();

        assert_eq!(globals.len(), 3);
        assert!(matches!(globals.get("control"), Some(liquid::model::Value::Nil)));
        assert!(matches!(globals.get("nodes"), Some(liquid::model::Value::Array(a)) if a.len() == 1));
    }

    #[test]
    fn test_unknown_template() {
        let store = TemplateStore::new().unwrap();
        let err = store.render("missing", &Variables::new()).unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(name) if name == "missing"));
    }

    #[test]
    fn test_parse_error() {
        let store = TemplateStore::new().unwrap();
        store.insert("broken", "{% for x in %}");
        let err = store.render("broken", &Variables::new()).unwrap_err();
        assert!(matches!(err, TemplateError::Parse { .. }));
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("menu.liquid"), "Menu {{ level }}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let store = TemplateStore::load_from_dir(dir.path()).unwrap();
        assert_eq!(store.list(), vec!["menu"]);
        assert_eq!(
            store.render("menu", &vars(json!({"level": 3}))).unwrap(),
            "Menu 3"
        );
    }

    #[test]
    fn test_load_from_missing_dir() {
        let err = TemplateStore::load_from_dir(Path::new("/nonexistent/views")).unwrap_err();
        assert!(matches!(err, GeneratorError::Io { .. }));
    }
}
