//! Renders a [`ListModel`] to text through a [`TemplateEngine`].
//!
//! Path output is rendered once per level (the whole node collection goes to
//! the template); content output is rendered once per leaf.

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::{GeneratorError, Result, Stage, TemplateError};
use crate::schema::{CategoryLevel, CategoryNode, ContentLeaf, ListModel, RenderedListModel};

/// Variables handed to a template.
pub type Variables = Map<String, Value>;

/// Renders a named template against a set of variables.
pub trait TemplateEngine {
    fn render(&self, template: &str, variables: &Variables) -> Result<String, TemplateError>;
}

/// Render every level and every content leaf with `template`.
pub fn render(
    model: &ListModel,
    engine: &dyn TemplateEngine,
    template: &str,
) -> Result<RenderedListModel> {
    if template.trim().is_empty() {
        return Err(GeneratorError::missing(Stage::Render, "template"));
    }

    let path = model
        .categories
        .iter()
        .map(|level| {
            debug!("Rendering level {} with '{}'", level.level, template);
            engine.render(template, &path_variables(level))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let content = model
        .content
        .iter()
        .map(|leaf| engine.render(template, &content_variables(leaf)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RenderedListModel { path, content })
}

fn node_value(node: &CategoryNode) -> Value {
    json!({
        "name": node.name,
        "parent": node.parent,
        "children": node.children,
    })
}

/// `nodes` carries the whole level; `name`/`parent`/`children` mirror the first node.
pub fn path_variables(level: &CategoryLevel) -> Variables {
    let first = level.nodes.first();
    let mut vars = Variables::new();
    vars.insert("kind".into(), json!("path"));
    vars.insert("level".into(), json!(level.level));
    vars.insert("column".into(), json!(level.column));
    vars.insert(
        "nodes".into(),
        Value::Array(level.nodes.iter().map(node_value).collect()),
    );
    vars.insert("name".into(), json!(first.map(|n| &n.name)));
    vars.insert("parent".into(), json!(first.and_then(|n| n.parent.as_ref())));
    vars.insert(
        "children".into(),
        json!(first.map(|n| n.children.clone()).unwrap_or_default()),
    );
    vars
}

pub fn content_variables(leaf: &ContentLeaf) -> Variables {
    let mut vars = Variables::new();
    vars.insert("kind".into(), json!("content"));
    vars.insert("parentLabel".into(), json!(leaf.parent_label));
    vars.insert("parentLevel".into(), json!(leaf.parent_level));
    vars.insert("control".into(), json!(leaf.control));
    vars.insert("label".into(), json!(leaf.label));
    vars.insert("values".into(), json!(leaf.values));
    vars
}
