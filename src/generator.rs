//! List model pipeline: level discovery, tree building, rendering.

use regex::Regex;
use tracing::info;

use crate::config::GeneratorConfig;
use crate::error::{GeneratorError, Result, Stage};
use crate::levels::{compile_pattern, discover_levels};
use crate::renderer::{self, TemplateEngine};
use crate::schema::{HierarchyLevel, ListModel, RenderedListModel};
use crate::sheet_parser::Dataset;
use crate::tree_builder::{self, ContentColumns};

/// Pipeline orchestrator. Holds only read-only configuration, so one instance
/// can serve any number of datasets.
#[derive(Debug, Clone)]
pub struct ListGenerator {
    level_pattern: Regex,
    columns: ContentColumns,
}

impl ListGenerator {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        Ok(Self {
            level_pattern: compile_pattern(&config.level_pattern)?,
            columns: config.content_columns(),
        })
    }

    pub fn levels(&self, dataset: &Dataset) -> Vec<HierarchyLevel> {
        discover_levels(&dataset.headers, &self.level_pattern)
    }

    /// Build the category and content models for a dataset.
    pub fn create(&self, dataset: &Dataset) -> Result<ListModel> {
        if dataset.headers.is_empty() {
            return Err(GeneratorError::missing(Stage::Build, "dataset"));
        }

        let levels = self.levels(dataset);
        info!(
            "Discovered {} level columns in '{}': {:?}",
            levels.len(),
            dataset.name,
            levels.iter().map(|l| l.column.as_str()).collect::<Vec<_>>()
        );

        Ok(tree_builder::build(dataset, &levels, &self.columns))
    }

    pub fn render(
        &self,
        model: &ListModel,
        engine: &dyn TemplateEngine,
        template: &str,
    ) -> Result<RenderedListModel> {
        let rendered = renderer::render(model, engine, template)?;
        info!(
            "Rendered '{}': {} path blocks, {} content blocks",
            template,
            rendered.path.len(),
            rendered.content.len()
        );
        Ok(rendered)
    }

    /// `create` followed by `render`.
    pub fn generate(
        &self,
        dataset: &Dataset,
        engine: &dyn TemplateEngine,
        template: &str,
    ) -> Result<RenderedListModel> {
        let model = self.create(dataset)?;
        self.render(&model, engine, template)
    }
}
