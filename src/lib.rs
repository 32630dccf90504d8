//! List Generator - turns a spreadsheet export of a nested settings menu into
//! templated list models (one per hierarchy level, one per content row).

pub mod config;
pub mod error;
pub mod generator;
pub mod levels;
pub mod renderer;
pub mod schema;
pub mod sheet_parser;
pub mod templates;
pub mod tree_builder;

pub use config::GeneratorConfig;
pub use error::{GeneratorError, Stage, TemplateError};
pub use generator::ListGenerator;
pub use renderer::TemplateEngine;
pub use schema::{CategoryLevel, CategoryNode, ContentLeaf, HierarchyLevel, ListModel, RenderedListModel};
pub use sheet_parser::Dataset;
pub use templates::TemplateStore;
