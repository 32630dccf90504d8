//! Error types for loading, building and rendering list models.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Discovery,
    Build,
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Discovery => "discovery",
            Stage::Build => "build",
            Stage::Render => "render",
        };
        f.write_str(name)
    }
}

/// Failures raised by a [`TemplateEngine`](crate::renderer::TemplateEngine).
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),

    #[error("failed to parse template '{template}': {message}")]
    Parse { template: String, message: String },

    #[error("failed to render template '{template}': {message}")]
    Render { template: String, message: String },
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The source could not be turned into rows with named columns.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("missing required argument '{argument}' ({stage} stage)")]
    MissingArgument { stage: Stage, argument: &'static str },

    #[error("invalid level pattern '{pattern}': {source}")]
    LevelPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GeneratorError {
    pub fn missing(stage: Stage, argument: &'static str) -> Self {
        Self::MissingArgument { stage, argument }
    }

    /// Stage the failure surfaced in.
    pub fn stage(&self) -> Stage {
        match self {
            Self::MalformedInput(_) | Self::Io { .. } => Stage::Load,
            Self::MissingArgument { stage, .. } => *stage,
            Self::LevelPattern { .. } => Stage::Discovery,
            Self::Template(_) => Stage::Render,
        }
    }
}

pub type Result<T, E = GeneratorError> = std::result::Result<T, E>;
