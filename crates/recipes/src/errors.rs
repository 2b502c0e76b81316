use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("unknown intent '{0}'")]
    UnknownIntent(String),

    #[error("intent '{0}' has no candidates")]
    EmptyRecipe(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid intent file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

impl RecipeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_retryable(&self) -> bool {
        false
    }

    pub fn severity(&self) -> u8 {
        match self {
            RecipeError::UnknownIntent(_) | RecipeError::EmptyRecipe(_) => 6,
            RecipeError::Io { .. } | RecipeError::Parse(_) => 7,
        }
    }
}
