use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use busflow_recipes::IntentTable;

use crate::config::Config;

pub struct CliContext {
    config: Arc<Config>,
    config_path: Option<PathBuf>,
}

impl CliContext {
    pub fn new(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
        }
    }

    pub fn config(&self) -> &Config {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Built-in recipes, the configured override file on top, rebased onto
    /// the configured locator defaults.
    pub fn intents(&self) -> Result<IntentTable> {
        let mut table = match &self.config.intents_path {
            Some(path) => IntentTable::load(path)
                .with_context(|| format!("Failed to load intents from {}", path.display()))?,
            None => IntentTable::builtin(),
        };
        table.rebase(&self.config.locator.options());
        Ok(table)
    }
}
