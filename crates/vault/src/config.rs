//! Vault configuration
//!
//! The owner set and threshold are deployment parameters, read from a JSON
//! file once and never changed by the vault afterwards.

use cosign_core::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::error::VaultError;
use crate::owners::OwnerRegistry;

/// Errors loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid vault setup: {0}")]
    Setup(#[from] VaultError),
}

/// Deployment parameters for one vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Human-readable label, used in logs
    #[serde(default = "default_name")]
    pub name: String,

    /// Approvers, in the order they are reported
    pub owners: Vec<Address>,

    /// Confirmations needed before a transaction may execute
    pub required_confirmations: usize,
}

fn default_name() -> String {
    "vault".to_string()
}

impl VaultConfig {
    pub fn new(owners: Vec<Address>, required_confirmations: usize) -> Self {
        Self {
            name: default_name(),
            owners,
            required_confirmations,
        }
    }

    /// Set the label
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Load configuration from a JSON file and validate it
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write configuration as pretty JSON
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Run the construction checks without building a vault
    pub fn validate(&self) -> Result<(), VaultError> {
        self.registry().map(|_| ())
    }

    pub(crate) fn registry(&self) -> Result<OwnerRegistry, VaultError> {
        OwnerRegistry::new(self.owners.clone(), self.required_confirmations)
    }
}
