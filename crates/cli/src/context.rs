//! Application context - wires config, stored state, journal and vault

use anyhow::{bail, Context};
use cosign_core::{Address, Amount};
use cosign_events::{EventReader, JournalSink, VaultEvent};
use cosign_vault::{Treasury, TreasurySnapshot, Vault, VaultConfig, VaultSnapshot};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const CONFIG_FILE: &str = "vault.json";
const STATE_FILE: &str = "state.json";
const JOURNAL_DIR: &str = "journal";

/// Everything persisted between runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredState {
    pub vault: VaultSnapshot,
    #[serde(default)]
    pub treasury: TreasurySnapshot,
}

/// Application context - one vault living under a data directory
///
/// ```text
/// <data>/vault.json     deployment config (owners, threshold)
/// <data>/state.json     vault + treasury snapshot, rewritten after each mutation
/// <data>/journal/*.jsonl audit events, append-only
/// ```
///
/// Deposits are saved before they are journaled. Vault operations journal
/// their event as they commit, so a failed `save()` after submit, confirm,
/// revoke or execute leaves a journal line that `state.json` does not
/// reflect. The journal is an audit trail and is never replayed.
#[derive(Debug)]
pub struct AppContext {
    pub vault: Vault,
    pub treasury: Arc<Treasury>,
    state_path: PathBuf,
    journal_path: PathBuf,
}

impl AppContext {
    /// Create a new vault under `data_path`. Fails if one already exists.
    pub fn init(data_path: impl AsRef<Path>, config: &VaultConfig) -> Result<Self, anyhow::Error> {
        let data_path = data_path.as_ref();
        let config_path = data_path.join(CONFIG_FILE);
        if config_path.exists() {
            bail!("Vault already initialized at {}", data_path.display());
        }

        // Validate before anything touches the disk
        config.validate()?;

        std::fs::create_dir_all(data_path)?;
        config.to_file(&config_path)?;

        let state = StoredState {
            vault: VaultSnapshot::empty(config),
            treasury: TreasurySnapshot::default(),
        };
        let ctx = Self::assemble(data_path, config, state)?;
        ctx.save()?;

        tracing::info!(
            vault = %config.name,
            path = %data_path.display(),
            "Vault initialized"
        );
        Ok(ctx)
    }

    /// Open an existing vault
    pub fn open(data_path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let data_path = data_path.as_ref();
        let config_path = data_path.join(CONFIG_FILE);
        if !config_path.exists() {
            bail!(
                "No vault at {} (run `cosign init` first)",
                data_path.display()
            );
        }

        let config = VaultConfig::from_file(&config_path)
            .with_context(|| format!("loading {}", config_path.display()))?;

        let state_path = data_path.join(STATE_FILE);
        let state = if state_path.exists() {
            let content = std::fs::read_to_string(&state_path)?;
            serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", state_path.display()))?
        } else {
            StoredState {
                vault: VaultSnapshot::empty(&config),
                treasury: TreasurySnapshot::default(),
            }
        };

        if state.vault.config() != config {
            bail!(
                "{} does not match {}",
                state_path.display(),
                config_path.display()
            );
        }

        Self::assemble(data_path, &config, state)
    }

    fn assemble(
        data_path: &Path,
        config: &VaultConfig,
        state: StoredState,
    ) -> Result<Self, anyhow::Error> {
        let journal_path = data_path.join(JOURNAL_DIR);
        let events = Arc::new(JournalSink::open(&journal_path)?);
        let treasury = Arc::new(Treasury::restore(state.treasury));

        let vault = Vault::restore(state.vault, treasury.clone(), events)
            .with_context(|| format!("restoring vault '{}'", config.name))?;

        Ok(Self {
            vault,
            treasury,
            state_path: data_path.join(STATE_FILE),
            journal_path,
        })
    }

    /// Credit funds to the treasury, persist, then journal the deposit
    pub fn deposit(&mut self, sender: Address, amount: Amount) -> Result<Amount, anyhow::Error> {
        self.treasury.receive(amount)?;
        self.save()?;
        Ok(self.vault.deposit(sender, amount))
    }

    /// Persist vault and treasury state
    pub fn save(&self) -> Result<(), anyhow::Error> {
        let state = StoredState {
            vault: self.vault.snapshot(),
            treasury: self.treasury.snapshot(),
        };
        let json = serde_json::to_string_pretty(&state)?;

        // Replace atomically
        let tmp_path = self.state_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.state_path)?;
        Ok(())
    }

    /// All journaled events, oldest first
    pub fn history(&self) -> Result<Vec<VaultEvent>, anyhow::Error> {
        let reader = EventReader::from_directory(&self.journal_path)?;
        Ok(reader.read_all()?)
    }

    /// Number of journaled events
    pub fn journal_count(&self) -> Result<usize, anyhow::Error> {
        let reader = EventReader::from_directory(&self.journal_path)?;
        Ok(reader.count()?)
    }

    /// Get state file path
    pub fn state_path(&self) -> &Path {
        &self.state_path
    }
}
