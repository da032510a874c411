//! Wallet persistence layer
//!
//! Saves and loads a JSON snapshot of the wallet and its treasury.

use crate::multisig::MultisigWallet;
use crate::treasury::Treasury;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Everything persisted between runs
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub wallet: MultisigWallet,
    pub treasury: Treasury,
}

impl WalletSnapshot {
    pub fn new(wallet: MultisigWallet, treasury: Treasury) -> Self {
        Self { wallet, treasury }
    }

    fn checked(self) -> Result<Self, StorageError> {
        self.wallet
            .validate()
            .map_err(|e| StorageError::InvalidData(e.to_string()))?;
        Ok(self)
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub state_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".quorum_wallet"),
            state_file: "wallet.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// Wallet storage manager
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Create a new storage manager
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    fn state_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.state_file)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.state_file, index))
    }

    /// Save the snapshot to disk
    pub fn save(&self, snapshot: &WalletSnapshot) -> Result<(), StorageError> {
        let path = self.state_path();

        if self.config.backup_enabled && self.config.max_backups > 0 && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        // Write to temporary file first
        let temp_path = self.config.data_dir.join("wallet.tmp");
        let file = fs::File::create(&temp_path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, snapshot)?;

        // Atomic rename
        fs::rename(&temp_path, &path)?;

        log::debug!("Wallet state saved to {:?}", path);
        Ok(())
    }

    /// Load the snapshot from disk, re-checking wallet invariants
    pub fn load(&self) -> Result<WalletSnapshot, StorageError> {
        let path = self.state_path();

        if !path.exists() {
            return Err(StorageError::InvalidData(
                "Wallet state file not found".to_string(),
            ));
        }

        read_snapshot(&path)
    }

    /// Check if a saved wallet exists
    pub fn exists(&self) -> bool {
        self.state_path().exists()
    }

    fn rotate_backups(&self) -> Result<(), StorageError> {
        // Delete oldest backup
        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        // Shift existing backups
        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                fs::rename(&current, self.backup_path(i + 1))?;
            }
        }

        Ok(())
    }

    /// Restore from a backup
    pub fn restore_backup(&self, backup_index: usize) -> Result<WalletSnapshot, StorageError> {
        let backup_path = self.backup_path(backup_index);

        if !backup_path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Backup {} not found",
                backup_index
            )));
        }

        read_snapshot(&backup_path)
    }

    /// List available backups
    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|i| self.backup_path(*i).exists())
            .collect()
    }
}

fn read_snapshot(path: &Path) -> Result<WalletSnapshot, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let snapshot: WalletSnapshot = serde_json::from_reader(reader)?;
    snapshot.checked()
}

/// Save a snapshot to a specific file path
pub fn save_to_file(snapshot: &WalletSnapshot, path: &Path) -> Result<(), StorageError> {
    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, snapshot)?;
    Ok(())
}

/// Load a snapshot from a specific file path
pub fn load_from_file(path: &Path) -> Result<WalletSnapshot, StorageError> {
    read_snapshot(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Address;
    use crate::multisig::Action;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn create_snapshot() -> WalletSnapshot {
        let mut wallet = MultisigWallet::new(vec![addr(1), addr(2), addr(3)], 2).unwrap();
        wallet.submit(addr(1), Action::transfer(addr(9), 10)).unwrap();
        let mut treasury = Treasury::new();
        treasury.deposit(addr(1), 100).unwrap();
        WalletSnapshot::new(wallet, treasury)
    }

    #[test]
    fn test_save_load_wallet() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        };

        let storage = Storage::new(config).unwrap();
        let snapshot = create_snapshot();

        // Save
        storage.save(&snapshot).unwrap();
        assert!(storage.exists());

        // Load
        let loaded = storage.load().unwrap();
        assert_eq!(loaded.wallet.address(), snapshot.wallet.address());
        assert_eq!(loaded.wallet.required(), 2);
        assert_eq!(
            loaded.wallet.get_transaction(0).unwrap(),
            snapshot.wallet.get_transaction(0).unwrap()
        );
        assert_eq!(loaded.treasury, snapshot.treasury);
    }

    #[test]
    fn test_backup_rotation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            max_backups: 3,
            ..Default::default()
        };

        let storage = Storage::new(config).unwrap();
        let mut snapshot = create_snapshot();

        // Save multiple times
        for _ in 0..5 {
            storage.save(&snapshot).unwrap();
            snapshot
                .wallet
                .submit(addr(2), Action::transfer(addr(9), 1))
                .unwrap();
        }

        assert_eq!(storage.list_backups(), vec![0, 1, 2]);

        // Newest backup holds the state before the last save
        let restored = storage.restore_backup(0).unwrap();
        assert_eq!(restored.wallet.transaction_count(true, true), 4);
    }

    #[test]
    fn test_load_rejects_invalid_registry() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("broken.json");

        let snapshot = create_snapshot();
        let mut json = serde_json::to_value(&snapshot).unwrap();
        json["wallet"]["registry"]["required"] = serde_json::json!(7);
        fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();

        assert!(matches!(
            load_from_file(&path),
            Err(StorageError::InvalidData(_))
        ));
    }

    #[test]
    fn test_missing_state_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        };
        let storage = Storage::new(config).unwrap();

        assert!(!storage.exists());
        assert!(matches!(storage.load(), Err(StorageError::InvalidData(_))));
    }
}
