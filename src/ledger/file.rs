//! JSON file ledger store
//!
//! The whole ledger is one pretty-printed JSON object, rewritten on every
//! change via a temp file and rename. A file that cannot be read or parsed
//! is moved aside before anything is written over it; if it cannot be moved
//! the store refuses to save.

use async_trait::async_trait;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

use super::{LedgerStore, SeenOrders};
use crate::error::{Result, TrackerError};

pub struct JsonFileStore {
    path: PathBuf,
    /// Set when an unreadable file is still in place
    protected: AtomicBool,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            protected: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Move an unusable file aside as `<name>.backup-<ms>`. If that fails,
    /// later saves are refused so the file is never overwritten.
    async fn quarantine(&self) -> Option<PathBuf> {
        let backup = backup_path(&self.path, chrono::Utc::now().timestamp_millis());
        match tokio::fs::rename(&self.path, &backup).await {
            Ok(()) => {
                warn!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    "Backed up unusable seen-orders file, starting empty"
                );
                Some(backup)
            }
            Err(e) => {
                error!(
                    error = %e,
                    path = %self.path.display(),
                    "Failed to back up unusable seen-orders file, saves disabled"
                );
                self.protected.store(true, Ordering::SeqCst);
                None
            }
        }
    }
}

#[async_trait]
impl LedgerStore for JsonFileStore {
    async fn load(&self) -> SeenOrders {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    path = %self.path.display(),
                    "No seen-orders file yet, will create one on first alert"
                );
                return SeenOrders::new();
            }
            Err(e) => {
                error!(error = %e, path = %self.path.display(), "Failed to read seen-orders file");
                self.quarantine().await;
                return SeenOrders::new();
            }
        };

        match serde_json::from_slice::<SeenOrders>(&bytes) {
            Ok(orders) => orders,
            Err(e) => {
                error!(error = %e, path = %self.path.display(), "Failed to parse seen-orders file");
                self.quarantine().await;
                SeenOrders::new()
            }
        }
    }

    async fn save(&self, orders: &SeenOrders) -> Result<()> {
        if self.protected.load(Ordering::SeqCst) {
            return Err(TrackerError::Storage(format!(
                "{} could not be read or backed up; not overwriting it",
                self.path.display()
            )));
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(orders)?;
        let tmp = sibling_with_suffix(&self.path, ".tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

fn backup_path(path: &Path, now_ms: i64) -> PathBuf {
    sibling_with_suffix(path, &format!(".backup-{}", now_ms))
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("seenOrders.json"));
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{SeenOrderLedger, SeenOrderRecord};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("seenOrders.json"));
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seenOrders.json");

        let mut ledger = SeenOrderLedger::load(Box::new(JsonFileStore::new(&path))).await;
        ledger.mark_seen("A1-BTC-1-100", dec!(60000), 100).await.unwrap();
        ledger.mark_seen("B2-ETH-30.5-200", dec!(59475.25), 200).await.unwrap();

        let reloaded = JsonFileStore::new(&path).load().await;
        assert_eq!(reloaded.len(), 2);
        assert_eq!(
            reloaded["A1-BTC-1-100"],
            SeenOrderRecord {
                first_seen_at_ms: 100,
                value_usd: dec!(60000)
            }
        );
        assert_eq!(reloaded["B2-ETH-30.5-200"].value_usd, dec!(59475.25));
        assert_eq!(reloaded["B2-ETH-30.5-200"].first_seen_at_ms, 200);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_quarantined() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seenOrders.json");
        std::fs::write(&path, b"{ this is not json").unwrap();

        let orders = JsonFileStore::new(&path).load().await;

        assert!(orders.is_empty());
        assert!(!path.exists());
        let backups: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("seenOrders.json.backup-"))
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(
            std::fs::read(dir.path().join(&backups[0])).unwrap(),
            b"{ this is not json"
        );
    }

    #[tokio::test]
    async fn test_unreadable_file_is_moved_aside_before_saving() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seenOrders.json");
        // a directory in place of the file fails to read without being missing
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("history"), b"keep me").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.load().await.is_empty());

        let backups: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.to_string_lossy().contains("seenOrders.json.backup-"))
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(std::fs::read(backups[0].join("history")).unwrap(), b"keep me");

        store.save(&SeenOrders::new()).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_save_refused_while_unusable_file_in_place() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("seenOrders.json"));
        store.protected.store(true, Ordering::SeqCst);

        let result = store.save(&SeenOrders::new()).await;

        assert!(matches!(result, Err(TrackerError::Storage(_))));
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_save_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("seenOrders.json");
        let store = JsonFileStore::new(&path);

        store.save(&SeenOrders::new()).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_backup_path_naming() {
        assert_eq!(
            backup_path(Path::new("/var/lib/tracker/seenOrders.json"), 1234),
            PathBuf::from("/var/lib/tracker/seenOrders.json.backup-1234")
        );
    }
}
