use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use vendor_onboarding::VendorRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistryChange {
    /// Highest sequence ever issued.  Written on compaction so deleted ids
    /// stay retired.
    Sequence { value: u64 },
    Upserted { record: VendorRecord },
    Deleted { vendor_id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEvent {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub change: RegistryChange,
}

impl RegistryEvent {
    pub fn new(change: RegistryChange) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            change,
        }
    }
}

/// Append-only JSONL journal of registry changes.  Holds an exclusive
/// advisory lock on `<file>.lock` for as long as it lives.
#[derive(Debug)]
pub struct RegistryJournal {
    path: PathBuf,
    _lock: File,
}

impl RegistryJournal {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let lock_path = sibling(&path, "lock");
        let lock = File::create(&lock_path)?;
        lock.try_lock_exclusive().map_err(|_| {
            anyhow!(
                "vendor registry is in use by another process (lock held at {})",
                lock_path.display()
            )
        })?;

        Ok(Self { path, _lock: lock })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, event: &RegistryEvent) -> Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let line = serde_json::to_string(event)?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Replace the journal with `events`.  The new content goes to a `.tmp`
    /// sibling that is synced and renamed over the original; on any error the
    /// original is left untouched.
    pub async fn overwrite(&self, events: &[RegistryEvent]) -> Result<()> {
        let tmp_path = sibling(&self.path, "tmp");

        let write_result: Result<()> = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)
                .await?;
            for event in events {
                let line = serde_json::to_string(event)?;
                file.write_all(line.as_bytes()).await?;
                file.write_all(b"\n").await?;
            }
            file.flush().await?;
            file.sync_all().await?;
            Ok(())
        }
        .await;

        if let Err(err) = write_result {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(err);
        }

        if let Err(err) = tokio::fs::rename(&tmp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(err.into());
        }

        Ok(())
    }

    /// Every readable event in file order.  Unparseable lines are skipped.
    pub fn load(&self) -> Result<Vec<RegistryEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut events = Vec::new();
        let mut corrupt = 0usize;

        for (line_idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<RegistryEvent>(&line) {
                Ok(event) => events.push(event),
                Err(err) => {
                    corrupt += 1;
                    tracing::warn!(
                        line = line_idx + 1,
                        error = %err,
                        path = %self.path.display(),
                        "skipping corrupt registry line"
                    );
                }
            }
        }

        if corrupt > 0 {
            tracing::warn!(
                corrupt_lines = corrupt,
                path = %self.path.display(),
                "registry loaded with skipped lines"
            );
        }

        Ok(events)
    }
}

fn sibling(path: &Path, extension: &str) -> PathBuf {
    let filename = path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| "vendors.jsonl".to_string());
    path.with_file_name(format!("{filename}.{extension}"))
}
