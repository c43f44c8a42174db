// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Bounded newest-first JSON logs.
//!
//! Every mutation is read-modify-write of the whole file under a per-file
//! lock, written to a temporary sibling and renamed into place, so a reader
//! sees either the old or the new sequence, never a partial one. A missing
//! file reads as empty, and so does a corrupt one after it has been moved
//! aside. Any other read failure aborts the mutation and leaves the file
//! as it was.

use crate::admin::AdminSession;
use crate::error::StoreError;
use crate::form::FormKind;
use crate::models::{Announcement, AnnouncementDraft, Submission};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// One JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document for modification.
    ///
    /// A missing or blank file is the default, and so is a corrupt one once
    /// it has been moved aside. Any other read failure is returned, so the
    /// caller never replaces records it could not see.
    pub async fn read<T>(&self) -> Result<T, StoreError>
    where
        T: DeserializeOwned + Default,
    {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(self.io_error(e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }

        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Record file corrupt, treating as empty");
                self.quarantine().await?;
                Ok(T::default())
            }
        }
    }

    /// Read the document for display, degrading to `T::default()` on any
    /// failure.
    pub async fn read_or_default<T>(&self) -> T
    where
        T: DeserializeOwned + Default,
    {
        match self.read().await {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Record file unreadable, treating as empty");
                T::default()
            }
        }
    }

    /// Replace the document atomically.
    pub async fn write<T>(&self, value: &T) -> Result<(), StoreError>
    where
        T: Serialize,
    {
        let bytes = serde_json::to_vec_pretty(value)?;
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| self.io_error(e))?;

        let tmp = parent.join(format!(
            ".{}.tmp.{}",
            self.path.file_name().and_then(|s| s.to_str()).unwrap_or("records"),
            std::process::id()
        ));
        if let Err(e) = write_synced(&tmp, &bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(self.io_error(e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(self.io_error(e));
        }
        if let Ok(dir) = tokio::fs::File::open(parent).await {
            let _ = dir.sync_all().await;
        }
        debug!(path = %self.path.display(), bytes = bytes.len(), "Record file written");
        Ok(())
    }

    async fn quarantine(&self) -> Result<(), StoreError> {
        let aside = self.path.with_extension(format!(
            "corrupt-{}",
            chrono::Utc::now().format("%Y%m%d%H%M%S")
        ));
        match tokio::fs::rename(&self.path, &aside).await {
            Ok(()) => {
                info!(from = %self.path.display(), to = %aside.display(), "Corrupt record file moved aside");
                Ok(())
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Could not move corrupt record file aside");
                Err(self.io_error(e))
            }
        }
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

/// Accepted submissions of one form, newest first, capped.
#[derive(Debug)]
pub struct SubmissionStore {
    kind: FormKind,
    file: JsonFile,
    max_records: usize,
    lock: Mutex<()>,
}

impl SubmissionStore {
    pub fn new(data_dir: &Path, kind: FormKind, max_records: usize) -> Self {
        Self {
            kind,
            file: JsonFile::new(data_dir.join(kind.store_file())),
            max_records,
            lock: Mutex::new(()),
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Current records, newest first.
    pub async fn records(&self) -> Vec<Submission> {
        let _guard = self.lock.lock().await;
        self.file.read_or_default().await
    }

    /// Put `record` at the head, evicting from the tail past the cap.
    /// Returns the stored length.
    pub async fn insert(&self, record: Submission) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().await;
        let mut records: Vec<Submission> = self.file.read().await?;

        records.insert(0, record);
        if records.len() > self.max_records {
            let evicted = records.len() - self.max_records;
            records.truncate(self.max_records);
            debug!(form = %self.kind, evicted, "Oldest submissions evicted");
        }

        self.file.write(&records).await?;
        Ok(records.len())
    }

    /// Flag a stored record as delivered to the operator. Returns `false`
    /// when the record is no longer present.
    pub async fn mark_notified(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut records: Vec<Submission> = self.file.read().await?;

        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };
        if record.notified {
            return Ok(true);
        }
        record.notified = true;
        self.file.write(&records).await?;
        Ok(true)
    }
}

/// On-disk shape read by the public site (`data.announcements`).
#[derive(Debug, Default, Serialize, Deserialize)]
struct AnnouncementFile {
    #[serde(default)]
    announcements: Vec<Announcement>,
    /// Highest id ever issued, so ids are not reused after deletion
    #[serde(default, skip_serializing_if = "is_zero")]
    last_id: u64,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

/// Admin-curated announcements. Insertion order is kept on disk; readers
/// sort by date.
#[derive(Debug)]
pub struct AnnouncementStore {
    file: JsonFile,
    lock: Mutex<()>,
}

impl AnnouncementStore {
    pub const FILE_NAME: &'static str = "announcements.json";

    pub fn new(data_dir: &Path) -> Self {
        Self {
            file: JsonFile::new(data_dir.join(Self::FILE_NAME)),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Announcements in curated (insertion) order.
    pub async fn list(&self) -> Vec<Announcement> {
        let _guard = self.lock.lock().await;
        let doc: AnnouncementFile = self.file.read_or_default().await;
        doc.announcements
    }

    /// Announcements newest date first; unreadable dates go last and ties
    /// keep curated order.
    pub async fn public_feed(&self) -> Vec<Announcement> {
        let mut announcements = self.list().await;
        announcements.sort_by(|a, b| b.parsed_date().cmp(&a.parsed_date()));
        announcements
    }

    pub async fn add(
        &self,
        session: &AdminSession,
        draft: AnnouncementDraft,
    ) -> Result<Announcement, StoreError> {
        let _guard = self.lock.lock().await;
        let mut doc: AnnouncementFile = self.file.read().await?;

        let max_existing = doc.announcements.iter().map(|a| a.id).max().unwrap_or(0);
        let id = max_existing.max(doc.last_id) + 1;

        let announcement = Announcement {
            id,
            title: draft.title,
            date: draft.date.format("%Y-%m-%d").to_string(),
            category: draft.category,
            message: draft.message,
            priority: draft.priority,
        };
        doc.announcements.insert(0, announcement.clone());
        doc.last_id = id;

        self.file.write(&doc).await?;
        info!(session = %session, id, "Announcement added");
        Ok(announcement)
    }

    /// Remove by id from anywhere in the sequence.
    pub async fn delete(
        &self,
        session: &AdminSession,
        id: u64,
    ) -> Result<Option<Announcement>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut doc: AnnouncementFile = self.file.read().await?;

        let Some(pos) = doc.announcements.iter().position(|a| a.id == id) else {
            return Ok(None);
        };
        let removed = doc.announcements.remove(pos);
        doc.last_id = doc.last_id.max(id);

        self.file.write(&doc).await?;
        info!(session = %session, id, "Announcement deleted");
        Ok(Some(removed))
    }
}
