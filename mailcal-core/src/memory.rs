//! Booked-slot memory.
//!
//! A flat JSON array of slot keys (see `MeetingSlot::key`) that survives
//! between runs so the same time is never confirmed twice. Entries are only
//! ever appended.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{MailcalError, MailcalResult};

#[derive(Debug, Clone)]
pub struct BookedSlots {
    path: PathBuf,
    slots: Vec<String>,
}

impl BookedSlots {
    /// Load memory from `path`. A file that does not exist yet is empty memory.
    pub fn load(path: &Path) -> MailcalResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no booked-slot memory yet");
            return Ok(Self {
                path: path.to_path_buf(),
                slots: Vec::new(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        let slots: Vec<String> = if contents.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&contents).map_err(|e| {
                MailcalError::Memory(format!("Could not parse {}: {e}", path.display()))
            })?
        };

        Ok(Self {
            path: path.to_path_buf(),
            slots,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.iter().any(|s| s == key)
    }

    /// Append `key`. Returns false when it was already booked.
    pub fn record(&mut self, key: &str) -> bool {
        if self.contains(key) {
            return false;
        }
        self.slots.push(key.to_string());
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Write memory back to disk (temp file, then rename).
    pub fn save(&self) -> MailcalResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(&self.slots)
            .map_err(|e| MailcalError::Serialization(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), slots = self.slots.len(), "saved booked-slot memory");
        Ok(())
    }
}
