//! File storage for product media and documents.
//!
//! Uploads land under `{category}/{kind}-{timestamp}-{filename}` so repeated
//! uploads of the same filename never collide. References resolve to a
//! public URL path; serving the bytes is the front proxy's job.

use crate::error::Result;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        fs::create_dir_all(&root)?;
        Ok(Self {
            root: root.as_ref().to_path_buf(),
        })
    }

    /// Store bytes and return the reference key.
    pub fn upload(&self, category: &str, kind: &str, filename: &str, bytes: &[u8]) -> Result<String> {
        let key = format!(
            "{}/{}-{}-{}",
            sanitize(category),
            sanitize(kind),
            Utc::now().timestamp_millis(),
            sanitize(filename)
        );
        let path = self.root.join(&key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        Ok(key)
    }

    /// Public URL for a stored reference.
    pub fn resolve_url(&self, reference: &str) -> String {
        format!("/files/{reference}")
    }
}

/// Keys stay flat and path-safe whatever the client sent.
fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
