//! Admin moderation console over the scripts collection.
//!
//! Opening the console requires a resolved admin session; everything else
//! is refused at the boundary, not merely hidden. The console keeps an
//! optimistic in-memory copy of the collection, loaded once at open and
//! updated in place on each successful mutation (no re-fetch), so its view
//! can drift from the store if another admin mutates the same records
//! concurrently. The store resolves such races last-write-wins.

use crate::error::{AppError, Result};
use crate::models::{Script, ScriptStatus};
use crate::session::SessionContext;
use crate::storage::Storage;
use chrono::Utc;
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Pending,
    Completed,
    /// Rejection deletes the document, so no stored script ever matches.
    Rejected,
}

impl StatusFilter {
    fn matches(self, script: &Script) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => script.status == ScriptStatus::Pending,
            StatusFilter::Completed => script.status == ScriptStatus::Completed,
            StatusFilter::Rejected => false,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(StatusFilter::All),
            "pending" => Ok(StatusFilter::Pending),
            "completed" => Ok(StatusFilter::Completed),
            "rejected" => Ok(StatusFilter::Rejected),
            other => Err(AppError::Validation(format!("unknown filter: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl FromStr for SortDirection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(SortDirection::Ascending),
            "desc" => Ok(SortDirection::Descending),
            other => Err(AppError::Validation(format!("unknown sort: {other}"))),
        }
    }
}

/// Missing timestamps sort as the epoch, i.e. earliest.
fn created_ms(script: &Script) -> i64 {
    script
        .created_at
        .map(|t| t.timestamp_millis())
        .unwrap_or(0)
}

pub struct ModerationConsole {
    storage: Storage,
    scripts: Vec<Script>,
}

impl ModerationConsole {
    /// Open the console for an admin session. Anything else is refused
    /// here, before any data is loaded.
    pub fn open(storage: Storage, session: &SessionContext) -> Result<Self> {
        if !session.is_admin() {
            return Err(AppError::Unauthorized);
        }
        let scripts = storage.list_scripts()?;
        Ok(Self { storage, scripts })
    }

    /// Filter is a pure predicate over status; sorting is by creation time.
    pub fn list_scripts(&self, filter: StatusFilter, sort: SortDirection) -> Vec<Script> {
        let mut scripts: Vec<Script> = self
            .scripts
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        match sort {
            SortDirection::Ascending => scripts.sort_by_key(created_ms),
            SortDirection::Descending => {
                scripts.sort_by_key(|s| std::cmp::Reverse(created_ms(s)))
            }
        }
        scripts
    }

    /// Mark a script completed. Re-approving an already completed script
    /// lands on the same end state and is not an error.
    pub fn approve(&mut self, id: &str) -> Result<Script> {
        let idx = self.position(id)?;
        let mut script = self.scripts[idx].clone();
        script.status = ScriptStatus::Completed;
        self.storage.put_script(&script)?;
        self.scripts[idx] = script.clone();
        info!(script = %id, "script approved");
        Ok(script)
    }

    /// Destructive and irreversible: rejection deletes the document rather
    /// than flagging it, so `rejected` never persists as a status. Callers
    /// own the interactive confirmation before invoking this.
    pub fn reject_and_delete(&mut self, id: &str) -> Result<()> {
        let idx = self.position(id)?;
        self.storage.delete_script(id)?;
        self.scripts.remove(idx);
        info!(script = %id, "script rejected and deleted");
        Ok(())
    }

    /// Attach (or overwrite) the Pine-script deliverable. Supplying a
    /// payload is itself approval: the status is forced to completed in the
    /// same transition, whatever it was before. The payload is trimmed;
    /// empty after trim is still accepted.
    pub fn attach_deliverable_and_approve(&mut self, id: &str, content: &str) -> Result<Script> {
        let idx = self.position(id)?;
        let mut script = self.scripts[idx].clone();
        script.pine_script = Some(content.trim().to_string());
        script.status = ScriptStatus::Completed;
        script.updated_at = Some(Utc::now());
        self.storage.put_script(&script)?;
        self.scripts[idx] = script.clone();
        info!(script = %id, "deliverable attached, script completed");
        Ok(script)
    }

    /// Dashboard headline: the running submissions counter.
    pub fn scripts_submitted(&self) -> Result<u64> {
        Ok(self.storage.admin_config()?.scripts_count)
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.scripts
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound(format!("script {id}")))
    }
}
