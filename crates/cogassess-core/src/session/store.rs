//! Session persisted to the key-value store after every change.

use tracing::{info, warn};

use super::{Report, Session, SessionRecorder};
use crate::error::StorageError;
use crate::storage::Database;
use crate::task::{ItemOutcome, TaskKind};

const SESSION_KEY: &str = "session";
const BACKUP_KEY: &str = "session_backup";

/// [`Session`] that writes through to a [`Database`].
///
/// Writes are best effort: a failed save is logged and the in-memory session
/// carries on, so a participant is never interrupted by storage trouble.
pub struct PersistentSession {
    db: Database,
    session: Session,
}

impl PersistentSession {
    /// Resume the stored session, falling back to the backup copy and then
    /// to a fresh session.
    pub fn load(db: Database) -> Self {
        let session = match read(&db, SESSION_KEY) {
            Ok(Some(session)) => session,
            Ok(None) => Session::new(),
            Err(err) => {
                warn!(error = %err, "stored session unreadable, trying backup");
                match read(&db, BACKUP_KEY) {
                    Ok(Some(session)) => {
                        info!(session_id = %session.session_id, "restored session from backup");
                        session
                    }
                    Ok(None) => Session::new(),
                    Err(err) => {
                        warn!(error = %err, "backup unreadable, starting a new session");
                        Session::new()
                    }
                }
            }
        };
        let store = Self { db, session };
        store.persist();
        store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Drop the stored session and its backup and start over.
    pub fn reset(&mut self) {
        for key in [SESSION_KEY, BACKUP_KEY] {
            if let Err(err) = self.db.kv_remove(key) {
                warn!(key, error = %err, "failed to clear stored session");
            }
        }
        self.session = Session::new();
        info!(session_id = %self.session.session_id, "session reset");
        self.persist();
    }

    /// Write the session and its backup.
    ///
    /// # Errors
    /// Returns the first storage failure.
    pub fn save(&self) -> Result<(), StorageError> {
        let json = serde_json::to_string(&self.session).map_err(|e| StorageError::Corrupt {
            key: SESSION_KEY.to_string(),
            message: e.to_string(),
        })?;
        self.db.kv_set(SESSION_KEY, &json)?;
        self.db.kv_set(BACKUP_KEY, &json)?;
        Ok(())
    }

    fn persist(&self) {
        if let Err(err) = self.save() {
            warn!(session_id = %self.session.session_id, error = %err, "failed to save session");
        }
    }
}

fn read(db: &Database, key: &str) -> Result<Option<Session>, StorageError> {
    let Some(json) = db.kv_get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&json)
        .map(Some)
        .map_err(|e| StorageError::Corrupt {
            key: key.to_string(),
            message: e.to_string(),
        })
}

impl SessionRecorder for PersistentSession {
    fn start_task(&mut self, kind: TaskKind) {
        self.session.start_task(kind);
        self.persist();
    }

    fn record_response(&mut self, kind: TaskKind, outcome: ItemOutcome) {
        self.session.record_response(kind, outcome);
        self.persist();
    }

    fn complete_task(&mut self, kind: TaskKind) {
        self.session.complete_task(kind);
        self.persist();
    }

    fn export_results(&self) -> Report {
        self.session.export_results()
    }
}
