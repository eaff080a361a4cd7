use std::fs;
use std::path::PathBuf;

use log::{error, warn};

use crate::engine::error::StorageError;
use crate::model::session::GameSession;

const STORE_FILE: &str = "sessions.json";
/// History entries kept per session on a normal save.
const MAX_HISTORY_PER_SESSION: usize = 50;
/// History length old sessions are cut down to when the store is over budget.
const PRUNED_HISTORY_LEN: usize = 10;
/// Serialized-store size above which old histories get pruned.
const DEFAULT_BYTE_BUDGET: usize = 5 * 1024 * 1024;

/// JSON-file session store under the platform data directory.
///
/// The whole store is one array of sessions, rewritten wholesale on every
/// save; at most one turn is in flight per session, so last-writer-wins is
/// safe. When the serialized store exceeds the byte budget, the oldest
/// sessions have their histories truncated progressively until the write
/// fits.
pub struct SessionStore {
    path: PathBuf,
    byte_budget: usize,
}

impl SessionStore {
    pub fn open_default() -> Result<Self, StorageError> {
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("storyloom");
        fs::create_dir_all(&path)?;
        path.push(STORE_FILE);
        Ok(Self {
            path,
            byte_budget: DEFAULT_BYTE_BUDGET,
        })
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self {
            path,
            byte_budget: DEFAULT_BYTE_BUDGET,
        }
    }

    #[cfg(test)]
    fn with_budget(path: PathBuf, byte_budget: usize) -> Self {
        Self { path, byte_budget }
    }

    /// All sessions, most recently played first. A missing store is empty;
    /// a corrupt store is logged and treated as empty rather than wedging
    /// the client.
    pub fn list(&self) -> Vec<GameSession> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                error!("failed to read session store: {err}");
                return Vec::new();
            }
        };
        let mut sessions: Vec<GameSession> = match serde_json::from_str(&raw) {
            Ok(sessions) => sessions,
            Err(err) => {
                error!("session store is corrupt, ignoring it: {err}");
                return Vec::new();
            }
        };
        sessions.sort_by(|a, b| b.last_played.cmp(&a.last_played));
        sessions
    }

    pub fn load(&self, id: &str) -> Result<GameSession, StorageError> {
        self.list()
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    pub fn save(&self, mut session: GameSession) -> Result<(), StorageError> {
        let len = session.history.len();
        if len > MAX_HISTORY_PER_SESSION {
            session.history.drain(..len - MAX_HISTORY_PER_SESSION);
        }

        let mut sessions = self.list();
        sessions.retain(|s| s.id != session.id);
        sessions.insert(0, session);

        let mut serialized = serde_json::to_string(&sessions)?;
        if serialized.len() > self.byte_budget {
            warn!("session store over budget, pruning old session histories");
            // Oldest sessions sit at the end after the sort in list().
            for i in (0..sessions.len()).rev() {
                if sessions[i].history.len() <= PRUNED_HISTORY_LEN {
                    continue;
                }
                let len = sessions[i].history.len();
                sessions[i].history.drain(..len - PRUNED_HISTORY_LEN);
                serialized = serde_json::to_string(&sessions)?;
                if serialized.len() <= self.byte_budget {
                    break;
                }
            }
            if serialized.len() > self.byte_budget {
                return Err(StorageError::QuotaExceeded);
            }
        }

        self.write_atomic(&serialized)
    }

    pub fn delete(&self, id: &str) -> Result<(), StorageError> {
        let mut sessions = self.list();
        sessions.retain(|s| s.id != id);
        self.write_atomic(&serde_json::to_string(&sessions)?)
    }

    pub fn rename(&self, id: &str, title: &str) -> Result<(), StorageError> {
        let mut sessions = self.list();
        let session = sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        session.title = title.to_string();
        self.write_atomic(&serde_json::to_string(&sessions)?)
    }

    fn write_atomic(&self, contents: &str) -> Result<(), StorageError> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
