//! Session Registry - independent sessions side by side
//!
//! Each session sits behind its own lock; processing a frame only locks the
//! session the frame belongs to.

use std::collections::HashMap;
use std::sync::Arc;

use formcoach_core::{FormError, SessionId, SessionTime};
use formcoach_pose::LandmarkFrame;
use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::info;

use crate::{FrameReport, SessionConfig, SessionSummary, SquatSession};

/// Registry errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Unknown session: {0}")]
    UnknownSession(SessionId),

    #[error("Session already exists: {0}")]
    DuplicateSession(SessionId),

    #[error("Session setup failed: {0}")]
    Setup(#[from] FormError),
}

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

type SharedSession = Arc<Mutex<SquatSession>>;

/// Live sessions keyed by id
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, SharedSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session
    pub fn open(&self, id: SessionId, config: &SessionConfig) -> RegistryResult<()> {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&id) {
            return Err(RegistryError::DuplicateSession(id));
        }

        let session = SquatSession::new(id, config)?;
        sessions.insert(id, Arc::new(Mutex::new(session)));
        Ok(())
    }

    /// Register an already-built session
    pub fn insert(&self, session: SquatSession) -> RegistryResult<()> {
        let id = session.id();
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&id) {
            return Err(RegistryError::DuplicateSession(id));
        }
        sessions.insert(id, Arc::new(Mutex::new(session)));
        Ok(())
    }

    fn get(&self, id: SessionId) -> RegistryResult<SharedSession> {
        self.sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or(RegistryError::UnknownSession(id))
    }

    /// Process a frame of one session
    pub fn process_frame(
        &self,
        id: SessionId,
        frame: &LandmarkFrame,
        now: SessionTime,
    ) -> RegistryResult<FrameReport> {
        let session = self.get(id)?;
        let report = session.lock().process_frame(frame, now);
        Ok(report)
    }

    /// Run `f` with exclusive access to one session
    pub fn with_session<R>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut SquatSession) -> R,
    ) -> RegistryResult<R> {
        let session = self.get(id)?;
        let mut guard = session.lock();
        Ok(f(&mut guard))
    }

    /// Summary of a live session
    pub fn summary(&self, id: SessionId) -> RegistryResult<SessionSummary> {
        self.with_session(id, |s| s.summary())
    }

    /// End a session and remove it
    pub fn close(&self, id: SessionId) -> RegistryResult<SessionSummary> {
        let session = self
            .sessions
            .write()
            .remove(&id)
            .ok_or(RegistryError::UnknownSession(id))?;

        let summary = match Arc::try_unwrap(session) {
            Ok(mutex) => mutex.into_inner().finish(),
            // A caller still holds a handle; summarize without consuming
            Err(shared) => shared.lock().summary(),
        };

        info!(session = %id, "session closed");
        Ok(summary)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> = self.sessions.read().keys().copied().collect();
        ids.sort_by_key(|id| id.0);
        ids
    }
}
