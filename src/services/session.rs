use std::sync::{PoisonError, RwLock};

use crate::errors::AppError;
use crate::models::{EntityId, Role, Session};

/// The operator session shared by every request.
///
/// Handlers take a snapshot with [`SessionContext::require`] and pass the
/// `Session` on explicitly; nothing below the handlers reads this directly.
#[derive(Debug, Default)]
pub struct SessionContext {
    inner: RwLock<Option<Session>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, session: Session) -> Result<(), AppError> {
        check(&session)?;
        tracing::info!(
            role = session.role.as_str(),
            place_id = ?session.place_id,
            "session started"
        );
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
        Ok(())
    }

    /// Clears every field. Returns whether a session was active.
    pub fn end(&self) -> bool {
        let previous = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            tracing::info!("session ended");
        }
        previous.is_some()
    }

    pub fn current(&self) -> Option<Session> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of the session, or `Unauthenticated` when any required
    /// field is missing. Callers redirect to login on that error.
    pub fn require(&self) -> Result<Session, AppError> {
        let session = self.current().ok_or(AppError::Unauthenticated)?;
        check(&session)?;
        Ok(session)
    }

    pub fn require_master(&self) -> Result<Session, AppError> {
        let session = self.require()?;
        if session.role != Role::MasterAdmin {
            return Err(AppError::Forbidden(
                "only a master admin can do this".to_string(),
            ));
        }
        Ok(session)
    }
}

fn check(session: &Session) -> Result<(), AppError> {
    if session.token.trim().is_empty() {
        return Err(AppError::Unauthenticated);
    }
    if session.role == Role::Admin && session.place_id.is_none() {
        return Err(AppError::Unauthenticated);
    }
    Ok(())
}

impl Session {
    /// Place every listing is restricted to, `None` for master admins.
    pub fn place_scope(&self) -> Option<&EntityId> {
        match self.role {
            Role::Admin => self.place_id.as_ref(),
            Role::MasterAdmin => None,
        }
    }
}
