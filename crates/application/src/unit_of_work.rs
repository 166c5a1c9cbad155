//! Unit-of-work management.
//!
//! A [`TransactionManager`] opens at most one underlying transaction per call
//! chain. The [`CallContext`] returned inside an open unit of work carries the
//! [`Session`] handle, so nested calls join the existing transaction instead
//! of starting a second one. Only the owner of the real transaction decides
//! whether it commits; joined guards finish as no-ops.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};
use uuid::Uuid;
use wordhoard_core::{AppError, AppResult};

/// Opaque handle to one open unit of work.
///
/// Backends create it from their own transaction state and downcast it back
/// with [`Session::state`]. Clones share the same underlying transaction.
#[derive(Clone)]
pub struct Session {
    id: Uuid,
    state: Arc<dyn Any + Send + Sync>,
    cancellation: CancellationToken,
}

impl Session {
    /// Wraps backend-specific transaction state.
    #[must_use]
    pub fn new<S>(state: S) -> Self
    where
        S: Any + Send + Sync,
    {
        Self {
            id: Uuid::new_v4(),
            state: Arc::new(state),
            cancellation: CancellationToken::new(),
        }
    }

    /// Returns the unique session id, used for log correlation.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Downcasts to the backend state this session was created with.
    pub fn state<S>(&self) -> AppResult<&S>
    where
        S: Any + Send + Sync,
    {
        self.state.downcast_ref::<S>().ok_or_else(|| {
            AppError::Internal(format!(
                "session {} belongs to a different transaction backend",
                self.id
            ))
        })
    }

    /// Fails fast when the call that opened this session was cancelled.
    ///
    /// Repository adapters call this before every statement.
    pub fn ensure_active(&self) -> AppResult<()> {
        if self.cancellation.is_cancelled() {
            return Err(AppError::Internal(format!(
                "unit of work {} was cancelled",
                self.id
            )));
        }

        Ok(())
    }

    fn bind_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Session")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Per-call context threaded through every service operation.
///
/// Carries the caller's cancellation token and, inside a unit of work, the
/// open [`Session`]. Only [`TransactionManager`] attaches a session.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancellation: CancellationToken,
    session: Option<Session>,
}

impl CallContext {
    /// Creates a context with a fresh cancellation token and no session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context tied to an existing cancellation token.
    #[must_use]
    pub fn with_cancellation(cancellation: CancellationToken) -> Self {
        Self {
            cancellation,
            session: None,
        }
    }

    /// Returns the cancellation token for this call.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns the open session, when called inside a unit of work.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Returns the open session or an internal error outside a unit of work.
    pub fn require_session(&self) -> AppResult<&Session> {
        self.session.as_ref().ok_or_else(|| {
            AppError::Internal("operation requires an open unit of work".to_owned())
        })
    }

    /// Fails fast when the caller has cancelled this call.
    pub fn ensure_active(&self) -> AppResult<()> {
        if self.cancellation.is_cancelled() {
            return Err(AppError::Internal("operation was cancelled".to_owned()));
        }

        Ok(())
    }

    fn joined(&self, session: Session) -> Self {
        Self {
            cancellation: self.cancellation.clone(),
            session: Some(session),
        }
    }
}

/// Port for the underlying transactional store.
#[async_trait]
pub trait TransactionBackend: Send + Sync {
    /// Starts a new transaction and wraps its state in a [`Session`].
    async fn begin(&self) -> AppResult<Session>;

    /// Commits the transaction behind `session`.
    async fn commit(&self, session: &Session) -> AppResult<()>;

    /// Rolls back the transaction behind `session`.
    async fn rollback(&self, session: &Session) -> AppResult<()>;

    /// Discards the transaction without awaiting, used when a unit of work is
    /// dropped before it was finished. Must never commit.
    fn abandon(&self, session: &Session);
}

/// Opens, joins, and closes units of work.
#[derive(Clone)]
pub struct TransactionManager {
    backend: Arc<dyn TransactionBackend>,
}

impl TransactionManager {
    /// Creates a manager over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn TransactionBackend>) -> Self {
        Self { backend }
    }

    /// Opens a unit of work, or joins the one already carried by `ctx`.
    ///
    /// Returns an error without creating a session when the call is
    /// cancelled or the backend cannot start a transaction.
    pub async fn begin(&self, ctx: &CallContext) -> AppResult<UnitOfWork> {
        ctx.ensure_active()?;

        if let Some(session) = ctx.session() {
            debug!(session_id = %session.id(), "joining open unit of work");
            return Ok(UnitOfWork {
                context: ctx.clone(),
                owner: None,
            });
        }

        let session = self
            .backend
            .begin()
            .await?
            .bind_cancellation(ctx.cancellation().clone());
        debug!(session_id = %session.id(), "opened unit of work");

        Ok(UnitOfWork {
            context: ctx.joined(session),
            owner: Some(Arc::clone(&self.backend)),
        })
    }

    /// Runs `operation` inside a unit of work.
    ///
    /// Commits iff the operation returns `Ok` and this call owns the unit of
    /// work; otherwise rolls back and returns the operation's error. Inside an
    /// already open unit of work the operation simply runs on the joined
    /// session.
    pub async fn with_tx<T, F, Fut>(&self, ctx: &CallContext, operation: F) -> AppResult<T>
    where
        F: FnOnce(CallContext) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let unit_of_work = self.begin(ctx).await?;
        let outcome = operation(unit_of_work.context().clone()).await;

        match outcome {
            Ok(value) => {
                unit_of_work.finish(true).await?;
                Ok(value)
            }
            Err(operation_error) => {
                unit_of_work.finish(false).await?;
                Err(operation_error)
            }
        }
    }
}

/// Guard for an open or joined unit of work.
///
/// Dropping an owning guard without calling [`UnitOfWork::finish`] (early
/// return, panic unwind, dropped future) abandons the transaction, which the
/// backend must treat as a rollback.
#[must_use = "a unit of work rolls back unless finished with commit = true"]
pub struct UnitOfWork {
    context: CallContext,
    owner: Option<Arc<dyn TransactionBackend>>,
}

impl UnitOfWork {
    /// Returns the context to pass to repositories and nested services.
    #[must_use]
    pub fn context(&self) -> &CallContext {
        &self.context
    }

    /// Returns the session shared by everything inside this unit of work.
    pub fn session(&self) -> AppResult<&Session> {
        self.context.require_session()
    }

    /// Returns `true` when this guard started the underlying transaction.
    #[must_use]
    pub fn is_owner(&self) -> bool {
        self.owner.is_some()
    }

    /// Closes the unit of work.
    ///
    /// Joined guards return `Ok(())` without touching the transaction. For
    /// the owner, `commit = true` commits, or rolls back instead when the
    /// call was cancelled meanwhile; commit failures surface as
    /// [`AppError::Internal`]. `commit = false` rolls back; rollback
    /// failures are logged and never replace the caller's own error.
    pub async fn finish(mut self, commit: bool) -> AppResult<()> {
        let Some(backend) = self.owner.take() else {
            return Ok(());
        };
        let session = self.context.require_session()?.clone();

        if commit {
            if let Err(cancelled) = self.context.ensure_active() {
                rollback_quietly(backend.as_ref(), &session).await;
                return Err(cancelled);
            }

            return match backend.commit(&session).await {
                Ok(()) => {
                    debug!(session_id = %session.id(), "committed unit of work");
                    Ok(())
                }
                Err(commit_error) => {
                    error!(
                        session_id = %session.id(),
                        error = %commit_error,
                        "failed to commit unit of work"
                    );
                    Err(AppError::Internal("failed to commit transaction".to_owned()))
                }
            };
        }

        rollback_quietly(backend.as_ref(), &session).await;
        Ok(())
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        let Some(backend) = self.owner.take() else {
            return;
        };

        if let Some(session) = self.context.session() {
            warn!(
                session_id = %session.id(),
                "unit of work dropped before finish; rolling back"
            );
            backend.abandon(session);
        }
    }
}

async fn rollback_quietly(backend: &dyn TransactionBackend, session: &Session) {
    match backend.rollback(session).await {
        Ok(()) => debug!(session_id = %session.id(), "rolled back unit of work"),
        Err(rollback_error) => warn!(
            session_id = %session.id(),
            error = %rollback_error,
            "failed to roll back unit of work"
        ),
    }
}

#[cfg(test)]
mod tests;
