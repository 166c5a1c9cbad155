//! PostgreSQL-backed transaction backend.
//!
//! A session owns one `sqlx` transaction. Repositories lock it for the
//! duration of a single statement, so concurrent calls on the same session
//! are serialized rather than interleaved on the wire.

use async_trait::async_trait;
use sqlx::postgres::PgConnection;
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use wordhoard_application::{Session, TransactionBackend};
use wordhoard_core::{AppError, AppResult};

/// PostgreSQL implementation of the transaction backend port.
#[derive(Clone)]
pub struct PostgresTransactionBackend {
    pool: PgPool,
}

impl PostgresTransactionBackend {
    /// Creates a backend with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

struct PostgresSession {
    transaction: Mutex<Option<Transaction<'static, Postgres>>>,
}

/// Exclusive access to the open transaction behind a session.
pub(crate) struct SessionConnection<'a> {
    guard: MutexGuard<'a, Option<Transaction<'static, Postgres>>>,
}

impl SessionConnection<'_> {
    pub(crate) fn connection(&mut self) -> AppResult<&mut PgConnection> {
        self.guard
            .as_deref_mut()
            .ok_or_else(|| AppError::Internal("transaction is already finished".to_owned()))
    }
}

/// Locks the transaction of `session` for one statement.
pub(crate) async fn lock_session(session: &Session) -> AppResult<SessionConnection<'_>> {
    session.ensure_active()?;
    let guard = session
        .state::<PostgresSession>()?
        .transaction
        .lock()
        .await;

    Ok(SessionConnection { guard })
}

async fn take_transaction(session: &Session) -> AppResult<Transaction<'static, Postgres>> {
    session
        .state::<PostgresSession>()?
        .transaction
        .lock()
        .await
        .take()
        .ok_or_else(|| AppError::Internal("transaction is already finished".to_owned()))
}

#[async_trait]
impl TransactionBackend for PostgresTransactionBackend {
    async fn begin(&self) -> AppResult<Session> {
        let transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))?;

        Ok(Session::new(PostgresSession {
            transaction: Mutex::new(Some(transaction)),
        }))
    }

    async fn commit(&self, session: &Session) -> AppResult<()> {
        take_transaction(session)
            .await?
            .commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))
    }

    async fn rollback(&self, session: &Session) -> AppResult<()> {
        take_transaction(session)
            .await?
            .rollback()
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to roll back transaction: {error}"))
            })
    }

    fn abandon(&self, session: &Session) {
        let Ok(state) = session.state::<PostgresSession>() else {
            return;
        };

        // Dropping an unfinished sqlx transaction queues its rollback on the
        // connection before it goes back to the pool.
        match state.transaction.try_lock() {
            Ok(mut guard) => drop(guard.take()),
            Err(_) => debug!(
                session_id = %session.id(),
                "transaction busy; rollback deferred to drop"
            ),
        }
    }
}
