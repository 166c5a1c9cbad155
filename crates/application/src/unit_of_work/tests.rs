use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio_util::sync::CancellationToken;
use wordhoard_core::{AppError, AppResult};

use crate::test_support::FakeStore;

use super::{CallContext, Session, TransactionManager};

fn manager() -> (Arc<FakeStore>, TransactionManager) {
    let store = Arc::new(FakeStore::default());
    let manager = TransactionManager::new(store.clone());
    (store, manager)
}

#[tokio::test]
async fn begin_attaches_a_session_to_the_returned_context() -> AppResult<()> {
    let (store, manager) = manager();
    let ctx = CallContext::new();

    let unit_of_work = manager.begin(&ctx).await?;
    assert!(unit_of_work.is_owner());
    assert!(unit_of_work.context().session().is_some());
    assert!(ctx.session().is_none());

    unit_of_work.finish(true).await?;
    assert_eq!(FakeStore::count(&store.begins), 1);
    assert_eq!(FakeStore::count(&store.commits), 1);
    Ok(())
}

#[tokio::test]
async fn nested_begin_joins_instead_of_opening_a_second_transaction() -> AppResult<()> {
    let (store, manager) = manager();
    let outer = manager.begin(&CallContext::new()).await?;

    let inner = manager.begin(outer.context()).await?;
    assert!(!inner.is_owner());
    assert_eq!(inner.session()?.id(), outer.session()?.id());
    assert_eq!(FakeStore::count(&store.begins), 1);

    inner.finish(true).await?;
    assert_eq!(FakeStore::count(&store.commits), 0);

    outer.finish(false).await?;
    assert_eq!(FakeStore::count(&store.commits), 0);
    assert_eq!(FakeStore::count(&store.rollbacks), 1);
    Ok(())
}

#[tokio::test]
async fn joined_rollback_does_not_undo_the_outer_commit() -> AppResult<()> {
    let (store, manager) = manager();
    let outer = manager.begin(&CallContext::new()).await?;

    manager.begin(outer.context()).await?.finish(false).await?;
    assert_eq!(FakeStore::count(&store.rollbacks), 0);

    outer.finish(true).await?;
    assert_eq!(FakeStore::count(&store.commits), 1);
    assert_eq!(FakeStore::count(&store.rollbacks), 0);
    Ok(())
}

#[tokio::test]
async fn with_tx_commits_on_success() -> AppResult<()> {
    let (store, manager) = manager();

    let value = manager
        .with_tx(&CallContext::new(), |tx| async move {
            tx.require_session()?;
            Ok(42)
        })
        .await?;

    assert_eq!(value, 42);
    assert_eq!(FakeStore::count(&store.commits), 1);
    assert_eq!(FakeStore::count(&store.rollbacks), 0);
    Ok(())
}

#[tokio::test]
async fn with_tx_rolls_back_and_propagates_the_operation_error() {
    let (store, manager) = manager();

    let result: AppResult<()> = manager
        .with_tx(&CallContext::new(), |_tx| async move {
            Err(AppError::Conflict("duplicate".to_owned()))
        })
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert_eq!(FakeStore::count(&store.commits), 0);
    assert_eq!(FakeStore::count(&store.rollbacks), 1);
}

#[tokio::test]
async fn nested_with_tx_runs_on_the_outer_session() -> AppResult<()> {
    let (store, manager) = manager();
    let inner_manager = manager.clone();

    let ids = manager
        .with_tx(&CallContext::new(), |outer| async move {
            let outer_id = outer.require_session()?.id();
            let inner_id = inner_manager
                .with_tx(&outer, |inner| async move { Ok(inner.require_session()?.id()) })
                .await?;
            Ok((outer_id, inner_id))
        })
        .await?;

    assert_eq!(ids.0, ids.1);
    assert_eq!(FakeStore::count(&store.begins), 1);
    assert_eq!(FakeStore::count(&store.commits), 1);
    Ok(())
}

#[tokio::test]
async fn failing_begin_creates_no_session() {
    let (store, manager) = manager();
    store.fail_begin.store(true, Ordering::SeqCst);

    let result = manager.begin(&CallContext::new()).await;

    assert!(matches!(result, Err(AppError::Internal(_))));
    assert_eq!(FakeStore::count(&store.begins), 0);
    assert_eq!(FakeStore::count(&store.abandons), 0);
}

#[tokio::test]
async fn commit_failure_surfaces_as_generic_internal_error() -> AppResult<()> {
    let (store, manager) = manager();
    store.fail_commit.store(true, Ordering::SeqCst);

    let unit_of_work = manager.begin(&CallContext::new()).await?;
    let result = unit_of_work.finish(true).await;

    match result {
        Err(AppError::Internal(message)) => {
            assert_eq!(message, "failed to commit transaction");
        }
        other => panic!("expected internal error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn rollback_failure_does_not_replace_the_callers_error() {
    let (store, manager) = manager();
    store.fail_rollback.store(true, Ordering::SeqCst);

    let result: AppResult<()> = manager
        .with_tx(&CallContext::new(), |_tx| async move {
            Err(AppError::Unauthorized("denied".to_owned()))
        })
        .await;

    assert!(matches!(result, Err(AppError::Unauthorized(_))));
    assert_eq!(FakeStore::count(&store.rollbacks), 1);
}

#[tokio::test]
async fn dropping_an_unfinished_owner_abandons_the_transaction() -> AppResult<()> {
    let (store, manager) = manager();

    {
        let _unit_of_work = manager.begin(&CallContext::new()).await?;
    }

    assert_eq!(FakeStore::count(&store.abandons), 1);
    assert_eq!(FakeStore::count(&store.commits), 0);
    Ok(())
}

#[tokio::test]
async fn dropping_a_joined_guard_leaves_the_owner_open() -> AppResult<()> {
    let (store, manager) = manager();
    let outer = manager.begin(&CallContext::new()).await?;

    drop(manager.begin(outer.context()).await?);
    assert_eq!(FakeStore::count(&store.abandons), 0);

    outer.finish(true).await?;
    assert_eq!(FakeStore::count(&store.commits), 1);
    Ok(())
}

#[tokio::test]
async fn panic_inside_unit_of_work_rolls_back() {
    let (store, manager) = manager();
    let task_manager = manager.clone();

    let joined = tokio::spawn(async move {
        let _unit_of_work = task_manager.begin(&CallContext::new()).await;
        panic!("fault while the unit of work is open");
    })
    .await;

    assert!(joined.is_err());
    assert_eq!(FakeStore::count(&store.abandons), 1);
    assert_eq!(FakeStore::count(&store.commits), 0);
}

#[tokio::test]
async fn cancelled_context_cannot_begin() {
    let (store, manager) = manager();
    let token = CancellationToken::new();
    token.cancel();

    let result = manager.begin(&CallContext::with_cancellation(token)).await;

    assert!(result.is_err());
    assert_eq!(FakeStore::count(&store.begins), 0);
}

#[tokio::test]
async fn cancellation_after_begin_turns_commit_into_rollback() -> AppResult<()> {
    let (store, manager) = manager();
    let token = CancellationToken::new();
    let unit_of_work = manager
        .begin(&CallContext::with_cancellation(token.clone()))
        .await?;

    token.cancel();
    assert!(unit_of_work.session()?.ensure_active().is_err());

    let result = unit_of_work.finish(true).await;
    assert!(result.is_err());
    assert_eq!(FakeStore::count(&store.commits), 0);
    assert_eq!(FakeStore::count(&store.rollbacks), 1);
    Ok(())
}

#[test]
fn session_rejects_foreign_backend_state() {
    let session = Session::new(17_u32);
    assert!(session.state::<u32>().is_ok());
    assert!(session.state::<String>().is_err());
}

#[test]
fn context_without_session_requires_a_unit_of_work() {
    let result = CallContext::new().require_session().map(Session::id);
    assert!(matches!(result, Err(AppError::Internal(_))));
}
