use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tokio_util::sync::{CancellationToken, DropGuard};
use wordhoard_application::CallContext;

/// Call context scoped to one request.
///
/// Axum drops the handler future when the client disconnects; the drop
/// guard then cancels the context, so an open unit of work rolls back
/// instead of committing work nobody is waiting for.
pub struct RequestContext {
    call: CallContext,
    _cancel_on_drop: DropGuard,
}

impl RequestContext {
    pub fn new() -> Self {
        let cancellation = CancellationToken::new();
        Self {
            call: CallContext::with_cancellation(cancellation.clone()),
            _cancel_on_drop: cancellation.drop_guard(),
        }
    }

    pub fn call(&self) -> &CallContext {
        &self.call
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(_parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::new())
    }
}
