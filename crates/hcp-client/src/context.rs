//! Per-reconcile context
//!
//! Every client call takes a `ReconcileContext`. Cancelling its token makes
//! in-flight and subsequent calls return `ClientError::Cancelled`.

use crate::error::ClientError;
use std::future::Future;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct ReconcileContext {
    token: CancellationToken,
}

impl ReconcileContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context tied to an existing token, typically a child of the
    /// process-wide shutdown token
    pub fn with_token(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Child context: cancelled when this one is, cancellable on its own
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Drive `fut` to completion unless the context is cancelled first
    pub async fn run<F, T>(&self, fut: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        if self.token.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(ClientError::Cancelled),
            result = fut => result,
        }
    }
}
