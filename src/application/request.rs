use crate::application::error::ApplicationError;
use crate::Result;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    Resolved,
    Failed,
    Cancelled,
}

impl RequestState {
    fn of<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => RequestState::Resolved,
            Err(ApplicationError::Cancelled) => RequestState::Cancelled,
            Err(_) => RequestState::Failed,
        }
    }
}

/// Handle to a resolution request running on the tokio runtime.
///
/// Awaiting the handle yields the request's result. Cancelling it, or dropping
/// it before completion, drops the in-flight operation together with any
/// gateway call it is waiting on.
pub struct RequestHandle<T> {
    task: Option<JoinHandle<Result<T>>>,
    token: CancellationToken,
    outcome: Arc<OnceLock<RequestState>>,
}

impl<T> RequestHandle<T>
where
    T: Send + 'static,
{
    pub(crate) fn spawn<F>(operation: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let token = CancellationToken::new();
        let outcome = Arc::new(OnceLock::new());
        let task = tokio::spawn({
            let token = token.clone();
            let outcome = outcome.clone();
            async move {
                let result = tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!("request cancelled before completion");
                        Err(ApplicationError::Cancelled)
                    }
                    result = operation => result,
                };
                let _ = outcome.set(RequestState::of(&result));
                result
            }
        });

        Self {
            task: Some(task),
            token,
            outcome,
        }
    }
}

impl<T> RequestHandle<T> {
    /// Snapshot of the request's progress. Once the operation has produced
    /// its result the state no longer changes, even if `cancel` is called
    /// afterwards.
    pub fn state(&self) -> RequestState {
        if let Some(state) = self.outcome.get() {
            return *state;
        }
        if self.token.is_cancelled() {
            return RequestState::Cancelled;
        }
        match &self.task {
            Some(task) if !task.is_finished() => RequestState::Pending,
            // Finished without recording an outcome: the operation panicked.
            Some(_) => RequestState::Failed,
            None => RequestState::Cancelled,
        }
    }

    /// Cancels the request. Awaiting the handle afterwards yields
    /// [`ApplicationError::Cancelled`] unless the request had already finished.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Token that cancels this request when fired.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl<T> Future for RequestHandle<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(task) = self.task.as_mut() else {
            return Poll::Ready(Err(ApplicationError::Cancelled));
        };

        let result = match Pin::new(task).poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(Ok(result)) => result,
            Poll::Ready(Err(err)) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Poll::Ready(Err(_)) => Err(ApplicationError::Cancelled),
        };
        self.task = None;
        Poll::Ready(result)
    }
}

impl<T> Drop for RequestHandle<T> {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            if !task.is_finished() {
                self.token.cancel();
                task.abort();
            }
        }
    }
}
