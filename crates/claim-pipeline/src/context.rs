//! Request-scoped correlation id.
//!
//! Each `check` run installs its request id in a task-local slot so nested
//! stages and collaborators can read it without it being threaded through
//! their signatures. Separate runs never observe each other's id, even when
//! polled concurrently on the same thread.

use std::future::Future;

tokio::task_local! {
    static REQUEST_ID: String;
}

/// The request id of the enclosing run, if any.
#[must_use]
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(Clone::clone).ok()
}

/// Run `fut` with `request_id` as the current request id.
pub async fn scope<F: Future>(request_id: String, fut: F) -> F::Output {
    REQUEST_ID.scope(request_id, fut).await
}
