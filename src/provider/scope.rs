use anyhow::Result;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use super::{RemoteSession, SessionProvider};

/// Run `body` inside a freshly provisioned session
///
/// The session is ended exactly once after `body` completes, whether it
/// returned `Ok`, returned `Err` or panicked. A failed `create` never reaches
/// `body` and issues no `destroy`. A failed `destroy` is logged and does not
/// mask the body's own outcome.
pub async fn with_session<P, F, Fut, T>(provider: &P, purpose: &str, body: F) -> Result<T>
where
    P: SessionProvider + ?Sized,
    F: FnOnce(RemoteSession) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let session = provider.create(purpose).await?;
    let session_id = session.id.clone();

    let outcome = AssertUnwindSafe(body(session)).catch_unwind().await;

    if let Err(e) = provider.destroy(&session_id).await {
        log::warn!("Failed to end session {}: {:#}", session_id, e);
    }

    match outcome {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
