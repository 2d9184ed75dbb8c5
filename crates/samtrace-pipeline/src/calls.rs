//! Concurrent oracle dispatch
//!
//! The oracle trait is synchronous, so each call runs on the blocking pool
//! wrapped in a timeout. Calls go out in batches of the configured
//! concurrency limit; results are keyed by the request's subject, so
//! completion order never matters.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use samtrace_domain::traits::{ExtractionOracle, OracleRequest};
use tracing::debug;

/// Dispatch a set of requests and collect each subject's result.
///
/// A failure (oracle error, timeout, or a lost blocking task) becomes an
/// `Err(message)` for that subject only; nothing here aborts the batch.
pub(crate) async fn dispatch<O>(
    oracle: &Arc<O>,
    requests: Vec<OracleRequest>,
    limit: usize,
    timeout: Duration,
) -> Vec<(String, Result<String, String>)>
where
    O: ExtractionOracle + Send + Sync + 'static,
    O::Error: Display + Send + 'static,
{
    let mut results = Vec::with_capacity(requests.len());
    let mut pending = requests.into_iter().peekable();

    while pending.peek().is_some() {
        let batch: Vec<OracleRequest> = pending.by_ref().take(limit.max(1)).collect();
        debug!("dispatching {} oracle calls", batch.len());

        let futures = batch.into_iter().map(|request| {
            let oracle = Arc::clone(oracle);
            async move {
                let subject = request.subject.clone();
                let kind = request.kind;
                let handle =
                    tokio::task::spawn_blocking(move || oracle.extract(&request));
                let outcome = match tokio::time::timeout(timeout, handle).await {
                    Ok(Ok(Ok(body))) => Ok(body),
                    Ok(Ok(Err(e))) => Err(format!("{} extraction failed: {}", kind, e)),
                    Ok(Err(e)) => Err(format!("{} extraction task failed: {}", kind, e)),
                    Err(_) => Err(format!(
                        "{} extraction timed out after {}s",
                        kind,
                        timeout.as_secs()
                    )),
                };
                (subject, outcome)
            }
        });

        results.extend(join_all(futures).await);
    }

    results
}
