//! Blocking on state-provider futures with a deadline.
//!
//! Evaluation is synchronous; the only asynchronous collaborator is the state
//! provider. Its future runs through [`block_on_timeout`], which races it
//! against an [`async_io::Timer`].

use futures_lite::future::block_on;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::warn;

/// Returns `Some(output)` if `future` completes within `timeout`, else `None`.
///
/// A `warn!` is emitted on every timeout so slow subsystems show up in logs.
pub(crate) fn block_on_timeout<F: Future>(future: F, timeout: Duration) -> Option<F::Output> {
    let start = Instant::now();
    let result = block_on(async {
        futures_lite::future::or(async { Some(future.await) }, async {
            async_io::Timer::after(timeout).await;
            None
        })
        .await
    });
    if result.is_none() {
        warn!(
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "state retrieval timed out",
        );
    }
    result
}
