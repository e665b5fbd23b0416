//! Bounded, cancellable HEAD probes.
//!
//! Every outbound probe a collector issues goes through [`head`]: it is
//! capped by a fixed timeout and abandoned as soon as the context's
//! cancellation token fires. Probes are never retried.

use std::time::Duration;

use futures::future::join_all;
use tracing::debug;

use crate::context::{PageContext, ProbeResponse};
use crate::error::{CollectionError, CollectionResult};
use crate::metrics::METRICS;

/// Default upper bound for a single probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Issue one HEAD probe through the context.
///
/// Expiry maps to `CollectionError{timeout}`, cancellation to
/// `CollectionError{cancelled}`.
pub async fn head(
    ctx: &dyn PageContext,
    url: &str,
    timeout: Duration,
) -> CollectionResult<ProbeResponse> {
    let token = ctx.cancellation();
    if token.is_cancelled() {
        return Err(CollectionError::cancelled());
    }

    METRICS.record_probe();
    debug!(url = %url, timeout_ms = timeout.as_millis() as u64, "issuing HEAD probe");

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(CollectionError::cancelled()),
        res = tokio::time::timeout(timeout, ctx.fetch_head(url)) => match res {
            Ok(inner) => inner,
            Err(_) => {
                METRICS.record_probe_timeout();
                Err(CollectionError::timeout(format!(
                    "HEAD {} timed out after {}ms",
                    url,
                    timeout.as_millis()
                )))
            }
        },
    }
}

/// Probe several URLs concurrently. Results keep the input order.
pub async fn head_all(
    ctx: &dyn PageContext,
    urls: &[String],
    timeout: Duration,
) -> Vec<CollectionResult<ProbeResponse>> {
    join_all(urls.iter().map(|url| head(ctx, url, timeout))).await
}
