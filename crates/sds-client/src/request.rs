//! SDS Client Requests
//!
//! Timeout and retry policy applied around every store call.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use crate::config::ClientConfig;
use sds_common::{Result, SdsError};
use std::future::Future;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Run `call` until it succeeds, fails with a non-retryable error, or the
/// retry budget is spent. Each attempt is bounded by the request timeout.
pub async fn execute<T, F, Fut>(config: &ClientConfig, operation: &'static str, call: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        let outcome = match timeout(config.timeout.request, call()).await {
            Ok(result) => result,
            Err(_) => Err(SdsError::Timeout(format!(
                "{} did not complete within {:?}",
                operation, config.timeout.request
            ))),
        };

        match outcome {
            Err(e) if e.is_retryable() && attempt < config.retry.max_retries => {
                let delay = config.retry.delay_for_attempt(attempt);
                attempt += 1;
                warn!(operation, attempt, ?delay, error = %e, "retrying store call");
                sleep(delay).await;
            }
            Err(e) => {
                debug!(operation, attempt, error = %e, "store call failed");
                return Err(e);
            }
            Ok(value) => return Ok(value),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
