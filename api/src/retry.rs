use http::{header::RETRY_AFTER, StatusCode};
use reqwest::{blocking::Response, Result};
use std::sync::atomic::{AtomicBool, Ordering::SeqCst};
use std::thread::sleep;
use std::time::Duration;

/// Upper bound on the wait between two retries.
pub const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// When to retry failed requests to the management API.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RetryStrategy {
    /// Never retry the first request made by the client, so a wrong endpoint or a missing
    /// network fails immediately. Every later request is retried.
    Automatic,
    /// Always attempt to retry requests.
    Always,
}

/// Retry settings for transient failures (timeouts, connection errors, 5xx and 429).
#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    pub strategy: RetryStrategy,
    /// Maximum number of retries to attempt.
    pub max_retry_count: u8,
    /// Amount of time to wait for first retry.
    pub base_wait: Duration,
    /// The wait before retry N is `base_wait * backoff_factor ^ N`, capped at [`MAX_BACKOFF`],
    /// unless the response asked for a specific delay with `Retry-After`.
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: RetryStrategy::Automatic,
            max_retry_count: 5,
            base_wait: Duration::from_secs(5),
            backoff_factor: 2.0,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Retrier {
    config: RetryConfig,
    is_first_request: AtomicBool,
}

impl Retrier {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            is_first_request: AtomicBool::new(true),
        }
    }

    fn should_retry(status: StatusCode) -> bool {
        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
    }

    fn backoff(&self, i_retry: u8) -> Duration {
        let wait_factor = self.config.backoff_factor.powi(i_retry.into());
        let seconds = self.config.base_wait.as_secs_f64() * wait_factor;
        // NaN survives the clamp and falls back to the cap.
        Duration::try_from_secs_f64(seconds.clamp(0.0, MAX_BACKOFF.as_secs_f64()))
            .unwrap_or(MAX_BACKOFF)
    }

    pub fn with_retries(&self, send_request: impl Fn() -> Result<Response>) -> Result<Response> {
        if self.is_first_request.swap(false, SeqCst)
            && self.config.strategy == RetryStrategy::Automatic
        {
            return send_request();
        }

        for i_retry in 0..self.config.max_retry_count {
            match send_request() {
                Ok(response) if Self::should_retry(response.status()) => {
                    let duration = retry_after(&response).unwrap_or_else(|| self.backoff(i_retry));
                    log::warn!(
                        "{} for {} - retrying after {:?}.",
                        response.status(),
                        response.url(),
                        duration
                    );
                    sleep(duration)
                }
                Err(error) if error.is_timeout() || error.is_connect() || error.is_request() => {
                    let duration = self.backoff(i_retry);
                    log::warn!("{} - retrying after {:?}.", error, duration);
                    sleep(duration)
                }
                // If anything else, just return it immediately
                result => return result,
            }
        }

        // On last retry don't handle the error, just propagate all errors.
        send_request()
    }
}

/// Delay requested by the server through a `Retry-After: <seconds>` header.
pub(crate) fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::{retry_after, Retrier, RetryConfig, RetryStrategy, MAX_BACKOFF};
    use mockito::{mock, server_address};
    use reqwest::blocking::get;
    use std::time::Duration;

    fn no_wait(strategy: RetryStrategy, max_retry_count: u8) -> Retrier {
        Retrier::new(RetryConfig {
            strategy,
            max_retry_count,
            base_wait: Duration::from_secs(0),
            backoff_factor: 0.0,
        })
    }

    #[test]
    fn test_always_retry() {
        let mut handler = no_wait(RetryStrategy::Always, 5);

        // Does not attempt to retry on success
        let ok = mock("GET", "/").expect(1).create();
        assert_eq!(
            handler
                .with_retries(|| get(format!("http://{}", server_address())))
                .unwrap()
                .status(),
            200
        );
        ok.assert();

        // Retries up to N times on server errors.
        for i_retry in 0..5 {
            let err = mock("GET", "/")
                .with_status(503)
                .expect((i_retry + 1).into())
                .create();
            handler.config.max_retry_count = i_retry;
            assert_eq!(
                handler
                    .with_retries(|| get(format!("http://{}", server_address())))
                    .unwrap()
                    .status(),
                503
            );
            err.assert();
        }
    }

    #[test]
    fn test_automatic_retry_skips_first_request() {
        let handler = no_wait(RetryStrategy::Automatic, 3);

        let err = mock("GET", "/").with_status(500).expect(1).create();
        assert_eq!(
            handler
                .with_retries(|| get(format!("http://{}", server_address())))
                .unwrap()
                .status(),
            500
        );
        err.assert();

        let err = mock("GET", "/").with_status(500).expect(4).create();
        assert_eq!(
            handler
                .with_retries(|| get(format!("http://{}", server_address())))
                .unwrap()
                .status(),
            500
        );
        err.assert();
    }

    #[test]
    fn test_client_errors_are_not_retried() {
        let handler = no_wait(RetryStrategy::Always, 3);

        let conflict = mock("GET", "/").with_status(409).expect(1).create();
        assert_eq!(
            handler
                .with_retries(|| get(format!("http://{}", server_address())))
                .unwrap()
                .status(),
            409
        );
        conflict.assert();
    }

    #[test]
    fn test_backoff() {
        let retrier = |base_wait, backoff_factor| {
            Retrier::new(RetryConfig {
                strategy: RetryStrategy::Always,
                max_retry_count: 5,
                base_wait,
                backoff_factor,
            })
        };

        let doubling = retrier(Duration::from_secs(5), 2.0);
        assert_eq!(doubling.backoff(0), Duration::from_secs(5));
        assert_eq!(doubling.backoff(3), Duration::from_secs(40));
        assert_eq!(doubling.backoff(255), MAX_BACKOFF);

        assert_eq!(retrier(Duration::MAX, 1.0).backoff(1), MAX_BACKOFF);
        assert_eq!(retrier(Duration::from_secs(1), f64::MAX).backoff(2), MAX_BACKOFF);
        assert_eq!(retrier(Duration::from_secs(1), f64::NAN).backoff(1), MAX_BACKOFF);
        assert_eq!(
            retrier(Duration::from_secs(1), -2.0).backoff(1),
            Duration::ZERO
        );
    }

    #[test]
    fn test_retry_after_header() {
        let _throttled = mock("GET", "/")
            .with_status(429)
            .with_header("retry-after", "17")
            .create();
        let response = get(format!("http://{}", server_address())).unwrap();
        assert_eq!(retry_after(&response), Some(Duration::from_secs(17)));

        let _plain = mock("GET", "/plain").with_status(200).create();
        let response = get(format!("http://{}/plain", server_address())).unwrap();
        assert_eq!(retry_after(&response), None);
    }
}
