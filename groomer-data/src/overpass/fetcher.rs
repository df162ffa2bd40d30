//! Retrying query execution across the endpoint pool.
//!
//! Each round trip is classified into an [`AttemptOutcome`]. Retryable
//! outcomes (transport failures and any non-2xx status) trigger a linear
//! backoff and a move to the next mirror. A 2xx body that does not decode is
//! fatal for the fetch: mirrors tend to repeat the same malformed answer, so
//! the caller decides what to do next.

use std::time::Duration;

use groomer_core::OverpassQuery;
use log::{debug, warn};
use thiserror::Error;

use super::{
    Endpoint, EndpointPool, HttpReply, OverpassResponse, OverpassTransport, TransportError,
};
use crate::pacing::Sleeper;

/// Statuses the Overpass service uses when rate-limited or busy.
pub const OVERLOAD_STATUSES: [u16; 4] = [429, 502, 503, 504];

/// Default attempt budget per fetch.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;

/// Default backoff unit; attempt `n` waits `n + 1` units.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(1500);

/// Attempt budget and backoff schedule for one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum round trips per fetch.
    pub max_attempts: u32,
    /// Backoff unit multiplied by the 1-based attempt number.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BACKOFF_BASE,
        }
    }
}

impl RetryPolicy {
    /// Delay observed after the failed attempt numbered `attempt` (0-based).
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use groomer_data::overpass::RetryPolicy;
    ///
    /// let policy = RetryPolicy { max_attempts: 3, base_delay: Duration::from_millis(100) };
    /// assert_eq!(policy.backoff(0), Duration::from_millis(100));
    /// assert_eq!(policy.backoff(2), Duration::from_millis(300));
    /// ```
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt.saturating_add(1))
    }
}

/// Why an attempt may be retried on another mirror.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryableFailure {
    /// No reply arrived (timeout, connection failure).
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The mirror signalled overload.
    #[error("mirror overloaded (HTTP {status})")]
    Overloaded {
        /// HTTP status code.
        status: u16,
    },
    /// Any other non-2xx status.
    #[error("unexpected HTTP status {status}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
    },
}

/// Classified result of one round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// A 2xx reply with a decodable payload.
    Success(OverpassResponse),
    /// Worth trying again after a backoff.
    Retryable(RetryableFailure),
    /// A 2xx reply whose body could not be decoded.
    Fatal {
        /// Decoder error text.
        message: String,
    },
}

impl AttemptOutcome {
    /// Classify a transport result.
    ///
    /// # Examples
    /// ```
    /// use groomer_data::overpass::{AttemptOutcome, HttpReply, RetryableFailure};
    ///
    /// let busy = HttpReply { status: 503, body: String::new() };
    /// assert_eq!(
    ///     AttemptOutcome::classify(Ok(busy)),
    ///     AttemptOutcome::Retryable(RetryableFailure::Overloaded { status: 503 }),
    /// );
    /// ```
    #[must_use]
    pub fn classify(reply: Result<HttpReply, TransportError>) -> Self {
        let reply = match reply {
            Ok(reply) => reply,
            Err(err) => return Self::Retryable(RetryableFailure::Transport(err)),
        };
        if OVERLOAD_STATUSES.contains(&reply.status) {
            return Self::Retryable(RetryableFailure::Overloaded {
                status: reply.status,
            });
        }
        if !reply.is_success() {
            return Self::Retryable(RetryableFailure::UnexpectedStatus {
                status: reply.status,
            });
        }
        match serde_json::from_str::<OverpassResponse>(&reply.body) {
            Ok(payload) => Self::Success(payload),
            Err(err) => Self::Fatal {
                message: err.to_string(),
            },
        }
    }
}

/// Record of one round trip, kept only for the duration of a fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchAttempt<'a> {
    /// Position of the mirror in the pool.
    pub endpoint_index: usize,
    /// Mirror contacted for this attempt.
    pub endpoint: &'a Endpoint,
    /// 0-based attempt counter.
    pub attempt_number: u32,
    /// Classified reply.
    pub outcome: AttemptOutcome,
}

/// Definitive fetch failure; recoverable by the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Every attempt failed with a retryable outcome.
    #[error("all {attempts} attempts failed")]
    Exhausted {
        /// Attempts made.
        attempts: u32,
        /// Failure from the final attempt; `None` when the budget was zero.
        last: Option<RetryableFailure>,
    },
    /// A mirror answered 2xx with an undecodable body.
    #[error("malformed response from {endpoint}: {message}")]
    Malformed {
        /// Mirror that sent the body.
        endpoint: String,
        /// Decoder error text.
        message: String,
    },
}

/// Executes queries with round-robin failover and linear backoff.
#[derive(Debug)]
pub struct ResilientFetcher<T, S> {
    transport: T,
    pool: EndpointPool,
    policy: RetryPolicy,
    sleeper: S,
}

impl<T, S> ResilientFetcher<T, S>
where
    T: OverpassTransport,
    S: Sleeper,
{
    /// Combine a transport, mirror pool, retry policy, and sleeper.
    pub fn new(transport: T, pool: EndpointPool, policy: RetryPolicy, sleeper: S) -> Self {
        Self {
            transport,
            pool,
            policy,
            sleeper,
        }
    }

    /// Active retry policy.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Mirror pool used for selection.
    #[must_use]
    pub fn pool(&self) -> &EndpointPool {
        &self.pool
    }

    /// Sleeper shared with callers that pace their own work.
    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Run `query` until a mirror answers or the attempt budget runs out.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Exhausted`] when every attempt was retryable and
    /// [`FetchError::Malformed`] as soon as a 2xx body fails to decode.
    pub fn fetch(&self, query: &OverpassQuery) -> Result<OverpassResponse, FetchError> {
        let mut last = None;
        for attempt_number in 0..self.policy.max_attempts {
            let attempt = self.attempt(attempt_number, query);
            match attempt.outcome {
                AttemptOutcome::Success(payload) => return Ok(payload),
                AttemptOutcome::Fatal { message } => {
                    return Err(FetchError::Malformed {
                        endpoint: attempt.endpoint.to_string(),
                        message,
                    });
                }
                AttemptOutcome::Retryable(failure) => {
                    warn!(
                        "attempt {}/{} against {} failed: {failure}",
                        attempt_number + 1,
                        self.policy.max_attempts,
                        attempt.endpoint
                    );
                    last = Some(failure);
                    if attempt_number + 1 < self.policy.max_attempts {
                        self.sleeper.sleep(self.policy.backoff(attempt_number));
                    }
                }
            }
        }
        Err(FetchError::Exhausted {
            attempts: self.policy.max_attempts,
            last,
        })
    }

    fn attempt(&self, attempt_number: u32, query: &OverpassQuery) -> FetchAttempt<'_> {
        let endpoint_index = self.pool.index_for(attempt_number);
        let endpoint = self.pool.select(attempt_number);
        debug!(
            "attempt {} using mirror {endpoint_index} ({endpoint})",
            attempt_number + 1
        );
        FetchAttempt {
            endpoint_index,
            endpoint,
            attempt_number,
            outcome: AttemptOutcome::classify(self.transport.post(endpoint, query)),
        }
    }
}
