//! Deterministic test doubles for the harvester.
//!
//! [`StubTransport`] replays scripted replies without touching the network,
//! [`RecordingSleeper`] captures requested delays instead of waiting, and
//! [`MemorySink`] collects written rows in memory.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use groomer_core::OverpassQuery;
//! use groomer_data::overpass::{EndpointPool, ResilientFetcher, RetryPolicy};
//! use groomer_data::test_support::{RecordingSleeper, StubTransport};
//!
//! let transport = StubTransport::new()
//!     .then_status(429)
//!     .then_ok(r#"{"elements":[]}"#);
//! let sleeper = RecordingSleeper::default();
//! let pool = EndpointPool::new(["http://a.test/", "http://b.test/"]).expect("valid pool");
//! let policy = RetryPolicy { max_attempts: 3, base_delay: Duration::from_secs(1) };
//! let fetcher = ResilientFetcher::new(&transport, pool, policy, &sleeper);
//!
//! let payload = fetcher.fetch(&OverpassQuery::new("q")).expect("second attempt succeeds");
//! assert!(payload.elements.is_empty());
//! assert_eq!(sleeper.recorded(), vec![Duration::from_secs(1)]);
//! ```

use std::{cell::RefCell, collections::VecDeque, time::Duration};

use groomer_core::{OutputRow, OverpassQuery};

use crate::overpass::{Endpoint, HttpReply, OverpassTransport, TransportError};
use crate::pacing::Sleeper;
use crate::writer::{RowSink, WriterError};

type Reply = Result<HttpReply, TransportError>;

/// Scripted [`OverpassTransport`].
///
/// Replies are consumed in order; once the script runs out the fallback reply
/// (if any) is repeated, otherwise a network error is returned.
#[derive(Debug, Default)]
pub struct StubTransport {
    script: RefCell<VecDeque<Reply>>,
    fallback: Option<Reply>,
    endpoints: RefCell<Vec<String>>,
    queries: RefCell<Vec<String>>,
}

impl StubTransport {
    /// Create a transport with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport answering every request with `status` and an empty body.
    #[must_use]
    pub fn always_status(status: u16) -> Self {
        Self::new().otherwise(Ok(HttpReply {
            status,
            body: String::new(),
        }))
    }

    /// Create a transport answering every request with HTTP 200 and `body`.
    #[must_use]
    pub fn always_ok(body: &str) -> Self {
        Self::new().otherwise(Ok(HttpReply {
            status: 200,
            body: body.to_owned(),
        }))
    }

    /// Queue an HTTP 200 reply with `body`.
    #[must_use]
    pub fn then_ok(self, body: &str) -> Self {
        self.then(Ok(HttpReply {
            status: 200,
            body: body.to_owned(),
        }))
    }

    /// Queue a reply with `status` and an empty body.
    #[must_use]
    pub fn then_status(self, status: u16) -> Self {
        self.then(Ok(HttpReply {
            status,
            body: String::new(),
        }))
    }

    /// Queue a timeout.
    #[must_use]
    pub fn then_timeout(self) -> Self {
        self.then(Err(TransportError::Timeout {
            url: "http://stub.test/".to_owned(),
            timeout_secs: 180,
        }))
    }

    /// Queue an arbitrary reply.
    #[must_use]
    pub fn then(self, reply: Reply) -> Self {
        self.script.borrow_mut().push_back(reply);
        self
    }

    /// Reply used after the script is exhausted.
    #[must_use]
    pub fn otherwise(mut self, reply: Reply) -> Self {
        self.fallback = Some(reply);
        self
    }

    /// Endpoints contacted so far, in call order.
    #[must_use]
    pub fn endpoints_called(&self) -> Vec<String> {
        self.endpoints.borrow().clone()
    }

    /// Query documents received so far, in call order.
    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        self.queries.borrow().clone()
    }
}

impl OverpassTransport for StubTransport {
    fn post(&self, endpoint: &Endpoint, query: &OverpassQuery) -> Reply {
        self.endpoints.borrow_mut().push(endpoint.to_string());
        self.queries.borrow_mut().push(query.to_string());
        let scripted = self.script.borrow_mut().pop_front();
        scripted
            .or_else(|| self.fallback.clone())
            .unwrap_or_else(|| {
                Err(TransportError::Network {
                    url: endpoint.to_string(),
                    message: "stub script exhausted".to_owned(),
                })
            })
    }
}

/// [`Sleeper`] that records requested durations and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    recorded: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Durations requested so far, in call order.
    #[must_use]
    pub fn recorded(&self) -> Vec<Duration> {
        self.recorded.borrow().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.recorded.borrow_mut().push(duration);
    }
}

/// [`RowSink`] that keeps rows in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Rows written so far.
    pub rows: Vec<OutputRow>,
}

impl RowSink for MemorySink {
    fn write_row(&mut self, row: &OutputRow) -> Result<(), WriterError> {
        self.rows.push(row.clone());
        Ok(())
    }
}
