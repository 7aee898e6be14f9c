//! Dispatcher core - the only code inside a timed window.

// Nothing here may allocate per dispatch
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use crate::adapter::Handler;
use http::{Method, Request, StatusCode};

/// Response sink that keeps status codes only.
///
/// Counts matched (2xx) and unmatched dispatches and remembers the last status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSink {
    matched: u64,
    unmatched: u64,
    last: Option<StatusCode>,
}

impl StatusSink {
    /// Empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one response status
    #[inline]
    pub fn record(&mut self, status: StatusCode) {
        if status.is_success() {
            self.matched += 1;
        } else {
            self.unmatched += 1;
        }
        self.last = Some(status);
    }

    /// Dispatches that resolved to a route
    #[must_use]
    pub fn matched(&self) -> u64 {
        self.matched
    }

    /// Dispatches that did not resolve
    #[must_use]
    pub fn unmatched(&self) -> u64 {
        self.unmatched
    }

    /// Status of the most recent dispatch
    #[must_use]
    pub fn last_status(&self) -> Option<StatusCode> {
        self.last
    }

    /// Total recorded statuses
    #[must_use]
    pub fn total(&self) -> u64 {
        self.matched + self.unmatched
    }
}

/// Drives one handler with prepared requests.
pub struct RequestDispatcher<'h> {
    handler: &'h dyn Handler,
    sink: StatusSink,
    dispatches: u64,
}

impl<'h> RequestDispatcher<'h> {
    /// Dispatcher bound to `handler` with an empty sink
    #[must_use]
    pub fn new(handler: &'h dyn Handler) -> Self {
        Self {
            handler,
            sink: StatusSink::new(),
            dispatches: 0,
        }
    }

    /// Dispatch one request and return the recorded status
    #[inline]
    pub fn dispatch(&mut self, request: &Request<()>) -> StatusCode {
        self.handler.dispatch(request, &mut self.sink);
        self.dispatches += 1;
        self.sink.last_status().unwrap_or(StatusCode::NOT_FOUND)
    }

    /// One measured operation: every request in order
    #[inline]
    pub fn run_operation(&mut self, requests: &[Request<()>]) {
        for request in requests {
            self.handler.dispatch(request, &mut self.sink);
        }
        self.dispatches += requests.len() as u64;
    }

    /// Dispatches performed since creation or the last [`reset`](Self::reset)
    #[must_use]
    pub fn dispatches(&self) -> u64 {
        self.dispatches
    }

    /// The status sink
    #[must_use]
    pub fn sink(&self) -> &StatusSink {
        &self.sink
    }

    /// Clear the sink and the dispatch counter
    pub fn reset(&mut self) {
        self.sink = StatusSink::new();
        self.dispatches = 0;
    }
}

/// Build a bodiless request for `method` and `path`.
///
/// Every adapter gets requests from this constructor so construction cost is identical
/// and always paid outside the timed region.
///
/// # Errors
///
/// Returns [`http::Error`] when `path` is not a valid URI.
pub fn synthetic_request(method: &Method, path: &str) -> Result<Request<()>, http::Error> {
    Request::builder().method(method.clone()).uri(path).body(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::RouteMatch;
    use crate::router::ParamVec;

    struct OnlyUsers;

    impl Handler for OnlyUsers {
        fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch> {
            (method == Method::GET && path == "/1/users").then(|| RouteMatch {
                route: 0,
                params: ParamVec::new(),
            })
        }
    }

    #[test]
    fn test_sink_counts_statuses() {
        let mut sink = StatusSink::new();
        sink.record(StatusCode::OK);
        sink.record(StatusCode::NOT_FOUND);
        sink.record(StatusCode::OK);
        assert_eq!(sink.matched(), 2);
        assert_eq!(sink.unmatched(), 1);
        assert_eq!(sink.total(), 3);
        assert_eq!(sink.last_status(), Some(StatusCode::OK));
    }

    #[test]
    fn test_dispatch_records_match_and_miss() {
        let handler = OnlyUsers;
        let mut dispatcher = RequestDispatcher::new(&handler);
        let hit = synthetic_request(&Method::GET, "/1/users").unwrap();
        let miss = synthetic_request(&Method::GET, "/1/roles").unwrap();

        assert_eq!(dispatcher.dispatch(&hit), StatusCode::OK);
        assert_eq!(dispatcher.dispatch(&miss), StatusCode::NOT_FOUND);
        assert_eq!(dispatcher.dispatches(), 2);
        assert_eq!(dispatcher.sink().matched(), 1);
    }

    #[test]
    fn test_run_operation_counts_every_request() {
        let handler = OnlyUsers;
        let mut dispatcher = RequestDispatcher::new(&handler);
        let requests: Vec<_> = ["/1/users", "/1/users", "/nope"]
            .iter()
            .map(|p| synthetic_request(&Method::GET, p).unwrap())
            .collect();

        dispatcher.run_operation(&requests);
        dispatcher.run_operation(&requests);
        assert_eq!(dispatcher.dispatches(), 6);
        assert_eq!(dispatcher.sink().unmatched(), 2);

        dispatcher.reset();
        assert_eq!(dispatcher.dispatches(), 0);
        assert_eq!(dispatcher.sink().total(), 0);
    }

    #[test]
    fn test_synthetic_request_rejects_bad_uri() {
        assert!(synthetic_request(&Method::GET, "/a b").is_err());
    }
}
