//! # Dispatcher Module
//!
//! Issues synthetic requests through a built [`Handler`](crate::adapter::Handler) and drains
//! each response into a [`StatusSink`].
//!
//! ## Overview
//!
//! The dispatcher is the only code that runs inside a timed window. It:
//! - Accepts requests prepared ahead of time by [`synthetic_request`]
//! - Dispatches each one through the handler under test
//! - Records the status code and nothing else
//! - Counts dispatches so the per-operation dispatch count is observable
//!
//! ## Request Flow
//!
//! 1. The scenario builds its `http::Request<()>` values once, before any timing starts
//! 2. [`RequestDispatcher::run_operation`] hands each request to the handler
//! 3. The handler resolves the route and records 200 or 404 in the sink
//!
//! No response body is ever produced or buffered, so the measured cost is the router's.
//!
//! ```rust,ignore
//! use brrtbench::dispatcher::{synthetic_request, RequestDispatcher};
//!
//! let requests = vec![synthetic_request(&Method::GET, "/1/users")?];
//! let mut dispatcher = RequestDispatcher::new(handler.as_ref());
//! dispatcher.run_operation(&requests);
//! assert_eq!(dispatcher.sink().matched(), 1);
//! ```

mod core;

pub use self::core::{synthetic_request, RequestDispatcher, StatusSink};
