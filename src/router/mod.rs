//! # Router Module
//!
//! In-tree routing engines benchmarked by the harness.
//!
//! ## Engines
//!
//! - [`RadixRouter`] - segment radix tree with static-before-parameter precedence and
//!   backtracking. Brace syntax, fixed-depth only (no catch-all).
//! - [`RegexRouter`] - one anchored regex per route, linear scan in registration order.
//!   Brace syntax with `{*name}` catch-all.
//!
//! Both return the id the route was registered with plus the extracted parameters.
//! Adapters in [`crate::adapter`] wrap them behind the common handler contract.
//!
//! ## Example
//!
//! ```rust
//! use brrtbench::router::RadixRouter;
//! use http::Method;
//!
//! let mut router = RadixRouter::new();
//! router.insert(Method::GET, "/1/classes/{className}", 0).unwrap();
//!
//! let (id, params) = router.route(&Method::GET, "/1/classes/go").unwrap();
//! assert_eq!(id, 0);
//! assert_eq!(params[0].1, "go");
//! ```

mod radix;
mod regex_table;

use smallvec::SmallVec;
use std::sync::Arc;

pub use radix::{RadixInsertError, RadixRouter};
pub use regex_table::RegexRouter;

/// Maximum number of path parameters before heap allocation.
/// Most REST APIs have ≤4 path params (e.g., /users/{id}/posts/{postId}).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names use `Arc<str>`: they come from the route table built at startup,
/// so a match clones a pointer. Values are per-request data from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;
