//! # Adapter Module
//!
//! The capability contract that makes heterogeneous routing engines comparable.
//!
//! A [`RouterAdapter`] names an engine, declares its native pattern [`Syntax`](crate::translate::Syntax)
//! and builds a fresh [`Handler`] from a translated route list. The harness never talks
//! to an engine directly: it translates the canonical table with the adapter's syntax,
//! hands the result to [`build_handler`] (which rejects duplicate registrations as
//! harness misuse before the engine sees them) and dispatches through the handler.
//!
//! ## Built-in adapters
//!
//! | name      | engine                        | syntax              |
//! |-----------|-------------------------------|---------------------|
//! | `radix`   | [`crate::router::RadixRouter`] | `{name}`, no catch-all |
//! | `regex`   | [`crate::router::RegexRouter`] | `{name}`, `{*name}` |
//! | `matchit` | `matchit::Router`             | `:name`, `*name`    |
//!
//! ## Adding an engine
//!
//! ```rust,ignore
//! struct MyAdapter;
//!
//! impl RouterAdapter for MyAdapter {
//!     fn name(&self) -> &'static str { "mine" }
//!     fn syntax(&self) -> Syntax { Syntax::COLON }
//!     fn build(&self, routes: &[TranslatedRoute]) -> Result<Box<dyn Handler>, AdapterBuildError> {
//!         // register each route.pattern under route.method, returning route.index on match
//!     }
//! }
//!
//! let mut registry = AdapterRegistry::with_defaults();
//! registry.register(Box::new(MyAdapter))?;
//! ```

mod core;
mod matchit_tree;
mod radix;
mod regex_table;
mod registry;

pub use self::core::{
    build_handler, AdapterBuildError, Handler, RouteMatch, RouterAdapter, SkippedAdapter,
};
pub use matchit_tree::MatchitAdapter;
pub use radix::RadixAdapter;
pub use regex_table::RegexAdapter;
pub use registry::{AdapterRegistry, HandlerRegistry, RegistryError};
