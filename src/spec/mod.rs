//! # Route Spec Module
//!
//! Canonical, engine-agnostic route tables.
//!
//! Every router under test is fed from one [`RouteSpec`]. Patterns are written in the
//! canonical colon notation:
//!
//! - literal segments are copied verbatim (`/1/users`)
//! - `:name` is a named parameter occupying a whole segment (`/1/users/:objectId`)
//! - `*name` is a trailing catch-all (`/static/*filepath`)
//!
//! The [`translate`](crate::translate) module rewrites these patterns into each engine's
//! native syntax, so there is exactly one route literal per route in the whole harness.
//!
//! Tables can be built in code, taken from the built-in [`parse_api`] table, or loaded
//! from a TOML, YAML or JSON file with [`load_route_spec`].

mod error;
mod load;
mod parse_api;
mod types;

pub use error::{PatternError, RouteSpecError};
pub use load::{load_route_spec, route_spec_from_str, RouteDef, RouteFile, FileFormat};
pub use parse_api::{parse_api, PARSE_API_ROUTES};
pub use types::{parse_canonical, ReferenceMatch, Route, RouteSpec, Segment};
