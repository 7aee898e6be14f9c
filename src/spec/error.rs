use std::fmt;
use std::path::PathBuf;

/// Reason a canonical pattern was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Pattern does not start with `/`
    MissingLeadingSlash,
    /// Pattern contains `//` or a trailing slash
    EmptySegment,
    /// `:` or `*` with nothing after it
    EmptyParamName,
    /// Parameter name with characters outside `[A-Za-z0-9_]`
    InvalidParamName {
        /// The rejected name
        name: String,
    },
    /// The same parameter name appears twice in one pattern
    DuplicateParamName {
        /// The repeated name
        name: String,
    },
    /// A `*name` segment that is not the last segment
    CatchAllNotLast {
        /// The catch-all name
        name: String,
    },
    /// Literal segment containing `{`, `}` or a `:`/`*` outside the first position
    ReservedCharacter {
        /// The offending segment
        segment: String,
    },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::MissingLeadingSlash => write!(f, "pattern must start with '/'"),
            PatternError::EmptySegment => {
                write!(f, "pattern contains an empty segment or a trailing slash")
            }
            PatternError::EmptyParamName => write!(f, "parameter without a name"),
            PatternError::InvalidParamName { name } => {
                write!(f, "invalid parameter name '{name}' (expected [A-Za-z0-9_]+)")
            }
            PatternError::DuplicateParamName { name } => {
                write!(f, "parameter '{name}' appears more than once")
            }
            PatternError::CatchAllNotLast { name } => {
                write!(f, "catch-all '*{name}' must be the last segment")
            }
            PatternError::ReservedCharacter { segment } => {
                write!(f, "literal segment '{segment}' contains a reserved character")
            }
        }
    }
}

impl std::error::Error for PatternError {}

/// Errors raised while building or loading a [`RouteSpec`](super::RouteSpec).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteSpecError {
    /// The canonical pattern could not be parsed
    InvalidPattern {
        /// HTTP method of the rejected route
        method: String,
        /// The rejected pattern
        pattern: String,
        /// Why it was rejected
        reason: PatternError,
    },
    /// The method is not a valid HTTP token
    InvalidMethod {
        /// The rejected method
        method: String,
    },
    /// Two routes share the same `(method, pattern)`
    DuplicateRoute {
        /// HTTP method
        method: String,
        /// Duplicated pattern
        pattern: String,
    },
    /// The table has no routes
    EmptyTable {
        /// Name of the table
        name: String,
    },
    /// The route file could not be read
    Io {
        /// Route file path
        path: PathBuf,
        /// Underlying I/O error message
        message: String,
    },
    /// The route file could not be deserialized
    Parse {
        /// Route file path
        path: PathBuf,
        /// Deserializer error message
        message: String,
    },
    /// The route file extension is not `.toml`, `.yaml`, `.yml` or `.json`
    UnsupportedFormat {
        /// Route file path
        path: PathBuf,
    },
}

impl fmt::Display for RouteSpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteSpecError::InvalidPattern {
                method,
                pattern,
                reason,
            } => write!(f, "invalid route {method} {pattern}: {reason}"),
            RouteSpecError::InvalidMethod { method } => {
                write!(f, "invalid HTTP method '{method}'")
            }
            RouteSpecError::DuplicateRoute { method, pattern } => {
                write!(f, "route {method} {pattern} is defined more than once")
            }
            RouteSpecError::EmptyTable { name } => {
                write!(f, "route table '{name}' contains no routes")
            }
            RouteSpecError::Io { path, message } => {
                write!(f, "failed to read route file {}: {message}", path.display())
            }
            RouteSpecError::Parse { path, message } => {
                write!(f, "failed to parse route file {}: {message}", path.display())
            }
            RouteSpecError::UnsupportedFormat { path } => write!(
                f,
                "unsupported route file format {} (expected .toml, .yaml, .yml or .json)",
                path.display()
            ),
        }
    }
}

impl std::error::Error for RouteSpecError {}
