use super::core::{build_handler, Handler, RouterAdapter, SkippedAdapter};
use super::{MatchitAdapter, RadixAdapter, RegexAdapter};
use crate::spec::RouteSpec;
use crate::translate::translate_spec;
use std::fmt;
use tracing::{info, warn};

/// Registry error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two adapters registered under the same name
    DuplicateName {
        /// The repeated name
        name: String,
    },
    /// A selection named an adapter that is not registered
    UnknownAdapter {
        /// Requested name
        name: String,
        /// Registered names
        available: Vec<String>,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateName { name } => {
                write!(f, "adapter '{name}' is already registered")
            }
            RegistryError::UnknownAdapter { name, available } => write!(
                f,
                "unknown adapter '{name}' (available: {})",
                available.join(", ")
            ),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Adapters under test, in registration order.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn RouterAdapter>>,
}

impl AdapterRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in engine: `radix`, `regex`, `matchit`
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            adapters: vec![
                Box::new(RadixAdapter),
                Box::new(RegexAdapter),
                Box::new(MatchitAdapter),
            ],
        }
    }

    /// Append an adapter.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateName`] if the name is taken.
    pub fn register(&mut self, adapter: Box<dyn RouterAdapter>) -> Result<(), RegistryError> {
        if self.get(adapter.name()).is_some() {
            return Err(RegistryError::DuplicateName {
                name: adapter.name().to_string(),
            });
        }
        self.adapters.push(adapter);
        Ok(())
    }

    /// Keep only the named adapters, preserving registration order.
    /// An empty selection keeps everything.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownAdapter`] for names that are not registered.
    pub fn select(&mut self, names: &[String]) -> Result<(), RegistryError> {
        if names.is_empty() {
            return Ok(());
        }
        for name in names {
            if self.get(name).is_none() {
                return Err(RegistryError::UnknownAdapter {
                    name: name.clone(),
                    available: self.names().map(str::to_string).collect(),
                });
            }
        }
        self.adapters
            .retain(|a| names.iter().any(|n| n.as_str() == a.name()));
        Ok(())
    }

    /// Adapter by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn RouterAdapter> {
        self.adapters
            .iter()
            .find(|a| a.name() == name)
            .map(|a| a.as_ref())
    }

    /// Adapters in registration order
    pub fn iter(&self) -> impl Iterator<Item = &dyn RouterAdapter> {
        self.adapters.iter().map(|a| a.as_ref())
    }

    /// Adapter names in registration order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.adapters.iter().map(|a| a.name())
    }

    /// Number of registered adapters
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Whether no adapter is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

/// Built handlers keyed by adapter name, in registration order.
///
/// Constructed explicitly by [`HandlerRegistry::initialize`] and passed by reference
/// to whoever dispatches; there is no process-wide handler state.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<(&'static str, Box<dyn Handler>)>,
}

impl HandlerRegistry {
    /// Translate `spec` for every adapter and build a handler for each.
    ///
    /// Adapters whose build fails are returned as [`SkippedAdapter`]s and left out.
    #[must_use]
    pub fn initialize(
        adapters: &AdapterRegistry,
        spec: &RouteSpec,
    ) -> (HandlerRegistry, Vec<SkippedAdapter>) {
        let mut registry = HandlerRegistry::default();
        let mut skipped = Vec::new();

        for adapter in adapters.iter() {
            let table = translate_spec(spec, adapter.name(), adapter.syntax());
            match build_handler(adapter, &table) {
                Ok(handler) => {
                    info!(
                        adapter = adapter.name(),
                        effective_routes = table.effective_count(),
                        canonical_routes = table.canonical_count,
                        "Handler registered"
                    );
                    registry.handlers.push((adapter.name(), handler));
                }
                Err(err) => {
                    warn!(adapter = adapter.name(), error = %err, "Adapter skipped");
                    skipped.push(SkippedAdapter::from(&err));
                }
            }
        }

        (registry, skipped)
    }

    /// Handler built for `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Handler> {
        self.handlers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, h)| h.as_ref())
    }

    /// `(name, handler)` pairs in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &dyn Handler)> {
        self.handlers.iter().map(|(n, h)| (*n, h.as_ref()))
    }

    /// Number of built handlers
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler was built
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
