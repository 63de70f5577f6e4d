//! Adaptor registry for looking up wire profiles by name.

use std::collections::HashMap;
use std::sync::Arc;

use ussd_core::{Config, Error, Result};

use crate::conend::ConEndAdaptor;
use crate::json::{JsonAdaptor, JsonSnakeAdaptor, JsonUrlencodedAdaptor};
use crate::traits::WireAdaptor;
use crate::xmlrpc::XmlRpcAdaptor;

/// Registry of available wire profiles.
pub struct AdaptorRegistry {
    adaptors: HashMap<String, Arc<dyn WireAdaptor>>,
}

impl AdaptorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            adaptors: HashMap::new(),
        }
    }

    /// Create a registry with every built-in profile.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ConEndAdaptor));
        registry.register(Arc::new(JsonAdaptor));
        registry.register(Arc::new(XmlRpcAdaptor));
        registry.register(Arc::new(JsonUrlencodedAdaptor::default()));
        registry.register(Arc::new(JsonSnakeAdaptor::default()));
        registry
    }

    /// Register an adaptor.
    pub fn register(&mut self, adaptor: Arc<dyn WireAdaptor>) {
        self.adaptors.insert(adaptor.name().to_string(), adaptor);
    }

    /// Get an adaptor by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn WireAdaptor>> {
        self.adaptors
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnsupportedAdaptor(name.to_string()))
    }

    /// Adaptor selected by configuration: `output.adaptor`, else the one
    /// implementing `output.output_format`.
    pub fn from_config(&self, config: &Config) -> Result<Arc<dyn WireAdaptor>> {
        self.get(config.output.adaptor_name())
    }

    /// Check if an adaptor exists.
    pub fn contains(&self, name: &str) -> bool {
        self.adaptors.contains_key(name)
    }

    /// List all adaptor names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.adaptors.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for AdaptorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
