// ABOUTME: Configuration options for page decoration and the DecoratorBuilder.
// ABOUTME: DecoratorBuilder provides a fluent API for constructing Decorator instances with custom settings.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::blocks::{BlockLoader, StructuralLoader};
use crate::decorator::Decorator;

/// Configuration options for the decorator.
#[derive(Debug, Clone)]
pub struct Options {
    /// Upper bound on waiting for sibling blocks to finish decoration.
    pub settle_timeout: Duration,
    /// Move embeds of an `embed-container` section into the container's last slot
    /// when the section metadata does not name a slot.
    pub embed_container_fallback: bool,
    /// Fold consecutive `tabs-container` sections into the first tabs block.
    pub merge_tab_sections: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            settle_timeout: Duration::from_secs(5),
            embed_container_fallback: true,
            merge_tab_sections: true,
        }
    }
}

/// Builder for constructing Decorator instances with custom configuration.
#[derive(Clone)]
pub struct DecoratorBuilder {
    opts: Options,
    loader: Option<Arc<dyn BlockLoader + Send + Sync>>,
}

impl DecoratorBuilder {
    /// Create a new DecoratorBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
            loader: None,
        }
    }

    /// Set the bound on waiting for sibling decoration.
    pub fn settle_timeout(mut self, timeout: Duration) -> Self {
        self.opts.settle_timeout = timeout;
        self
    }

    /// Enable or disable the last-slot fallback for embed sections.
    pub fn embed_container_fallback(mut self, enabled: bool) -> Self {
        self.opts.embed_container_fallback = enabled;
        self
    }

    /// Enable or disable merging of consecutive tab sections.
    pub fn merge_tab_sections(mut self, enabled: bool) -> Self {
        self.opts.merge_tab_sections = enabled;
        self
    }

    /// Use a custom loader for blocks moved while still undecorated.
    pub fn loader(mut self, loader: impl BlockLoader + Send + Sync + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Build the Decorator with the configured options.
    pub fn build(self) -> Decorator {
        let loader: Arc<dyn BlockLoader + Send + Sync> = match self.loader {
            Some(loader) => loader,
            None => Arc::new(StructuralLoader),
        };
        Decorator::new(self.opts, loader)
    }
}

impl Default for DecoratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DecoratorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratorBuilder")
            .field("opts", &self.opts)
            .field("custom_loader", &self.loader.is_some())
            .finish()
    }
}
