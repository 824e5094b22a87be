use std::sync::Arc;

use dropgate_core::{FieldNames, SubmissionDefaults};
use dropgate_state::StateStore;

use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::metrics::GatewayMetrics;
use crate::resolver::ResourceResolver;

/// Fluent builder for constructing a [`Gateway`] instance.
///
/// A [`StateStore`] and a [`ResourceResolver`] must be supplied. Submission
/// defaults and field names fall back to `/download`, one hour and the
/// `download_*` field names.
#[derive(Default)]
pub struct GatewayBuilder {
    state: Option<Arc<dyn StateStore>>,
    resolver: Option<Arc<dyn ResourceResolver>>,
    defaults: SubmissionDefaults,
    field_names: FieldNames,
    metrics: Option<Arc<GatewayMetrics>>,
}

impl GatewayBuilder {
    /// Create a new builder with all optional fields set to their defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the state store implementation.
    #[must_use]
    pub fn state(mut self, store: Arc<dyn StateStore>) -> Self {
        self.state = Some(store);
        self
    }

    /// Set the resolver that maps resource references to files.
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn ResourceResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Set the defaults applied to submissions that omit optional fields.
    #[must_use]
    pub fn defaults(mut self, defaults: SubmissionDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Set the form field names submissions are read from.
    #[must_use]
    pub fn field_names(mut self, names: FieldNames) -> Self {
        self.field_names = names;
        self
    }

    /// Share an existing metrics handle instead of creating a fresh one.
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<GatewayMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Consume the builder and produce a [`Gateway`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] if the state store or the
    /// resolver was not provided.
    pub fn build(self) -> Result<Gateway, GatewayError> {
        let state = self
            .state
            .ok_or_else(|| GatewayError::Configuration("state store is required".into()))?;
        let resolver = self
            .resolver
            .ok_or_else(|| GatewayError::Configuration("resource resolver is required".into()))?;

        Ok(Gateway {
            state,
            resolver,
            defaults: self.defaults,
            field_names: self.field_names,
            metrics: self.metrics.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use dropgate_state_memory::MemoryStateStore;

    use super::*;
    use crate::resolver::MediaLibrary;

    #[test]
    fn build_requires_state() {
        let result = GatewayBuilder::new()
            .resolver(Arc::new(MediaLibrary::new("/nonexistent")))
            .build();
        assert!(matches!(result, Err(GatewayError::Configuration(_))));
    }

    #[test]
    fn build_requires_resolver() {
        let result = GatewayBuilder::new()
            .state(Arc::new(MemoryStateStore::new()))
            .build();
        assert!(matches!(result, Err(GatewayError::Configuration(_))));
    }

    #[test]
    fn build_applies_settings() {
        let metrics = Arc::new(GatewayMetrics::default());
        let names = FieldNames {
            token: "t".into(),
            ..FieldNames::default()
        };
        let gateway = GatewayBuilder::new()
            .state(Arc::new(MemoryStateStore::new()))
            .resolver(Arc::new(MediaLibrary::new("/nonexistent")))
            .field_names(names.clone())
            .metrics(Arc::clone(&metrics))
            .build()
            .unwrap();

        assert_eq!(gateway.field_names(), &names);
        assert_eq!(gateway.defaults(), &SubmissionDefaults::default());
        assert!(Arc::ptr_eq(gateway.metrics(), &metrics));
    }
}
