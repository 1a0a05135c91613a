//! Provider registry: the fixed, priority-ordered set of lookup providers.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use numberscope_shared::ProviderConfig;

use crate::client::{HttpProvider, LookupProvider};

/// Ordered collection of providers, consulted in ascending priority.
/// Ties are broken by name so the order is stable across runs.
///
/// Sole owner of the provider sessions; [`shutdown`](Self::shutdown) releases them once.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn LookupProvider>>,
}

impl ProviderRegistry {
    /// Build a registry from already-constructed providers.
    pub fn new(mut providers: Vec<Arc<dyn LookupProvider>>) -> Self {
        providers.sort_by(|a, b| {
            a.priority()
                .cmp(&b.priority())
                .then_with(|| a.name().cmp(b.name()))
        });
        Self { providers }
    }

    /// A registry with no providers; every lookup falls back to basic metadata.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build HTTP providers from config, reading credentials from the environment.
    pub fn from_config(configs: &[ProviderConfig], default_timeout: Duration) -> Self {
        Self::from_config_with(configs, default_timeout, |var| std::env::var(var).ok())
    }

    /// Like [`from_config`](Self::from_config) with a custom credential source.
    ///
    /// A provider whose `credential_env` is set but unresolved is skipped.
    pub fn from_config_with<F>(configs: &[ProviderConfig], default_timeout: Duration, resolve: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut providers: Vec<Arc<dyn LookupProvider>> = Vec::with_capacity(configs.len());

        for config in configs {
            let credential = match &config.credential_env {
                Some(var) => match resolve(var).filter(|v| !v.trim().is_empty()) {
                    Some(value) => Some(value),
                    None => {
                        warn!(
                            provider = %config.name,
                            env = %var,
                            "credential not set, skipping provider"
                        );
                        continue;
                    }
                },
                None => None,
            };

            providers.push(Arc::new(HttpProvider::new(
                config.clone(),
                credential,
                default_timeout,
            )));
        }

        let registry = Self::new(providers);
        info!(
            configured = configs.len(),
            active = registry.len(),
            "provider registry ready"
        );
        registry
    }

    /// Providers in consultation order.
    pub fn providers(&self) -> &[Arc<dyn LookupProvider>] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider names in consultation order.
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Release every provider and its network session.
    pub fn shutdown(self) {
        let open = self.providers.iter().filter(|p| p.is_connected()).count();
        info!(
            providers = self.providers.len(),
            open_sessions = open,
            "closing provider sessions"
        );
        drop(self.providers);
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}
