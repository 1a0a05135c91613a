//! Provider orchestration: who gets asked, in what order, and for how long.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{debug, instrument, warn};

use numberscope_providers::LookupProvider;
use numberscope_shared::{
    CanonicalNumber, OrchestrationPolicy, ProviderError, ProviderErrorKind, ProviderResult,
};

/// Runs lookups against a provider list under one [`OrchestrationPolicy`].
#[derive(Debug, Clone, Copy)]
pub struct ProviderOrchestrator {
    policy: OrchestrationPolicy,
    per_provider_timeout: Duration,
}

impl ProviderOrchestrator {
    pub fn new(policy: OrchestrationPolicy, per_provider_timeout: Duration) -> Self {
        Self {
            policy,
            per_provider_timeout,
        }
    }

    pub fn policy(&self) -> OrchestrationPolicy {
        self.policy
    }

    /// Look up `number` with `providers`, which must already be in priority order.
    ///
    /// Results come back in that same order whatever order the calls settle in.
    #[instrument(skip_all, fields(number = %number.e164(), policy = ?self.policy, providers = providers.len()))]
    pub async fn enrich(
        &self,
        number: &CanonicalNumber,
        providers: &[Arc<dyn LookupProvider>],
    ) -> Vec<ProviderResult> {
        if providers.is_empty() {
            return Vec::new();
        }

        let results = match self.policy {
            OrchestrationPolicy::SequentialFallback => self.fallback(number, providers).await,
            OrchestrationPolicy::ConcurrentMerge => {
                join_all(providers.iter().map(|p| self.call(p.as_ref(), number))).await
            }
        };

        debug!(
            attempted = results.len(),
            failed = results.iter().filter(|r| r.is_error()).count(),
            "orchestration finished"
        );
        results
    }

    async fn fallback(
        &self,
        number: &CanonicalNumber,
        providers: &[Arc<dyn LookupProvider>],
    ) -> Vec<ProviderResult> {
        let mut results = Vec::with_capacity(providers.len());

        for provider in providers {
            let result = self.call(provider.as_ref(), number).await;
            let done = !result.is_error() && result.has_data();
            results.push(result);
            if done {
                break;
            }
        }

        results
    }

    /// One bounded call. A timeout cancels only this call.
    ///
    /// A provider's own timeout replaces the pipeline-wide one.
    async fn call(&self, provider: &dyn LookupProvider, number: &CanonicalNumber) -> ProviderResult {
        let start = Instant::now();
        let limit = provider
            .timeout_override()
            .unwrap_or(self.per_provider_timeout);

        let result = match tokio::time::timeout(limit, provider.lookup(number)).await {
            Ok(result) => result,
            Err(_) => ProviderResult::failed(
                provider.name(),
                provider.priority(),
                ProviderError::new(
                    ProviderErrorKind::Timeout,
                    format!("no response within {limit:?}"),
                ),
                start.elapsed(),
            ),
        };

        if let Some(error) = &result.error {
            warn!(provider = %result.provider, error = %error, "provider lookup failed");
        }
        result
    }
}
