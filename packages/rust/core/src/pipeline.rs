//! End-to-end enrichment: text → candidates → provider lookups → merged, classified reports.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use numberscope_numbers::{NumberCatalog, normalize};
use numberscope_providers::ProviderRegistry;
use numberscope_shared::{
    AggregatedProfile, CanonicalNumber, NumberScopeError, PipelineSettings, Report, Result,
    RiskLevel,
};

use crate::aggregator;
use crate::orchestrator::ProviderOrchestrator;
use crate::report;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Everything produced for one extracted number.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedNumber {
    pub number: CanonicalNumber,
    pub profile: AggregatedProfile,
    pub risk: RiskLevel,
    pub report: Report,
}

/// Result of one `enrich` request.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentOutcome {
    /// Correlates log lines for this request.
    pub request_id: Uuid,
    /// Processed numbers, in text order.
    pub entries: Vec<EnrichedNumber>,
    /// Candidates dropped by the per-request quota.
    pub omitted: usize,
}

impl EnrichmentOutcome {
    fn empty(request_id: Uuid) -> Self {
        Self {
            request_id,
            entries: Vec::new(),
            omitted: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Candidates located; `omitted` were cut by the quota.
    fn candidates_found(&self, total: usize, omitted: usize);
    /// A candidate is about to be looked up.
    fn number_started(&self, e164: &str, current: usize, total: usize);
    /// Called when the request completes.
    fn done(&self, outcome: &EnrichmentOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn candidates_found(&self, _total: usize, _omitted: usize) {}
    fn number_started(&self, _e164: &str, _current: usize, _total: usize) {}
    fn done(&self, _outcome: &EnrichmentOutcome) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The assembled enrichment pipeline. Owns the provider registry for its lifetime.
pub struct EnrichmentPipeline {
    catalog: Arc<dyn NumberCatalog>,
    registry: ProviderRegistry,
    orchestrator: ProviderOrchestrator,
    settings: PipelineSettings,
}

impl EnrichmentPipeline {
    pub fn builder() -> EnrichmentPipelineBuilder {
        EnrichmentPipelineBuilder::default()
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Enrich every number found in `text`, up to the configured quota.
    pub async fn enrich(&self, text: &str, region_hint: Option<&str>) -> Result<EnrichmentOutcome> {
        self.enrich_with_progress(text, region_hint, &SilentProgress)
            .await
    }

    /// Like [`enrich`](Self::enrich), reporting per-candidate progress.
    ///
    /// Text without any number yields an empty outcome rather than an error.
    #[instrument(skip_all, fields(request_id = tracing::field::Empty))]
    pub async fn enrich_with_progress(
        &self,
        text: &str,
        region_hint: Option<&str>,
        progress: &dyn ProgressReporter,
    ) -> Result<EnrichmentOutcome> {
        let start = Instant::now();
        let request_id = Uuid::now_v7();
        tracing::Span::current().record("request_id", tracing::field::display(&request_id));

        let region = region_hint.or(self.settings.default_region.as_deref());

        let normalized = match normalize(
            self.catalog.as_ref(),
            text,
            region,
            self.settings.max_candidates_per_request,
        ) {
            Ok(normalized) => normalized,
            Err(NumberScopeError::NoNumberFound) => {
                debug!("no number found in input");
                let outcome = EnrichmentOutcome::empty(request_id);
                progress.done(&outcome);
                return Ok(outcome);
            }
            Err(e) => return Err(e),
        };

        progress.candidates_found(normalized.total(), normalized.omitted);

        let total = normalized.numbers.len();
        let mut entries = Vec::with_capacity(total);

        for (i, number) in normalized.numbers.into_iter().enumerate() {
            progress.number_started(number.e164(), i + 1, total);
            entries.push(self.enrich_number(number).await);
        }

        let outcome = EnrichmentOutcome {
            request_id,
            entries,
            omitted: normalized.omitted,
        };

        info!(
            numbers = outcome.entries.len(),
            omitted = outcome.omitted,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "enrichment complete"
        );
        progress.done(&outcome);
        Ok(outcome)
    }

    async fn enrich_number(&self, number: CanonicalNumber) -> EnrichedNumber {
        let results = self
            .orchestrator
            .enrich(&number, self.registry.providers())
            .await;
        let local = self.catalog.metadata(&number);
        let profile = aggregator::aggregate(&number, &results, &local);
        let report = report::format_report(&profile);

        debug!(
            number = %number.e164(),
            valid = number.is_valid(),
            risk = %profile.risk,
            "number enriched"
        );

        EnrichedNumber {
            risk: profile.risk,
            number,
            profile,
            report,
        }
    }

    /// Release the provider registry and any open sessions.
    pub fn shutdown(self) {
        self.registry.shutdown();
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for [`EnrichmentPipeline`]. Only the catalog is mandatory.
#[derive(Default)]
pub struct EnrichmentPipelineBuilder {
    catalog: Option<Arc<dyn NumberCatalog>>,
    registry: Option<ProviderRegistry>,
    settings: Option<PipelineSettings>,
}

impl EnrichmentPipelineBuilder {
    pub fn catalog(mut self, catalog: Arc<dyn NumberCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn build(self) -> Result<EnrichmentPipeline> {
        let catalog = self
            .catalog
            .ok_or_else(|| NumberScopeError::config("number catalog is required"))?;
        let settings = self.settings.unwrap_or_default();
        let registry = self.registry.unwrap_or_else(ProviderRegistry::empty);

        info!(
            providers = registry.len(),
            policy = ?settings.policy,
            quota = settings.max_candidates_per_request,
            "enrichment pipeline ready"
        );

        Ok(EnrichmentPipeline {
            catalog,
            orchestrator: ProviderOrchestrator::new(settings.policy, settings.per_provider_timeout),
            registry,
            settings,
        })
    }
}
