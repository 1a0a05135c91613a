//! Core enrichment logic for numberscope.
//!
//! This crate ties number extraction, provider orchestration, field merging,
//! risk classification and report rendering into one request flow
//! ([`EnrichmentPipeline::enrich`]).

pub mod aggregator;
pub mod orchestrator;
pub mod pipeline;
pub mod report;
pub mod risk;

pub use orchestrator::ProviderOrchestrator;
pub use pipeline::{
    EnrichedNumber, EnrichmentOutcome, EnrichmentPipeline, EnrichmentPipelineBuilder,
    ProgressReporter, SilentProgress,
};
