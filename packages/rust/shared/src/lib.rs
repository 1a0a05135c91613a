//! Shared types, error model, and configuration for numberscope.
//!
//! This crate is the foundation depended on by all other numberscope crates.
//! It provides:
//! - [`NumberScopeError`]: the unified error type
//! - Domain types ([`CanonicalNumber`], [`ProviderResult`], [`AggregatedProfile`], [`Report`])
//! - Configuration ([`AppConfig`], [`ProviderConfig`], [`PipelineSettings`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CredentialPlacement, FieldMapping, NUMBER_PLACEHOLDER, NumberEncoding,
    OrchestrationPolicy, PipelineConfig, PipelineSettings, ProviderConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{NumberScopeError, Result};
pub use types::{
    AggregatedProfile, AttributedValue, CanonicalNumber, FieldSource, FormatKind, LocalMetadata,
    NumberFormats, NumberType, ProfileField, ProviderError, ProviderErrorKind, ProviderResult,
    Report, ReportEntry, ReportSection, RiskLevel, UNKNOWN,
};
