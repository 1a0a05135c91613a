//! External lookup providers.
//!
//! This crate provides:
//! - [`LookupProvider`]: the uniform lookup interface
//! - [`HttpProvider`]: one generic HTTP/JSON client driven by [`ProviderConfig`] data
//! - [`ProviderRegistry`]: the startup-built, priority-ordered set of providers
//!
//! [`ProviderConfig`]: numberscope_shared::ProviderConfig

mod client;
pub mod mapping;
mod registry;

pub use client::{HttpProvider, LookupProvider};
pub use registry::ProviderRegistry;
