//! Phone number extraction and local metadata.
//!
//! This crate provides:
//! - [`NumberCatalog`]: the parsing/validation/metadata capability
//! - [`PhoneNumberCatalog`]: the built-in catalog backed by the `phonenumber` crate
//! - [`normalize`]: turns raw text into an ordered, quota-bounded list of numbers

mod catalog;
mod normalizer;

pub use catalog::{NumberCatalog, PhoneNumberCatalog};
pub use normalizer::{Normalized, normalize};
