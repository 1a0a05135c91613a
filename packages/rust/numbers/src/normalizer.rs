//! Candidate extraction: raw text → ordered, quota-bounded canonical numbers.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use numberscope_shared::{CanonicalNumber, NumberScopeError, Result};

use crate::catalog::NumberCatalog;

/// Numbers extracted from one piece of text.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// Numbers within the quota, in order of appearance.
    pub numbers: Vec<CanonicalNumber>,
    /// Candidates found beyond the quota.
    pub omitted: usize,
}

impl Normalized {
    /// Total number of candidates located, including omitted ones.
    pub fn total(&self) -> usize {
        self.numbers.len() + self.omitted
    }
}

/// Extract up to `quota` numbers from `text`.
///
/// Tries, in order: a strict parse of the whole text (explicit `+` prefix),
/// a parse of the whole text using `region_hint`, then a free-text scan.
/// The whole-text parses only apply when the text is a single number-shaped
/// token. Candidates past the quota are counted in [`Normalized::omitted`].
///
/// Fails with [`NumberScopeError::NoNumberFound`] when nothing is located.
#[instrument(
    skip_all,
    fields(len = text.len(), region = region_hint.unwrap_or("-"), quota = quota)
)]
pub fn normalize(
    catalog: &dyn NumberCatalog,
    text: &str,
    region_hint: Option<&str>,
    quota: usize,
) -> Result<Normalized> {
    let mut candidates = extract(catalog, text, region_hint);
    if candidates.is_empty() {
        debug!("no phone number candidates");
        return Err(NumberScopeError::NoNumberFound);
    }

    let omitted = candidates.len().saturating_sub(quota);
    candidates.truncate(quota);

    debug!(kept = candidates.len(), omitted, "candidates extracted");

    Ok(Normalized {
        numbers: candidates,
        omitted,
    })
}

fn extract(
    catalog: &dyn NumberCatalog,
    text: &str,
    region_hint: Option<&str>,
) -> Vec<CanonicalNumber> {
    let trimmed = text.trim();

    if is_single_number(trimmed) {
        if let Ok(number) = catalog.parse(trimmed, None) {
            return vec![number];
        }
        if region_hint.is_some() {
            if let Ok(number) = catalog.parse(trimmed, region_hint) {
                return vec![number];
            }
        }
    }

    catalog.match_all(text, region_hint)
}

/// Whether the text is one number-shaped token (digits plus separators only).
fn is_single_number(text: &str) -> bool {
    static SINGLE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^\+?[\d\s().\-/]*\d[\d\s().\-/]*$").expect("valid regex")
    });
    SINGLE_RE.is_match(text)
}
