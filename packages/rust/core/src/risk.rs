//! Deterministic risk classification.

use numberscope_shared::{AggregatedProfile, CanonicalNumber, FieldSource, NumberType, RiskLevel};

/// Classify `number` given its merged profile. First matching rule wins:
///
/// 1. invalid number: [`RiskLevel::High`]
/// 2. premium-rate or shared-cost type, locally or as confirmed by a provider: `High`
/// 3. unknown number type: [`RiskLevel::Medium`]
/// 4. anything else: [`RiskLevel::Low`]
pub fn classify(number: &CanonicalNumber, profile: &AggregatedProfile) -> RiskLevel {
    if !number.is_valid() {
        return RiskLevel::High;
    }

    if number.number_type().is_risky() || provider_line_type(profile).is_some_and(|t| t.is_risky()) {
        return RiskLevel::High;
    }

    if number.number_type() == NumberType::Unknown {
        return RiskLevel::Medium;
    }

    RiskLevel::Low
}

/// Line type as reported by a provider, if one reported a recognizable label.
fn provider_line_type(profile: &AggregatedProfile) -> Option<NumberType> {
    match profile.line_type.source {
        FieldSource::Provider(_) => profile.line_type.value.as_deref().and_then(NumberType::from_label),
        FieldSource::BasicMetadata => None,
    }
}
