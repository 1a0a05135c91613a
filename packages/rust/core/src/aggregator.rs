//! Field-level merge of provider results into one attributed profile.

use numberscope_shared::{
    AggregatedProfile, AttributedValue, CanonicalNumber, FieldSource, LocalMetadata, ProfileField,
    ProviderResult, RiskLevel,
};

use crate::risk;

/// Merge `results` for `number`, falling back to `local` per field.
///
/// For each field the first error-free result in priority order (ties by
/// provider name) with a value wins. The input order does not matter.
pub fn aggregate(
    number: &CanonicalNumber,
    results: &[ProviderResult],
    local: &LocalMetadata,
) -> AggregatedProfile {
    let mut ranked: Vec<&ProviderResult> = results.iter().filter(|r| !r.is_error()).collect();
    ranked.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.provider.cmp(&b.provider))
    });

    let pick = |field: ProfileField| {
        ranked
            .iter()
            .find_map(|r| {
                r.field(field).map(|value| AttributedValue {
                    value: Some(value.to_string()),
                    source: FieldSource::Provider(r.provider.clone()),
                })
            })
            .unwrap_or_else(|| AttributedValue {
                value: local.field(field),
                source: FieldSource::BasicMetadata,
            })
    };

    let mut profile = AggregatedProfile {
        number: number.clone(),
        carrier: pick(ProfileField::Carrier),
        location: pick(ProfileField::Location),
        line_type: pick(ProfileField::LineType),
        timezones: local.timezones.clone(),
        risk: RiskLevel::Low,
    };
    profile.risk = risk::classify(number, &profile);
    profile
}
