//! Human-readable report rendering.

use numberscope_shared::{AggregatedProfile, FormatKind, ProfileField, Report, ReportSection, UNKNOWN};

use crate::pipeline::EnrichedNumber;

/// Fixed caveats appended to every report.
const NOTES: [&str; 2] = [
    "Carrier and location are approximate and may predate a number port.",
    "Owner identity is not available from these sources.",
];

/// Build the sectioned report for one profile. Missing values read `unknown`.
pub fn format_report(profile: &AggregatedProfile) -> Report {
    let number = &profile.number;

    let timezones = if profile.timezones.is_empty() {
        UNKNOWN.to_string()
    } else {
        profile.timezones.join(", ")
    };

    let formats = ReportSection::new("Formats")
        .entry("International", number.format(FormatKind::International))
        .entry("National", number.format(FormatKind::National))
        .entry("E.164", number.format(FormatKind::E164));

    let geography = ReportSection::new("Geography")
        .entry("Region", number.region().unwrap_or(UNKNOWN))
        .entry("Location", profile.location.display_value())
        .entry("Timezones", timezones);

    let carrier = ReportSection::new("Carrier & Type")
        .entry("Carrier", profile.carrier.display_value())
        .entry("Line type", profile.line_type.display_value())
        .entry("Number type", number.number_type().label());

    let validation = ReportSection::new("Validation & Risk")
        .entry("Valid", yes_no(number.is_valid()))
        .entry("Possible", yes_no(number.is_possible()))
        .entry("Risk", profile.risk.label());

    let sources = ProfileField::ALL
        .into_iter()
        .fold(ReportSection::new("Sources"), |section, field| {
            section.entry(field.label(), profile.field(field).source.to_string())
        });

    let notes = NOTES
        .iter()
        .enumerate()
        .fold(ReportSection::new("Notes"), |section, (i, note)| {
            section.entry((i + 1).to_string(), *note)
        });

    Report {
        sections: vec![formats, geography, carrier, validation, sources, notes],
    }
}

/// Compact numbered listing, one line per enriched number.
pub fn format_summary(entries: &[EnrichedNumber]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let profile = &entry.profile;
            format!(
                "{}. {} | {} | {} | {} | {}\n",
                i + 1,
                entry.number.format(FormatKind::International),
                profile.location.display_value(),
                profile.carrier.display_value(),
                if entry.number.is_valid() { "valid" } else { "invalid" },
                entry.risk,
            )
        })
        .collect()
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use numberscope_shared::{
        AttributedValue, CanonicalNumber, FieldSource, NumberFormats, NumberType, RiskLevel,
    };

    fn profile() -> AggregatedProfile {
        let number = CanonicalNumber::new(
            NumberFormats {
                international: "+1 415-555-2671".into(),
                national: "(415) 555-2671".into(),
                e164: "+14155552671".into(),
            },
            Some("US".into()),
            true,
            true,
            NumberType::Mobile,
        );
        AggregatedProfile {
            number,
            carrier: AttributedValue {
                value: Some("AT&T".into()),
                source: FieldSource::Provider("numverify".into()),
            },
            location: AttributedValue {
                value: None,
                source: FieldSource::BasicMetadata,
            },
            line_type: AttributedValue {
                value: Some("mobile".into()),
                source: FieldSource::BasicMetadata,
            },
            timezones: Vec::new(),
            risk: RiskLevel::Low,
        }
    }

    #[test]
    fn sections_in_order() {
        let report = format_report(&profile());
        let titles: Vec<_> = report.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Formats",
                "Geography",
                "Carrier & Type",
                "Validation & Risk",
                "Sources",
                "Notes"
            ]
        );
    }

    #[test]
    fn values_and_sources() {
        let report = format_report(&profile());
        assert_eq!(report.get("Formats", "E.164"), Some("+14155552671"));
        assert_eq!(report.get("Geography", "Region"), Some("US"));
        assert_eq!(report.get("Carrier & Type", "Carrier"), Some("AT&T"));
        assert_eq!(report.get("Carrier & Type", "Number type"), Some("mobile"));
        assert_eq!(report.get("Validation & Risk", "Valid"), Some("yes"));
        assert_eq!(report.get("Validation & Risk", "Risk"), Some("Low"));
        assert_eq!(report.get("Sources", "Carrier"), Some("numverify"));
        assert_eq!(report.get("Sources", "Location"), Some("basic metadata"));
    }

    #[test]
    fn missing_values_render_unknown() {
        let report = format_report(&profile());
        assert_eq!(report.get("Geography", "Location"), Some("unknown"));
        assert_eq!(report.get("Geography", "Timezones"), Some("unknown"));
    }

    #[test]
    fn display_renders_every_section() {
        let text = format_report(&profile()).to_string();
        assert!(text.starts_with("Formats\n  International: +1 415-555-2671\n"));
        assert!(text.contains("\nNotes\n  1: "));
        assert!(text.contains("Owner identity is not available"));
    }

    #[test]
    fn summary_lines() {
        let profile = profile();
        let entry = EnrichedNumber {
            number: profile.number.clone(),
            risk: profile.risk,
            report: format_report(&profile),
            profile,
        };
        let summary = format_summary(&[entry.clone(), entry]);
        assert_eq!(
            summary,
            "1. +1 415-555-2671 | unknown | AT&T | valid | Low\n\
             2. +1 415-555-2671 | unknown | AT&T | valid | Low\n"
        );
    }

    #[test]
    fn empty_summary() {
        assert_eq!(format_summary(&[]), "");
    }
}
