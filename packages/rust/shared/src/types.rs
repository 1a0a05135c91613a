//! Core domain types for numberscope lookups.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Marker rendered for any value that is not available.
pub const UNKNOWN: &str = "unknown";

// ---------------------------------------------------------------------------
// NumberType
// ---------------------------------------------------------------------------

/// Line classification of a phone number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberType {
    FixedLine,
    Mobile,
    FixedLineOrMobile,
    TollFree,
    PremiumRate,
    SharedCost,
    Voip,
    PersonalNumber,
    Pager,
    Uan,
    Voicemail,
    Unknown,
}

impl NumberType {
    /// Stable human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::FixedLine => "fixed line",
            Self::Mobile => "mobile",
            Self::FixedLineOrMobile => "fixed line or mobile",
            Self::TollFree => "toll free",
            Self::PremiumRate => "premium rate",
            Self::SharedCost => "shared cost",
            Self::Voip => "voip",
            Self::PersonalNumber => "personal number",
            Self::Pager => "pager",
            Self::Uan => "uan",
            Self::Voicemail => "voicemail",
            Self::Unknown => UNKNOWN,
        }
    }

    /// Parse a loosely formatted label as reported by a lookup provider.
    ///
    /// Case, whitespace, `_` and `-` are ignored, so `"Premium Rate"`,
    /// `"premium_rate"` and `"PremiumRate"` all map to [`NumberType::PremiumRate`].
    /// Returns `None` for labels that do not name a known type.
    pub fn from_label(label: &str) -> Option<Self> {
        let key: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        let ty = match key.as_str() {
            "fixedline" | "fixed" | "landline" => Self::FixedLine,
            "mobile" | "cell" | "cellular" | "wireless" => Self::Mobile,
            "fixedlineormobile" => Self::FixedLineOrMobile,
            "tollfree" => Self::TollFree,
            "premiumrate" | "premium" => Self::PremiumRate,
            "sharedcost" => Self::SharedCost,
            "voip" | "fixedvoip" | "nonfixedvoip" => Self::Voip,
            "personalnumber" | "personal" => Self::PersonalNumber,
            "pager" => Self::Pager,
            "uan" => Self::Uan,
            "voicemail" => Self::Voicemail,
            "unknown" => Self::Unknown,
            _ => return None,
        };
        Some(ty)
    }

    /// Whether this type is billed in a way commonly abused by scams.
    pub fn is_risky(&self) -> bool {
        matches!(self, Self::PremiumRate | Self::SharedCost)
    }
}

impl fmt::Display for NumberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// CanonicalNumber
// ---------------------------------------------------------------------------

/// Output format of a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    International,
    National,
    E164,
}

/// Pre-rendered formats of a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormats {
    pub international: String,
    pub national: String,
    pub e164: String,
}

/// A normalized phone number extracted from text.
///
/// Built once by the number catalog; the validity verdict is part of the value
/// and is never re-derived downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalNumber {
    e164: String,
    region: Option<String>,
    valid: bool,
    possible: bool,
    number_type: NumberType,
    formats: NumberFormats,
}

impl CanonicalNumber {
    pub fn new(
        formats: NumberFormats,
        region: Option<String>,
        valid: bool,
        possible: bool,
        number_type: NumberType,
    ) -> Self {
        Self {
            e164: formats.e164.clone(),
            region,
            valid,
            possible,
            number_type,
            formats,
        }
    }

    /// E.164 form, e.g. `+14155552671`.
    pub fn e164(&self) -> &str {
        &self.e164
    }

    /// ISO 3166 alpha-2 region inferred for the number.
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_possible(&self) -> bool {
        self.possible
    }

    pub fn number_type(&self) -> NumberType {
        self.number_type
    }

    pub fn formats(&self) -> &NumberFormats {
        &self.formats
    }

    /// Render the number in the requested format.
    pub fn format(&self, kind: FormatKind) -> &str {
        match kind {
            FormatKind::International => &self.formats.international,
            FormatKind::National => &self.formats.national,
            FormatKind::E164 => &self.formats.e164,
        }
    }
}

// ---------------------------------------------------------------------------
// Local metadata
// ---------------------------------------------------------------------------

/// Basic metadata available offline from the number catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalMetadata {
    pub number_type: NumberType,
    pub carrier: Option<String>,
    pub location: Option<String>,
    pub timezones: Vec<String>,
}

impl LocalMetadata {
    /// Value of a profile field as known locally.
    ///
    /// The line type is the number type label, absent when the type is unknown.
    pub fn field(&self, field: ProfileField) -> Option<String> {
        match field {
            ProfileField::Carrier => self.carrier.clone(),
            ProfileField::Location => self.location.clone(),
            ProfileField::LineType => match self.number_type {
                NumberType::Unknown => None,
                ty => Some(ty.label().to_string()),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Provider results
// ---------------------------------------------------------------------------

/// The enriched fields a provider can contribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Carrier,
    Location,
    LineType,
}

impl ProfileField {
    pub const ALL: [ProfileField; 3] = [Self::Carrier, Self::Location, Self::LineType];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Carrier => "Carrier",
            Self::Location => "Location",
            Self::LineType => "Line type",
        }
    }
}

/// Category of a failed provider lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    Transport,
    Auth,
    RateLimited,
    Timeout,
    Decode,
    Upstream,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Auth => "auth",
            Self::RateLimited => "rate_limited",
            Self::Timeout => "timeout",
            Self::Decode => "decode",
            Self::Upstream => "upstream",
        }
    }
}

/// Why a provider lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

/// Outcome of one lookup call to one provider for one number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderResult {
    /// Provider name from configuration.
    pub provider: String,
    /// Priority rank of the provider (lower wins).
    pub priority: u32,
    pub carrier: Option<String>,
    pub location: Option<String>,
    pub line_type: Option<String>,
    /// Set when the lookup failed; fields are empty in that case.
    pub error: Option<ProviderError>,
    /// Wall time spent on the call.
    pub elapsed: Duration,
}

impl ProviderResult {
    /// An error-free result with no fields yet.
    pub fn success(provider: impl Into<String>, priority: u32, elapsed: Duration) -> Self {
        Self {
            provider: provider.into(),
            priority,
            carrier: None,
            location: None,
            line_type: None,
            error: None,
            elapsed,
        }
    }

    /// A failed result.
    pub fn failed(
        provider: impl Into<String>,
        priority: u32,
        error: ProviderError,
        elapsed: Duration,
    ) -> Self {
        Self {
            error: Some(error),
            ..Self::success(provider, priority, elapsed)
        }
    }

    /// Set a field; blank values are stored as absent.
    pub fn with_field(mut self, field: ProfileField, value: Option<String>) -> Self {
        let value = value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        match field {
            ProfileField::Carrier => self.carrier = value,
            ProfileField::Location => self.location = value,
            ProfileField::LineType => self.line_type = value,
        }
        self
    }

    pub fn field(&self, field: ProfileField) -> Option<&str> {
        match field {
            ProfileField::Carrier => self.carrier.as_deref(),
            ProfileField::Location => self.location.as_deref(),
            ProfileField::LineType => self.line_type.as_deref(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// At least one field carries a non-empty value.
    pub fn has_data(&self) -> bool {
        ProfileField::ALL
            .iter()
            .any(|f| self.field(*f).is_some_and(|v| !v.trim().is_empty()))
    }
}

// ---------------------------------------------------------------------------
// Aggregated profile
// ---------------------------------------------------------------------------

/// Where a profile field's value came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    Provider(String),
    BasicMetadata,
}

impl fmt::Display for FieldSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider(name) => f.write_str(name),
            Self::BasicMetadata => f.write_str("basic metadata"),
        }
    }
}

/// A profile value together with its single source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributedValue {
    pub value: Option<String>,
    pub source: FieldSource,
}

impl AttributedValue {
    /// The value, or [`UNKNOWN`] when absent.
    pub fn display_value(&self) -> &str {
        self.value.as_deref().unwrap_or(UNKNOWN)
    }
}

/// Risk classification of a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Merged view of one number: provider fields with attribution plus local metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedProfile {
    pub number: CanonicalNumber,
    pub carrier: AttributedValue,
    pub location: AttributedValue,
    pub line_type: AttributedValue,
    pub timezones: Vec<String>,
    pub risk: RiskLevel,
}

impl AggregatedProfile {
    pub fn field(&self, field: ProfileField) -> &AttributedValue {
        match field {
            ProfileField::Carrier => &self.carrier,
            ProfileField::Location => &self.location,
            ProfileField::LineType => &self.line_type,
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// One key/value line of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub key: String,
    pub value: String,
}

/// A titled group of report entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSection {
    pub title: String,
    pub entries: Vec<ReportEntry>,
}

impl ReportSection {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entries: Vec::new(),
        }
    }

    pub fn entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push(ReportEntry {
            key: key.into(),
            value: value.into(),
        });
        self
    }
}

/// Structured, ordered report for one number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub sections: Vec<ReportSection>,
}

impl Report {
    /// Look up a value by section title and key.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.title == section)?
            .entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}", section.title)?;
            for entry in &section.entries {
                writeln!(f, "  {}: {}", entry.key, entry.value)?;
            }
        }
        Ok(())
    }
}
