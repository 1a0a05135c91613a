//! The number-parsing capability and its `phonenumber`-backed implementation.

use std::sync::LazyLock;

use phonenumber::metadata::DATABASE;
use phonenumber::{Mode, PhoneNumber, Type, country};
use regex::Regex;
use tracing::debug;

use numberscope_shared::{
    CanonicalNumber, FormatKind, LocalMetadata, NumberFormats, NumberScopeError, NumberType,
    Result,
};

/// Fewest digits a free-text span needs before it is treated as a candidate.
const MIN_CANDIDATE_DIGITS: usize = 7;

/// E.164 allows at most 15 digits including the country code.
const MAX_E164_DIGITS: usize = 15;

/// Parsing, validation and local metadata for phone numbers.
///
/// The pipeline only talks to numbers through this trait, so the parsing
/// library can be swapped (or stubbed in tests) without touching the core.
pub trait NumberCatalog: Send + Sync {
    /// Parse `text` as a single number.
    ///
    /// Without a region hint the text must carry an explicit `+` country
    /// prefix. Fails with [`NumberScopeError::InvalidNumberFormat`].
    fn parse(&self, text: &str, region_hint: Option<&str>) -> Result<CanonicalNumber>;

    /// Every number found in free text, in order of appearance.
    fn match_all(&self, text: &str, region_hint: Option<&str>) -> Vec<CanonicalNumber>;

    /// Render a parsed number.
    fn format(&self, number: &CanonicalNumber, kind: FormatKind) -> String {
        number.format(kind).to_string()
    }

    /// Basic offline metadata for a parsed number.
    fn metadata(&self, number: &CanonicalNumber) -> LocalMetadata;
}

/// [`NumberCatalog`] backed by the `phonenumber` crate (libphonenumber metadata).
///
/// The bundled metadata has no carrier or geocoding tables: basic carrier is
/// always absent and basic location is only the country of the number.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhoneNumberCatalog;

impl PhoneNumberCatalog {
    pub fn new() -> Self {
        Self
    }

    fn to_canonical(&self, number: &PhoneNumber) -> CanonicalNumber {
        let formats = NumberFormats {
            international: number.format().mode(Mode::International).to_string(),
            national: number.format().mode(Mode::National).to_string(),
            e164: number.format().mode(Mode::E164).to_string(),
        };
        let digits = digit_count(&formats.e164);
        let valid = phonenumber::is_valid(number);

        CanonicalNumber::new(
            formats,
            number.country().id().map(|id| format!("{id:?}")),
            valid,
            (MIN_CANDIDATE_DIGITS..=MAX_E164_DIGITS).contains(&digits),
            map_type(number.number_type(&DATABASE)),
        )
    }

    fn parse_span(&self, span: &str, region: Option<country::Id>) -> Option<CanonicalNumber> {
        let digits = digit_count(span);
        if !(MIN_CANDIDATE_DIGITS..=MAX_E164_DIGITS).contains(&digits) {
            return None;
        }
        match phonenumber::parse(region, span) {
            Ok(number) => Some(self.to_canonical(&number)),
            Err(e) => {
                debug!(span, error = %e, "candidate span did not parse");
                None
            }
        }
    }

    /// Numbers inside one scanned span.
    ///
    /// A span may join several numbers (or a number and a stray digit) across
    /// whitespace. The whole span is kept when it is a valid number; otherwise
    /// its whitespace-separated groups are consumed left to right, taking the
    /// longest run of groups that forms a valid number. Groups that never join
    /// a valid run survive only as standalone numbers, and a span with no valid
    /// run at all is kept whole when it still parses.
    fn split_span(&self, span: &str, region: Option<country::Id>) -> Vec<CanonicalNumber> {
        let valid = |candidate: &str| {
            self.parse_span(candidate, region.clone())
                .filter(CanonicalNumber::is_valid)
        };

        if let Some(number) = valid(span) {
            return vec![number];
        }

        let groups: Vec<&str> = span.split_whitespace().collect();
        let mut found = Vec::new();
        let mut i = 0;

        while i < groups.len() {
            let longest = (i + 1..=groups.len())
                .rev()
                .find_map(|j| valid(&groups[i..j].join(" ")).map(|number| (j, number)));

            match longest {
                Some((j, number)) => {
                    found.push(number);
                    i = j;
                }
                None => {
                    if !looks_like_date(groups[i]) {
                        found.extend(self.parse_span(groups[i], region.clone()));
                    }
                    i += 1;
                }
            }
        }

        if found.is_empty() {
            found.extend(self.parse_span(span, region));
        }
        found
    }
}

impl NumberCatalog for PhoneNumberCatalog {
    fn parse(&self, text: &str, region_hint: Option<&str>) -> Result<CanonicalNumber> {
        let region = region_hint.and_then(region_id);
        let number = phonenumber::parse(region, text)
            .map_err(|e| NumberScopeError::invalid_format(format!("'{text}': {e}")))?;
        Ok(self.to_canonical(&number))
    }

    fn match_all(&self, text: &str, region_hint: Option<&str>) -> Vec<CanonicalNumber> {
        static CANDIDATE_RE: LazyLock<Regex> = LazyLock::new(|| {
            // A leading `+` or `(`, then digits with common separators, ending on a digit.
            Regex::new(r"\+?\(?\d(?:[\d().\-/ \t]*\d)?").expect("valid regex")
        });

        let region = region_hint.and_then(region_id);

        CANDIDATE_RE
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|span| digit_count(span) >= MIN_CANDIDATE_DIGITS && !looks_like_date(span))
            .flat_map(|span| self.split_span(span, region.clone()))
            .collect()
    }

    fn metadata(&self, number: &CanonicalNumber) -> LocalMetadata {
        LocalMetadata {
            number_type: number.number_type(),
            carrier: None,
            location: number
                .region()
                .filter(|r| r.len() == 2 && r.chars().all(|c| c.is_ascii_alphabetic()))
                .map(str::to_string),
            timezones: Vec::new(),
        }
    }
}

/// Resolve an ISO 3166 alpha-2 hint; unknown hints are ignored.
fn region_id(hint: &str) -> Option<country::Id> {
    let code = hint.trim().to_ascii_uppercase();
    match code.parse::<country::Id>() {
        Ok(id) => Some(id),
        Err(_) => {
            debug!(hint, "ignoring unknown region hint");
            None
        }
    }
}

fn digit_count(text: &str) -> usize {
    text.chars().filter(char::is_ascii_digit).count()
}

/// Calendar dates such as `2024-01-15` or `15/01/2024`.
fn looks_like_date(span: &str) -> bool {
    static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^(?:\d{4}[-/.]\d{1,2}[-/.]\d{1,2}|\d{1,2}[-/.]\d{1,2}[-/.]\d{4})$")
            .expect("valid regex")
    });
    DATE_RE.is_match(span.trim())
}

fn map_type(ty: Type) -> NumberType {
    match ty {
        Type::FixedLine => NumberType::FixedLine,
        Type::Mobile => NumberType::Mobile,
        Type::FixedLineOrMobile => NumberType::FixedLineOrMobile,
        Type::TollFree => NumberType::TollFree,
        Type::PremiumRate => NumberType::PremiumRate,
        Type::SharedCost => NumberType::SharedCost,
        Type::Voip => NumberType::Voip,
        Type::PersonalNumber => NumberType::PersonalNumber,
        Type::Pager => NumberType::Pager,
        Type::Uan => NumberType::Uan,
        Type::Voicemail => NumberType::Voicemail,
        _ => NumberType::Unknown,
    }
}
