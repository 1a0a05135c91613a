//! End-to-end pipeline behaviour against a stub catalog and mock HTTP providers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use numberscope_core::{EnrichmentPipeline, ProgressReporter, EnrichmentOutcome};
use numberscope_numbers::NumberCatalog;
use numberscope_providers::{HttpProvider, LookupProvider, ProviderRegistry};
use numberscope_shared::{
    CanonicalNumber, FieldMapping, FieldSource, LocalMetadata, NumberEncoding, NumberFormats,
    NumberScopeError, NumberType, OrchestrationPolicy, PipelineSettings, ProfileField,
    ProviderConfig, Result, RiskLevel,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Catalog backed by a fixed table of `+`-prefixed numbers.
///
/// Unlisted `+` numbers parse as invalid with an unknown type.
struct StubCatalog {
    table: HashMap<&'static str, (bool, NumberType, &'static str)>,
}

impl StubCatalog {
    fn new() -> Self {
        let table = HashMap::from([
            ("+14155552671", (true, NumberType::Mobile, "US")),
            ("+14155550100", (true, NumberType::FixedLine, "US")),
            ("+19005550199", (true, NumberType::PremiumRate, "US")),
            ("+447700900123", (true, NumberType::Mobile, "GB")),
            ("+882100000000", (true, NumberType::Unknown, "001")),
        ]);
        Self { table }
    }

    fn lookup(&self, token: &str) -> Option<CanonicalNumber> {
        let digits: String = token.chars().filter(char::is_ascii_digit).collect();
        if !token.starts_with('+') || digits.len() < 7 {
            return None;
        }
        let e164 = format!("+{digits}");
        let (valid, ty, region) = self
            .table
            .get(e164.as_str())
            .copied()
            .unwrap_or((false, NumberType::Unknown, "ZZ"));

        Some(CanonicalNumber::new(
            NumberFormats {
                international: e164.clone(),
                national: digits,
                e164,
            },
            Some(region.to_string()),
            valid,
            valid,
            ty,
        ))
    }
}

impl NumberCatalog for StubCatalog {
    fn parse(&self, text: &str, _region_hint: Option<&str>) -> Result<CanonicalNumber> {
        self.lookup(text.trim())
            .ok_or_else(|| NumberScopeError::invalid_format(text))
    }

    fn match_all(&self, text: &str, _region_hint: Option<&str>) -> Vec<CanonicalNumber> {
        text.split_whitespace()
            .map(|t| t.trim_matches(|c: char| c == ',' || c == ';' || c == '.'))
            .filter_map(|t| self.lookup(t))
            .collect()
    }

    fn metadata(&self, number: &CanonicalNumber) -> LocalMetadata {
        LocalMetadata {
            number_type: number.number_type(),
            carrier: (number.region() == Some("GB")).then(|| "Stub Mobile".to_string()),
            location: None,
            timezones: Vec::new(),
        }
    }
}

fn provider_config(server: &MockServer, name: &str, priority: u32) -> ProviderConfig {
    ProviderConfig {
        name: name.into(),
        base_url: format!("{}/{name}", server.uri()),
        priority,
        credential_env: None,
        credential: None,
        number_param: Some("number".into()),
        number_encoding: NumberEncoding::E164,
        query: Default::default(),
        timeout_secs: None,
        fields: FieldMapping {
            carrier: Some("carrier".into()),
            location: Some("location".into()),
            line_type: Some("line_type".into()),
            error: Some("error".into()),
        },
    }
}

fn registry(configs: Vec<ProviderConfig>, timeout: Duration) -> ProviderRegistry {
    let providers: Vec<Arc<dyn LookupProvider>> = configs
        .into_iter()
        .map(|c| Arc::new(HttpProvider::new(c, None, timeout)) as Arc<dyn LookupProvider>)
        .collect();
    ProviderRegistry::new(providers)
}

fn settings(policy: OrchestrationPolicy, quota: usize) -> PipelineSettings {
    PipelineSettings {
        default_region: Some("US".into()),
        max_candidates_per_request: quota,
        per_provider_timeout: Duration::from_millis(300),
        policy,
    }
}

fn pipeline(registry: ProviderRegistry, settings: PipelineSettings) -> EnrichmentPipeline {
    EnrichmentPipeline::builder()
        .catalog(Arc::new(StubCatalog::new()))
        .registry(registry)
        .settings(settings)
        .build()
        .expect("pipeline")
}

async fn mount(server: &MockServer, name: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/{name}")))
        .respond_with(response)
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Quota
// ---------------------------------------------------------------------------

#[tokio::test]
async fn numbers_within_quota_are_all_enriched() {
    let p = pipeline(
        ProviderRegistry::empty(),
        settings(OrchestrationPolicy::ConcurrentMerge, 3),
    );

    let outcome = p
        .enrich("call +14155552671 or +15550001111 today", None)
        .await
        .expect("enrich");

    assert_eq!(outcome.entries.len(), 2);
    assert_eq!(outcome.omitted, 0);
    assert!(outcome.entries[0].number.is_valid());
    assert!(!outcome.entries[1].number.is_valid());
    assert_eq!(outcome.entries[1].risk, RiskLevel::High);
}

#[tokio::test]
async fn numbers_past_quota_are_omitted_and_never_looked_up() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alpha"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"carrier": "X"})))
        .expect(2)
        .mount(&server)
        .await;

    let p = pipeline(
        registry(vec![provider_config(&server, "alpha", 1)], Duration::from_secs(5)),
        settings(OrchestrationPolicy::ConcurrentMerge, 2),
    );

    let text = "+14155552671, +14155550100, +19005550199, +447700900123 and +882100000000";
    let outcome = p.enrich(text, None).await.expect("enrich");

    assert_eq!(outcome.entries.len(), 2);
    assert_eq!(outcome.omitted, 3);
    let kept: Vec<_> = outcome.entries.iter().map(|e| e.number.e164()).collect();
    assert_eq!(kept, vec!["+14155552671", "+14155550100"]);
}

// ---------------------------------------------------------------------------
// Fallback to basic metadata
// ---------------------------------------------------------------------------

#[tokio::test]
async fn no_providers_means_basic_metadata_everywhere() {
    let catalog = StubCatalog::new();
    let p = pipeline(
        ProviderRegistry::empty(),
        settings(OrchestrationPolicy::ConcurrentMerge, 3),
    );

    let outcome = p
        .enrich("+447700900123 +14155550100", None)
        .await
        .expect("enrich");

    for entry in &outcome.entries {
        let local = catalog.metadata(&entry.number);
        for field in ProfileField::ALL {
            let value = entry.profile.field(field);
            assert_eq!(value.source, FieldSource::BasicMetadata);
            assert_eq!(value.value, local.field(field));
        }
    }
    assert_eq!(
        outcome.entries[0].profile.carrier.value.as_deref(),
        Some("Stub Mobile")
    );
}

#[tokio::test]
async fn failing_providers_fall_back_to_basic_metadata() {
    let server = MockServer::start().await;
    mount(&server, "broken", ResponseTemplate::new(500)).await;
    mount(&server, "denied", ResponseTemplate::new(401)).await;
    mount(
        &server,
        "flagged",
        ResponseTemplate::new(200).set_body_json(json!({"error": {"code": 101}, "carrier": "no"})),
    )
    .await;

    let p = pipeline(
        registry(
            vec![
                provider_config(&server, "broken", 1),
                provider_config(&server, "denied", 2),
                provider_config(&server, "flagged", 3),
            ],
            Duration::from_secs(5),
        ),
        settings(OrchestrationPolicy::ConcurrentMerge, 3),
    );

    let outcome = p.enrich("+14155552671", None).await.expect("enrich");
    let profile = &outcome.entries[0].profile;

    assert_eq!(profile.carrier.source, FieldSource::BasicMetadata);
    assert_eq!(profile.carrier.value, None);
    assert_eq!(profile.line_type.value.as_deref(), Some("mobile"));
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

#[tokio::test]
async fn higher_priority_provider_wins_even_when_slower() {
    let server = MockServer::start().await;
    mount(
        &server,
        "alpha",
        ResponseTemplate::new(200)
            .set_body_json(json!({"carrier": "X"}))
            .set_delay(Duration::from_millis(100)),
    )
    .await;
    mount(
        &server,
        "beta",
        ResponseTemplate::new(200).set_body_json(json!({"carrier": "Y", "location": "Oakland"})),
    )
    .await;

    let p = pipeline(
        registry(
            vec![
                provider_config(&server, "beta", 2),
                provider_config(&server, "alpha", 1),
            ],
            Duration::from_secs(5),
        ),
        settings(OrchestrationPolicy::ConcurrentMerge, 3),
    );

    let outcome = p.enrich("+14155552671", None).await.expect("enrich");
    let profile = &outcome.entries[0].profile;

    assert_eq!(profile.carrier.value.as_deref(), Some("X"));
    assert_eq!(profile.carrier.source, FieldSource::Provider("alpha".into()));
    assert_eq!(profile.location.value.as_deref(), Some("Oakland"));
    assert_eq!(profile.location.source, FieldSource::Provider("beta".into()));
}

#[tokio::test]
async fn sequential_fallback_stops_at_first_useful_provider() {
    let server = MockServer::start().await;
    mount(&server, "alpha", ResponseTemplate::new(503)).await;
    Mock::given(method("GET"))
        .and(path("/beta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"carrier": "Y"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gamma"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"carrier": "Z"})))
        .expect(0)
        .mount(&server)
        .await;

    let p = pipeline(
        registry(
            vec![
                provider_config(&server, "alpha", 1),
                provider_config(&server, "beta", 2),
                provider_config(&server, "gamma", 3),
            ],
            Duration::from_secs(5),
        ),
        settings(OrchestrationPolicy::SequentialFallback, 3),
    );

    let outcome = p.enrich("+14155552671", None).await.expect("enrich");
    assert_eq!(
        outcome.entries[0].profile.carrier.value.as_deref(),
        Some("Y")
    );
}

#[tokio::test]
async fn slow_provider_is_isolated_by_timeout() {
    let server = MockServer::start().await;
    mount(
        &server,
        "slow",
        ResponseTemplate::new(200)
            .set_body_json(json!({"carrier": "late", "location": "late"}))
            .set_delay(Duration::from_secs(3)),
    )
    .await;
    mount(
        &server,
        "fast",
        ResponseTemplate::new(200).set_body_json(json!({"carrier": "Z"})),
    )
    .await;

    let p = pipeline(
        registry(
            vec![
                provider_config(&server, "slow", 1),
                provider_config(&server, "fast", 2),
            ],
            Duration::from_secs(10),
        ),
        settings(OrchestrationPolicy::ConcurrentMerge, 3),
    );

    let outcome = p.enrich("+14155552671", None).await.expect("enrich");
    let profile = &outcome.entries[0].profile;

    assert_eq!(profile.carrier.value.as_deref(), Some("Z"));
    assert_eq!(profile.carrier.source, FieldSource::Provider("fast".into()));
    assert_eq!(profile.location.source, FieldSource::BasicMetadata);
}

#[tokio::test]
async fn provider_timeout_override_outlasts_pipeline_timeout() {
    let server = MockServer::start().await;
    mount(
        &server,
        "patient",
        ResponseTemplate::new(200)
            .set_body_json(json!({"carrier": "Patient Telecom"}))
            .set_delay(Duration::from_millis(800)),
    )
    .await;

    let mut config = provider_config(&server, "patient", 1);
    config.timeout_secs = Some(5);

    // Pipeline-wide limit is 300 ms; the provider allows 5 s.
    let p = pipeline(
        registry(vec![config], Duration::from_millis(300)),
        settings(OrchestrationPolicy::ConcurrentMerge, 3),
    );

    let outcome = p.enrich("+14155552671", None).await.expect("enrich");
    let profile = &outcome.entries[0].profile;

    assert_eq!(profile.carrier.value.as_deref(), Some("Patient Telecom"));
    assert_eq!(profile.carrier.source, FieldSource::Provider("patient".into()));
}

// ---------------------------------------------------------------------------
// Risk
// ---------------------------------------------------------------------------

#[tokio::test]
async fn risk_levels_follow_number_properties() {
    let p = pipeline(
        ProviderRegistry::empty(),
        settings(OrchestrationPolicy::ConcurrentMerge, 10),
    );

    let outcome = p
        .enrich(
            "+14155552671 +19005550199 +882100000000 +15550001111",
            None,
        )
        .await
        .expect("enrich");

    let risks: Vec<_> = outcome.entries.iter().map(|e| e.risk).collect();
    assert_eq!(
        risks,
        vec![
            RiskLevel::Low,
            RiskLevel::High,
            RiskLevel::Medium,
            RiskLevel::High
        ]
    );
    for entry in &outcome.entries {
        assert_eq!(entry.risk, entry.profile.risk);
        assert_eq!(entry.report.get("Validation & Risk", "Risk"), Some(entry.risk.label()));
    }
}

#[tokio::test]
async fn provider_reported_premium_line_is_high_risk() {
    let server = MockServer::start().await;
    mount(
        &server,
        "alpha",
        ResponseTemplate::new(200).set_body_json(json!({"line_type": "premium_rate"})),
    )
    .await;

    let p = pipeline(
        registry(vec![provider_config(&server, "alpha", 1)], Duration::from_secs(5)),
        settings(OrchestrationPolicy::ConcurrentMerge, 3),
    );

    let outcome = p.enrich("+14155550100", None).await.expect("enrich");
    assert_eq!(outcome.entries[0].risk, RiskLevel::High);
}

// ---------------------------------------------------------------------------
// Scenario and progress
// ---------------------------------------------------------------------------

#[tokio::test]
async fn single_mobile_number_without_providers() {
    let p = pipeline(
        ProviderRegistry::empty(),
        settings(OrchestrationPolicy::ConcurrentMerge, 3),
    );

    let outcome = p.enrich("+14155552671", None).await.expect("enrich");

    assert_eq!(outcome.entries.len(), 1);
    assert_eq!(outcome.omitted, 0);
    let entry = &outcome.entries[0];
    assert_eq!(entry.number.region(), Some("US"));
    assert_eq!(entry.risk, RiskLevel::Low);
    for field in ProfileField::ALL {
        assert_eq!(entry.profile.field(field).source, FieldSource::BasicMetadata);
        assert_eq!(
            entry.report.get("Sources", field.label()),
            Some("basic metadata")
        );
    }
    p.shutdown();
}

#[derive(Default)]
struct Recorder {
    events: std::sync::Mutex<Vec<String>>,
}

impl ProgressReporter for Recorder {
    fn candidates_found(&self, total: usize, omitted: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("found {total} (-{omitted})"));
    }

    fn number_started(&self, e164: &str, current: usize, total: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("{current}/{total} {e164}"));
    }

    fn done(&self, outcome: &EnrichmentOutcome) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done {}", outcome.entries.len()));
    }
}

#[tokio::test]
async fn progress_is_reported_per_candidate() {
    let p = pipeline(
        ProviderRegistry::empty(),
        settings(OrchestrationPolicy::ConcurrentMerge, 2),
    );
    let recorder = Recorder::default();

    p.enrich_with_progress("+14155552671 +14155550100 +447700900123", None, &recorder)
        .await
        .expect("enrich");

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "found 3 (-1)",
            "1/2 +14155552671",
            "2/2 +14155550100",
            "done 2"
        ]
    );
}

#[tokio::test]
async fn outcome_serializes_to_json() {
    let p = pipeline(
        ProviderRegistry::empty(),
        settings(OrchestrationPolicy::ConcurrentMerge, 3),
    );
    let outcome = p.enrich("+14155552671", None).await.expect("enrich");

    let value = serde_json::to_value(&outcome).expect("json");
    assert_eq!(value["omitted"], 0);
    assert_eq!(value["entries"][0]["risk"], "low");
    assert_eq!(value["entries"][0]["profile"]["carrier"]["source"], "basic_metadata");
}
