//! The lookup interface and its generic HTTP implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use numberscope_shared::{
    CanonicalNumber, CredentialPlacement, NUMBER_PLACEHOLDER, NumberEncoding, ProfileField,
    ProviderConfig, ProviderError, ProviderErrorKind, ProviderResult,
};

use crate::mapping;

/// User-Agent string for provider requests.
const USER_AGENT: &str = concat!("numberscope/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an upstream body quoted in error messages.
const MAX_QUOTED_BODY: usize = 200;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A single external source of carrier/location/line-type data.
///
/// `lookup` never fails: every transport, auth, decoding or rate-limit
/// problem comes back as a [`ProviderResult`] with `error` set.
#[async_trait]
pub trait LookupProvider: Send + Sync {
    /// Provider name used for attribution and logs.
    fn name(&self) -> &str;

    /// Rank in the fixed priority order (lower is consulted first).
    fn priority(&self) -> u32;

    /// Perform exactly one lookup for `number`.
    async fn lookup(&self, number: &CanonicalNumber) -> ProviderResult;

    /// Provider-specific call timeout, replacing the pipeline-wide one when set.
    fn timeout_override(&self) -> Option<Duration> {
        None
    }

    /// Whether a network session is currently held.
    fn is_connected(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// HttpProvider
// ---------------------------------------------------------------------------

/// Generic JSON-over-HTTP provider; request shape and response mapping come
/// entirely from its [`ProviderConfig`].
pub struct HttpProvider {
    config: ProviderConfig,
    credential: Option<String>,
    timeout: Duration,
    /// Created on first lookup, dropped with the provider.
    client: OnceCell<Client>,
}

impl HttpProvider {
    /// Create a provider. `default_timeout` applies unless the config overrides it.
    pub fn new(config: ProviderConfig, credential: Option<String>, default_timeout: Duration) -> Self {
        let timeout = config
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(default_timeout);

        Self {
            config,
            credential,
            timeout,
            client: OnceCell::new(),
        }
    }

    /// Effective per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn client(&self) -> Result<&Client, ProviderError> {
        self.client
            .get_or_try_init(|| async {
                debug!(provider = %self.config.name, "opening provider session");
                Client::builder()
                    .user_agent(USER_AGENT)
                    .timeout(self.timeout)
                    .build()
                    .map_err(|e| {
                        ProviderError::new(
                            ProviderErrorKind::Transport,
                            format!("failed to build HTTP client: {e}"),
                        )
                    })
            })
            .await
    }

    fn encode_number(&self, number: &CanonicalNumber) -> String {
        match self.config.number_encoding {
            NumberEncoding::E164 => number.e164().to_string(),
            NumberEncoding::Digits => number.e164().trim_start_matches('+').to_string(),
        }
    }

    fn request(&self, client: &Client, number: &CanonicalNumber) -> RequestBuilder {
        let encoded = self.encode_number(number);
        let url = self.config.base_url.replace(NUMBER_PLACEHOLDER, &encoded);

        let mut request = client.get(url).query(&self.config.query);

        if let Some(param) = &self.config.number_param {
            request = request.query(&[(param.as_str(), encoded.as_str())]);
        }

        if let (Some(placement), Some(credential)) = (&self.config.credential, &self.credential) {
            request = match placement {
                CredentialPlacement::Query { param } => {
                    request.query(&[(param.as_str(), credential.as_str())])
                }
                CredentialPlacement::Header { name } => request.header(name.as_str(), credential),
                CredentialPlacement::Bearer => request.bearer_auth(credential),
            };
        }

        request
    }

    async fn fetch(&self, number: &CanonicalNumber) -> Result<Value, ProviderError> {
        let client = self.client().await?;

        let response = self
            .request(client, number)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ProviderError::new(
                    ProviderErrorKind::Auth,
                    format!("HTTP {status}"),
                ));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(ProviderError::new(
                    ProviderErrorKind::RateLimited,
                    format!("HTTP {status}"),
                ));
            }
            s if !s.is_success() => {
                return Err(ProviderError::new(
                    ProviderErrorKind::Upstream,
                    format!("HTTP {status}"),
                ));
            }
            _ => {}
        }

        let body = response.text().await.map_err(request_error)?;

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::new(
                ProviderErrorKind::Decode,
                format!("invalid JSON: {e} (got: {})", quote(&body)),
            )
        })
    }

    /// Turn a decoded body into a result using the configured field mapping.
    fn map_body(&self, body: &Value, elapsed: Duration) -> ProviderResult {
        let fields = &self.config.fields;

        if let Some(flag) = fields.error.as_deref().and_then(|p| mapping::resolve(body, p)) {
            if mapping::is_error_flag(flag) {
                return ProviderResult::failed(
                    &self.config.name,
                    self.config.priority,
                    ProviderError::new(
                        ProviderErrorKind::Upstream,
                        format!("upstream reported error: {}", quote(&flag.to_string())),
                    ),
                    elapsed,
                );
            }
        }

        ProviderResult::success(&self.config.name, self.config.priority, elapsed)
            .with_field(
                ProfileField::Carrier,
                mapping::extract(body, fields.carrier.as_deref()),
            )
            .with_field(
                ProfileField::Location,
                mapping::extract(body, fields.location.as_deref()),
            )
            .with_field(
                ProfileField::LineType,
                mapping::extract(body, fields.line_type.as_deref()),
            )
    }
}

#[async_trait]
impl LookupProvider for HttpProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn priority(&self) -> u32 {
        self.config.priority
    }

    #[instrument(skip_all, fields(provider = %self.config.name, number = %number.e164()))]
    async fn lookup(&self, number: &CanonicalNumber) -> ProviderResult {
        let start = Instant::now();

        let result = match self.fetch(number).await {
            Ok(body) => self.map_body(&body, start.elapsed()),
            Err(error) => ProviderResult::failed(
                &self.config.name,
                self.config.priority,
                error,
                start.elapsed(),
            ),
        };

        debug!(
            error = result.is_error(),
            elapsed_ms = result.elapsed.as_millis() as u64,
            "provider lookup finished"
        );
        result
    }

    fn timeout_override(&self) -> Option<Duration> {
        self.config.timeout_secs.map(Duration::from_secs)
    }

    fn is_connected(&self) -> bool {
        self.client.initialized()
    }
}

fn request_error(e: reqwest::Error) -> ProviderError {
    let kind = if e.is_timeout() {
        ProviderErrorKind::Timeout
    } else {
        ProviderErrorKind::Transport
    };
    ProviderError::new(kind, e.to_string())
}

fn quote(body: &str) -> &str {
    let mut end = body.len().min(MAX_QUOTED_BODY);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
