//! HTTP client for the registry's JSON API.

use async_trait::async_trait;
use ecr_replication_core::{PutReplicationConfigurationRequest, WireConfiguration, WireRegistry};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::client::RemoteClient;
use crate::config::{ClientAuth, ClientConfig};
use crate::error::{ClientError, ClientErrorKind};

/// Service prefix of the `X-Amz-Target` header.
pub const TARGET_PREFIX: &str = "AmazonEC2ContainerRegistry_V20150921";

/// Content type of every request.
pub const CONTENT_TYPE_JSON: &str = "application/x-amz-json-1.1";

/// Header naming the API action.
pub const TARGET_HEADER: &str = "x-amz-target";

/// API actions used by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Reads the registry description.
    DescribeRegistry,
    /// Replaces the replication configuration.
    PutReplicationConfiguration,
}

impl Action {
    /// Returns the action name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DescribeRegistry => "DescribeRegistry",
            Self::PutReplicationConfiguration => "PutReplicationConfiguration",
        }
    }

    /// Returns the `X-Amz-Target` header value for this action.
    #[must_use]
    pub fn target(self) -> String {
        format!("{TARGET_PREFIX}.{}", self.as_str())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "__type")]
    error_type: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

#[derive(Serialize)]
struct Empty {}

/// [`RemoteClient`] speaking the registry's JSON 1.1 protocol.
#[derive(Debug)]
pub struct HttpRegistryClient {
    config: ClientConfig,
    endpoint: Url,
    http: reqwest::Client,
}

impl HttpRegistryClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientErrorKind::Configuration`] error if the endpoint is
    /// not a valid URL, the credentials cannot be encoded as a header, or
    /// the HTTP client cannot be created.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ecr_replication_client::{ClientConfig, HttpRegistryClient};
    ///
    /// let client = HttpRegistryClient::new(ClientConfig::new("us-east-1"))?;
    /// # Ok::<(), ecr_replication_client::ClientError>(())
    /// ```
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let endpoint = Url::parse(&config.endpoint()).map_err(|e| {
            ClientError::new(
                ClientErrorKind::Configuration,
                format!("invalid endpoint '{}': {e}", config.endpoint()),
            )
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .default_headers(Self::auth_headers(&config.auth)?)
            .build()?;

        Ok(Self {
            config,
            endpoint,
            http,
        })
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the resolved endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    #[instrument(skip_all, fields(action = action.as_str(), region = %self.config.region))]
    async fn call<B: Serialize + Sync>(
        &self,
        action: Action,
        body: &B,
    ) -> Result<Vec<u8>, ClientError> {
        let payload = serde_json::to_vec(body)
            .map_err(|e| ClientError::new(ClientErrorKind::InvalidRequest, e.to_string()))?;

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .header(TARGET_HEADER, action.target())
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(status = status.as_u16(), bytes = bytes.len(), "API response");

        if status.is_success() {
            return Ok(bytes.to_vec());
        }

        let body: ApiErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
        let message = body
            .message
            .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned());
        Err(ClientError::from_api_error(
            status.as_u16(),
            body.error_type.as_deref(),
            message,
        ))
    }

    fn auth_headers(auth: &ClientAuth) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();

        let value = match auth {
            ClientAuth::None => return Ok(headers),
            ClientAuth::Basic { username, password } => {
                let credentials = base64::Engine::encode(
                    &base64::engine::general_purpose::STANDARD,
                    format!("{username}:{password}"),
                );
                format!("Basic {credentials}")
            }
            ClientAuth::Bearer { token } => format!("Bearer {token}"),
        };

        let mut value = HeaderValue::from_str(&value).map_err(|_| {
            ClientError::new(
                ClientErrorKind::Configuration,
                "credentials are not a valid header value",
            )
        })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);

        Ok(headers)
    }
}

#[async_trait]
impl RemoteClient for HttpRegistryClient {
    async fn read_configuration(&self) -> Result<WireRegistry, ClientError> {
        let bytes = self.call(Action::DescribeRegistry, &Empty {}).await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            ClientError::malformed(format!("cannot decode registry description: {e}"))
        })
    }

    async fn write_configuration(
        &self,
        configuration: &WireConfiguration,
    ) -> Result<(), ClientError> {
        let request = PutReplicationConfigurationRequest {
            replication_configuration: configuration.clone(),
        };
        // The echoed configuration is not trusted; the reconciler confirms
        // with a separate read.
        self.call(Action::PutReplicationConfiguration, &request).await?;
        Ok(())
    }
}
