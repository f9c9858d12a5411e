//! Configuration types for the registry API client.

use std::time::Duration;

/// Configuration for [`HttpRegistryClient`](crate::HttpRegistryClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Region whose registry is managed (e.g. "us-east-1").
    pub region: String,

    /// Endpoint override. When unset the regional endpoint is used.
    pub endpoint: Option<String>,

    /// Authentication configuration.
    pub auth: ClientAuth,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl ClientConfig {
    /// Creates a configuration for the given region.
    ///
    /// # Examples
    ///
    /// ```
    /// use ecr_replication_client::ClientConfig;
    ///
    /// let config = ClientConfig::new("us-east-1");
    /// assert_eq!(config.endpoint(), "https://api.ecr.us-east-1.amazonaws.com");
    /// ```
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            endpoint: None,
            auth: ClientAuth::None,
            timeout: Duration::from_secs(30),
            user_agent: format!("ecr-replication/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Overrides the endpoint.
    ///
    /// # Examples
    ///
    /// ```
    /// use ecr_replication_client::ClientConfig;
    ///
    /// let config = ClientConfig::new("us-east-1").with_endpoint("http://localhost:4566/");
    /// assert_eq!(config.endpoint(), "http://localhost:4566");
    /// ```
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the authentication method.
    #[must_use]
    pub fn with_auth(mut self, auth: ClientAuth) -> Self {
        self.auth = auth;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the endpoint requests are sent to, without a trailing slash.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.endpoint.as_ref().map_or_else(
            || format!("https://api.ecr.{}.amazonaws.com", self.region),
            |endpoint| endpoint.trim_end_matches('/').to_string(),
        )
    }
}

/// Authentication methods for the registry API.
///
/// Request signing is left to a fronting proxy; the client only attaches
/// static credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAuth {
    /// No authentication (local emulators, signing proxies).
    None,

    /// Basic authentication.
    Basic {
        /// Username.
        username: String,
        /// Password or token.
        password: String,
    },

    /// Bearer token authentication.
    Bearer {
        /// Token value.
        token: String,
    },
}

impl ClientAuth {
    /// Creates basic authentication.
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Creates bearer token authentication.
    ///
    /// # Examples
    ///
    /// ```
    /// use ecr_replication_client::ClientAuth;
    ///
    /// let auth = ClientAuth::bearer("my-token");
    /// ```
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("eu-west-1");
        assert_eq!(config.auth, ClientAuth::None);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("ecr-replication/"));
        assert_eq!(config.endpoint(), "https://api.ecr.eu-west-1.amazonaws.com");
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::new("us-west-2")
            .with_endpoint("http://127.0.0.1:9000")
            .with_auth(ClientAuth::basic("user", "pass"))
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.endpoint(), "http://127.0.0.1:9000");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(matches!(config.auth, ClientAuth::Basic { .. }));
    }
}
