//! Client configuration.
//!
//! [`ClientConfig`] is immutable once built and shared read-only by every
//! request issued through a client. The service URL and key are mandatory;
//! building without them fails before any network activity.

use url::Url;

use crate::{ApiVersion, SearchError};

/// Environment variable holding the service URL.
pub const ENV_URL: &str = "SEARCH_SERVICE_URL";
/// Environment variable holding the service key.
pub const ENV_KEY: &str = "SEARCH_SERVICE_KEY";
/// Environment variable holding an optional API-version override.
pub const ENV_API_VERSION: &str = "SEARCH_API_VERSION";

const DEFAULT_PORT: u16 = 443;

/// Connection settings for one search service.
#[derive(Clone)]
pub struct ClientConfig {
    url: Url,
    key: String,
    version: ApiVersion,
    headers: Vec<(String, String)>,
}

impl ClientConfig {
    /// Starts a builder with the two mandatory settings.
    pub fn builder(url: impl Into<String>, key: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            url: url.into(),
            key: key.into(),
            version: None,
            headers: Vec::new(),
        }
    }

    /// Reads the configuration from `SEARCH_SERVICE_URL`, `SEARCH_SERVICE_KEY`
    /// and (optionally) `SEARCH_API_VERSION`.
    pub fn from_env() -> Result<Self, SearchError> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let url = var(ENV_URL).ok_or_else(|| SearchError::missing(ENV_URL))?;
        let key = var(ENV_KEY).ok_or_else(|| SearchError::missing(ENV_KEY))?;
        let mut builder = Self::builder(url, key);
        if let Some(version) = var(ENV_API_VERSION) {
            builder = builder.version(version);
        }
        builder.build()
    }

    /// The service URL as configured.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The service authentication key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The API version appended to every request.
    pub fn version(&self) -> &ApiVersion {
        &self.version
    }

    /// Extra headers sent with every request, in configuration order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The scheme, host and port every request is sent to, without a
    /// trailing slash (e.g. `https://svc.search.windows.net:443`).
    ///
    /// Only the host of the configured URL is used; its path is ignored. The
    /// port is the one the URL names, else the scheme's default (443 for
    /// `https`).
    pub fn origin(&self) -> String {
        let host = self.url.host_str().unwrap_or_default();
        let port = self.url.port_or_known_default().unwrap_or(DEFAULT_PORT);
        format!("{}://{host}:{port}", self.url.scheme())
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url.as_str())
            .field("key", &"<redacted>")
            .field("version", &self.version.as_str())
            .field("headers", &self.headers)
            .finish()
    }
}

// ---------------------------------------------------------------------------

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    url: String,
    key: String,
    version: Option<String>,
    headers: Vec<(String, String)>,
}

impl ClientConfigBuilder {
    /// Overrides the API version (defaults to
    /// [`DEFAULT_API_VERSION`](crate::DEFAULT_API_VERSION)).
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Adds a header sent with every request. Later calls with the same
    /// (case-insensitive) name replace earlier ones.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Validates the settings and builds the configuration.
    ///
    /// ## Errors
    ///
    /// Returns an argument error if the URL or key is empty, if the URL
    /// cannot be parsed or has no host, or if the API version is malformed.
    pub fn build(self) -> Result<ClientConfig, SearchError> {
        if self.url.trim().is_empty() {
            return Err(SearchError::argument(
                "please supply the url of the search service",
            ));
        }
        if self.key.is_empty() {
            return Err(SearchError::argument(
                "please supply the key of the search service",
            ));
        }

        let url = Url::parse(self.url.trim())
            .map_err(|e| SearchError::argument(format!("invalid service url: {e}")))?;
        if url.host_str().is_none_or(str::is_empty) {
            return Err(SearchError::argument("service url has no host"));
        }

        let version = match self.version {
            Some(tag) => tag.parse()?,
            None => ApiVersion::default(),
        };

        Ok(ClientConfig {
            url,
            key: self.key,
            version,
            headers: self.headers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn url_and_key_are_mandatory() {
        let err = ClientConfig::builder("", "key").build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
        assert!(err.message().contains("url"));

        let err = ClientConfig::builder("https://svc.search.windows.net", "")
            .build()
            .unwrap_err();
        assert!(err.message().contains("key"));
    }

    #[test]
    fn version_defaults_when_absent() {
        let config = ClientConfig::builder("https://svc.search.windows.net", "k")
            .build()
            .unwrap();
        assert_eq!(config.version().as_str(), crate::DEFAULT_API_VERSION);
    }

    #[test]
    fn malformed_version_is_rejected() {
        let err = ClientConfig::builder("https://svc.search.windows.net", "k")
            .version("yesterday")
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
    }

    #[test]
    fn origin_uses_host_and_secure_port() {
        let config = ClientConfig::builder("https://svc.search.windows.net/ignored/path", "k")
            .build()
            .unwrap();
        assert_eq!(config.origin(), "https://svc.search.windows.net:443");

        let local = ClientConfig::builder("http://127.0.0.1:8080", "k")
            .build()
            .unwrap();
        assert_eq!(local.origin(), "http://127.0.0.1:8080");
    }

    #[test]
    fn plain_http_defaults_to_its_own_port() {
        let config = ClientConfig::builder("http://svc.example.net", "k")
            .build()
            .unwrap();
        assert_eq!(config.origin(), "http://svc.example.net:80");
    }

    #[test]
    fn repeated_headers_replace_case_insensitively() {
        let config = ClientConfig::builder("https://svc.search.windows.net", "k")
            .header("x-ms-tenant", "a")
            .header("X-MS-Tenant", "b")
            .build()
            .unwrap();
        assert_eq!(config.headers(), &[("X-MS-Tenant".to_string(), "b".to_string())]);
    }

    #[test]
    fn debug_output_redacts_the_key() {
        let config = ClientConfig::builder("https://svc.search.windows.net", "secret")
            .build()
            .unwrap();
        assert!(!format!("{config:?}").contains("secret"));
    }
}
