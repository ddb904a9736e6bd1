// # netcup SCP Client
//
// This crate implements the throttlewatch `ServerClient` against the netcup
// server control panel end-user webservice (SOAP 1.1 over HTTPS).
//
// ## Operations Used
//
// - `getVServers(loginName, password)`: names of the account's servers
// - `getVServerInformation(loginName, password, vservername)`: server
//   details, including its network interfaces
//
// ## Behavior
//
// - One HTTP request per trait call; no retries, no caching
// - HTTP timeout configured (30 seconds by default)
// - SOAP faults become `Error::Provider`, HTTP 401/403 `Error::Authentication`
//
// ## Security Requirements
//
// - The password NEVER appears in logs or Debug output
// - Empty credentials are rejected at construction

pub mod soap;

use async_trait::async_trait;
use std::time::Duration;
use throttlewatch_core::traits::{ServerClient, ServerClientFactory, ServerInfo};
use throttlewatch_core::{Credentials, Error, Result};
use tracing::debug;

/// Default webservice endpoint
pub const DEFAULT_ENDPOINT: &str = "https://www.servercontrolpanel.de/WSEndUser";

/// Default HTTP timeout for webservice requests (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER: &str = "netcup";

/// Client bound to one SCP account
pub struct NetcupClient {
    /// Account credentials
    /// ⚠️ NEVER log the password
    credentials: Credentials,

    /// Webservice URL
    endpoint: String,

    /// Request timeout, reported in timeout errors
    timeout: Duration,

    /// HTTP client for webservice requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for NetcupClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetcupClient")
            .field("loginname", &self.credentials.loginname)
            .field("password", &"<REDACTED>")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl NetcupClient {
    /// Create a client for the public webservice
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_endpoint(credentials, DEFAULT_ENDPOINT, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a client for an explicit endpoint and timeout
    ///
    /// # Errors
    ///
    /// - `Error::Config` if the login name or password is empty
    /// - `Error::Http` if the HTTP client cannot be built
    pub fn with_endpoint(
        credentials: Credentials,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        if credentials.loginname.is_empty() || credentials.password.is_empty() {
            return Err(Error::config("netcup login name and password are required"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            credentials,
            endpoint: endpoint.into(),
            timeout,
            client,
        })
    }

    /// Call a webservice operation and return the raw response document
    ///
    /// The credentials are prepended to `params`.
    async fn call(&self, operation: &str, params: &[(&str, &str)]) -> Result<String> {
        let mut all_params = vec![
            ("loginName", self.credentials.loginname.as_str()),
            ("password", self.credentials.password.as_str()),
        ];
        all_params.extend_from_slice(params);
        let body = soap::envelope(operation, &all_params);

        debug!(
            "Calling {} for account {}",
            operation, self.credentials.loginname
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", "\"\"")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(self.timeout)
                } else {
                    Error::http(format!("{} request failed: {}", operation, e))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::http(format!("failed to read {} response: {}", operation, e)))?;

        if status.is_success() {
            return Ok(text);
        }

        // Faults arrive with a 500 status; prefer their message over the status
        if let Some(fault) = soap::fault_message(&text) {
            return Err(Error::provider(PROVIDER, fault));
        }

        match status.as_u16() {
            401 | 403 => Err(Error::auth(format!(
                "{} rejected for account {}: {}",
                operation, self.credentials.loginname, status
            ))),
            _ => Err(Error::provider(
                PROVIDER,
                format!("{} failed with status {}", operation, status),
            )),
        }
    }
}

#[async_trait]
impl ServerClient for NetcupClient {
    async fn list_servers(&self) -> Result<Vec<String>> {
        let response = self.call("getVServers", &[]).await?;
        soap::parse_vservers(&response)
    }

    async fn server_info(&self, server: &str) -> Result<ServerInfo> {
        let response = self
            .call("getVServerInformation", &[("vservername", server)])
            .await?;
        soap::parse_vserver_information(&response)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Factory for creating netcup clients
#[derive(Debug, Clone)]
pub struct NetcupFactory {
    endpoint: String,
    timeout: Duration,
}

impl NetcupFactory {
    /// Factory for the public webservice with the given request timeout
    pub fn new(timeout: Duration) -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT, timeout)
    }

    /// Factory for an explicit endpoint
    pub fn with_endpoint(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

impl Default for NetcupFactory {
    fn default() -> Self {
        Self::new(DEFAULT_HTTP_TIMEOUT)
    }
}

impl ServerClientFactory for NetcupFactory {
    fn create(&self, credentials: &Credentials) -> Result<Box<dyn ServerClient>> {
        let client =
            NetcupClient::with_endpoint(credentials.clone(), self.endpoint.clone(), self.timeout)?;
        Ok(Box::new(client))
    }
}
