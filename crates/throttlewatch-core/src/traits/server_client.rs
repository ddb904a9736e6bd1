// # Server Client Trait
//
// Defines the interface to the upstream account API that knows which
// virtual servers an account owns and how their network interfaces are
// configured.
//
// ## Implementations
//
// - netcup SCP webservice: `throttlewatch-netcup` crate
//
// ## Boundary Types
//
// The upstream API is loosely typed: an interface's address field may be a
// list or a single value, and the throttle flag may be missing. Those shapes
// are resolved once, here, into [`ServerInterface`]. An interface that cannot
// be resolved at all is reported as a [`MalformedInterface`] rather than
// failing the whole server.
//
// ## Usage
//
// ```rust,ignore
// use throttlewatch_core::{Credentials, ServerClientFactory};
//
// let client = factory.create(&credentials)?;
// for server in client.list_servers().await? {
//     let info = client.server_info(&server).await?;
//     println!("{} has {} interface(s)", server, info.interfaces.len());
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Credentials;

/// Address value of an interface as reported upstream
///
/// Either a single address or a list of addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IpAddresses {
    /// A list of addresses (the common case)
    Many(Vec<String>),
    /// A single scalar address
    One(String),
}

impl IpAddresses {
    /// Normalize into a list of non-empty address strings
    ///
    /// A scalar becomes a one-element list; empty strings are dropped.
    pub fn into_vec(self) -> Vec<String> {
        let addresses = match self {
            IpAddresses::Many(addresses) => addresses,
            IpAddresses::One(address) => vec![address],
        };
        addresses
            .into_iter()
            .filter(|address| !address.is_empty())
            .collect()
    }
}

impl From<Vec<String>> for IpAddresses {
    fn from(addresses: Vec<String>) -> Self {
        IpAddresses::Many(addresses)
    }
}

impl From<&str> for IpAddresses {
    fn from(address: &str) -> Self {
        IpAddresses::One(address.to_string())
    }
}

/// A network interface whose attributes were resolved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInterface {
    /// IPv4 addresses bound to the interface
    #[serde(default, rename = "ipv4IP")]
    pub ipv4_addresses: Option<IpAddresses>,

    /// Whether traffic shaping is active (absent means not throttled)
    #[serde(default, rename = "trafficThrottled")]
    pub traffic_throttled: Option<bool>,
}

impl ServerInterface {
    /// Create an interface from an address list and throttle flag
    pub fn new(addresses: impl Into<IpAddresses>, throttled: bool) -> Self {
        Self {
            ipv4_addresses: Some(addresses.into()),
            traffic_throttled: Some(throttled),
        }
    }

    /// Normalized address list
    pub fn addresses(&self) -> Vec<String> {
        self.ipv4_addresses
            .clone()
            .map(IpAddresses::into_vec)
            .unwrap_or_default()
    }

    /// Throttle flag, defaulting to `false`
    pub fn throttled(&self) -> bool {
        self.traffic_throttled.unwrap_or(false)
    }
}

/// An interface whose attributes could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedInterface {
    /// Why resolution failed
    pub reason: String,
    /// Field names that were present (diagnostic detail)
    pub fields: Vec<String>,
}

/// One interface slot of a server
pub type InterfaceEntry = std::result::Result<ServerInterface, MalformedInterface>;

/// Server information returned by [`ServerClient::server_info`]
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Network interfaces in upstream order
    pub interfaces: Vec<InterfaceEntry>,
}

impl ServerInfo {
    /// Server info from well-formed interfaces
    pub fn with_interfaces(interfaces: Vec<ServerInterface>) -> Self {
        Self {
            interfaces: interfaces.into_iter().map(Ok).collect(),
        }
    }
}

/// Trait for upstream account clients
///
/// A client is bound to one account's credentials at construction time
/// (see [`ServerClientFactory`]).
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Responsibilities
///
/// - ✅ Perform API calls to the upstream endpoint
/// - ✅ Resolve upstream shapes into the boundary types above
/// - ✅ Apply a network-level timeout to every call
/// - ❌ Retry or back off (owned by `RefreshScheduler`)
/// - ❌ Cache results (owned by `SnapshotStore`)
/// - ❌ Spawn tasks (violates shutdown determinism)
#[async_trait]
pub trait ServerClient: Send + Sync {
    /// List the identifiers of every server owned by the account
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<String>)`: Server identifiers (may be empty)
    /// - `Err(Error)`: Credential or network failure
    async fn list_servers(&self) -> Result<Vec<String>, crate::Error>;

    /// Fetch interface information for one server
    ///
    /// # Parameters
    ///
    /// - `server`: A server identifier from [`ServerClient::list_servers`]
    ///
    /// # Returns
    ///
    /// - `Ok(ServerInfo)`: The server's interfaces
    /// - `Err(Error)`: If the request failed
    async fn server_info(&self, server: &str) -> Result<ServerInfo, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing clients bound to one account
pub trait ServerClientFactory: Send + Sync {
    /// Create a ServerClient instance for the given credentials
    ///
    /// # Returns
    ///
    /// A boxed ServerClient trait object, or an error if the client
    /// could not be constructed
    fn create(&self, credentials: &Credentials) -> Result<Box<dyn ServerClient>, crate::Error>;
}
