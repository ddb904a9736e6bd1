//! Test doubles and common utilities for contract tests
//!
//! The scripted factory hands out clients whose behaviour is fixed per
//! login name, so a test can describe a whole upstream landscape
//! (failing accounts, slow servers, panicking servers) up front.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use throttlewatch_core::error::{Error, Result};
use throttlewatch_core::traits::{ServerClient, ServerClientFactory, ServerInfo, ServerInterface};
use throttlewatch_core::{AccountConfig, Credentials};

/// Behaviour of one server
#[derive(Clone)]
pub enum ServerScript {
    /// Return this information
    Info(ServerInfo),
    /// Fail the request
    Fail,
    /// Never answer
    Hang,
    /// Panic while `remaining > 0` (decrementing it), then return `info`
    PanicThen {
        remaining: Arc<AtomicUsize>,
        info: ServerInfo,
    },
    /// Return `infos[n % len]` on the n-th request
    Rotate {
        calls: Arc<AtomicUsize>,
        infos: Vec<ServerInfo>,
    },
}

/// Behaviour of one account
#[derive(Clone)]
pub enum AccountScript {
    /// List these servers, in order
    Servers(Vec<(String, ServerScript)>),
    /// Client construction fails
    CreateFails,
    /// Listing servers fails
    ListFails,
}

/// Factory serving scripted clients keyed by login name
///
/// Unknown login names behave like [`AccountScript::CreateFails`].
#[derive(Clone, Default)]
pub struct ScriptedFactory {
    accounts: HashMap<String, AccountScript>,
    create_calls: Arc<AtomicUsize>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account script
    pub fn with_account(mut self, login: &str, script: AccountScript) -> Self {
        self.accounts.insert(login.to_string(), script);
        self
    }

    /// Number of clients created so far (one per account per cycle)
    pub fn create_call_count(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

impl ServerClientFactory for ScriptedFactory {
    fn create(&self, credentials: &Credentials) -> Result<Box<dyn ServerClient>> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        match self.accounts.get(&credentials.loginname) {
            Some(AccountScript::Servers(servers)) => Ok(Box::new(ScriptedClient {
                servers: Some(servers.clone()),
            })),
            Some(AccountScript::ListFails) => Ok(Box::new(ScriptedClient { servers: None })),
            Some(AccountScript::CreateFails) | None => Err(Error::auth(format!(
                "login {} rejected",
                credentials.loginname
            ))),
        }
    }
}

/// Client produced by [`ScriptedFactory`]
pub struct ScriptedClient {
    servers: Option<Vec<(String, ServerScript)>>,
}

#[async_trait]
impl ServerClient for ScriptedClient {
    async fn list_servers(&self) -> Result<Vec<String>> {
        match &self.servers {
            Some(servers) => Ok(servers.iter().map(|(name, _)| name.clone()).collect()),
            None => Err(Error::collection("upstream unavailable")),
        }
    }

    async fn server_info(&self, server: &str) -> Result<ServerInfo> {
        let script = self
            .servers
            .iter()
            .flatten()
            .find(|(name, _)| name == server)
            .map(|(_, script)| script.clone())
            .ok_or_else(|| Error::collection(format!("unknown server {}", server)))?;

        match script {
            ServerScript::Info(info) => Ok(info),
            ServerScript::Fail => Err(Error::collection(format!("server {} unavailable", server))),
            ServerScript::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            ServerScript::PanicThen { remaining, info } => {
                let left = remaining.load(Ordering::SeqCst);
                if left > 0 {
                    remaining.store(left - 1, Ordering::SeqCst);
                    panic!("scripted panic while reading server {}", server);
                }
                Ok(info)
            }
            ServerScript::Rotate { calls, infos } => {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                infos
                    .get(n % infos.len().max(1))
                    .cloned()
                    .ok_or_else(|| Error::collection(format!("no info scripted for {}", server)))
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// Server info whose first interface reports `ips`
pub fn server_with(ips: &[&str], throttled: bool) -> ServerInfo {
    let ips: Vec<String> = ips.iter().map(|ip| ip.to_string()).collect();
    ServerInfo::with_interfaces(vec![ServerInterface::new(ips, throttled)])
}

/// Account script with the given servers
pub fn servers(list: Vec<(&str, ServerScript)>) -> AccountScript {
    AccountScript::Servers(
        list.into_iter()
            .map(|(name, script)| (name.to_string(), script))
            .collect(),
    )
}

/// Complete accounts for the given login names
pub fn accounts(logins: &[&str]) -> Vec<AccountConfig> {
    logins
        .iter()
        .map(|login| AccountConfig::new(*login, "password"))
        .collect()
}

/// Short intervals for scheduler tests
pub const FAST_INTERVAL: Duration = Duration::from_millis(100);
pub const FAST_RETRY_INTERVAL: Duration = Duration::from_millis(20);
pub const FAST_CALL_TIMEOUT: Duration = Duration::from_millis(200);
