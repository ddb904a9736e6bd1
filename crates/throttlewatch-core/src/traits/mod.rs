//! Core traits for throttlewatch
//!
//! This module defines the abstract interface to the upstream account API.
//!
//! - [`ServerClient`]: List an account's servers and read their interfaces
//! - [`ServerClientFactory`]: Bind a client to one account's credentials

pub mod server_client;

pub use server_client::{
    InterfaceEntry, IpAddresses, MalformedInterface, ServerClient, ServerClientFactory,
    ServerInfo, ServerInterface,
};
