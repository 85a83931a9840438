//! Management API integration module.
//!
//! This module provides the transport layer for talking to a switch
//! management REST API: the [`Transport`] contract the engine consumes,
//! and the concrete HTTP client implementing it with retry and vendor
//! error normalization.

mod client;
mod transport;

pub use client::FosClient;
pub use transport::{Method, Transport};
