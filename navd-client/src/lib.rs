//! # navd-client
//!
//! Client library for the navd routing daemon.
//!
//! This crate provides:
//! - Async TCP connections with length-prefixed framing
//! - The one-command-per-connection exchange discipline
//! - High-level API for routing, version, and unpack commands

pub mod client;
pub mod connection;
pub mod error;

pub use client::{request_route, Client};
pub use connection::{Connection, ConnectionConfig};
pub use error::ClientError;
