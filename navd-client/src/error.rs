//! Client error types.

use navd_protocol::ProtocolError;
use std::net::SocketAddr;
use thiserror::Error;

/// Client errors.
///
/// Framing and decode failures stay distinguishable inside
/// [`ClientError::Protocol`]; no kind is downgraded into another.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("connection closed by the daemon")]
    ConnectionClosed,

    #[error("request timeout")]
    Timeout,

    #[error("daemon could not load data directory {0:?}")]
    DataLoad(String),

    #[error("no route found between the given waypoints")]
    RouteFailed,

    #[error("street name lookup failed on the daemon")]
    NameLookup,

    #[error("road type lookup failed on the daemon")]
    TypeLookup,

    #[error("daemon failed to unpack {0:?}")]
    Unpack(String),

    #[error("daemon returned an unrecognized status code")]
    UnknownStatus,
}

impl ClientError {
    /// Returns whether retrying on a fresh connection could help.
    ///
    /// Daemon verdicts on the request itself are terminal; only
    /// transport-level failures are worth a retry, and the retry is the
    /// caller's decision.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Connect { .. }
                | ClientError::Io(_)
                | ClientError::ConnectionClosed
                | ClientError::Timeout
        )
    }
}
