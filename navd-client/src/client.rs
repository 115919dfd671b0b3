//! High-level client API.

use crate::connection::{Connection, ConnectionConfig};
use crate::error::ClientError;
use navd_protocol::message::*;

/// Requests one route over an established connection.
///
/// Consumes the connection: the daemon serves a single command per
/// connection, so it is closed before this returns, on every path.
/// Waypoint count is not checked locally; the daemon's status is
/// authoritative.
pub async fn request_route(
    mut conn: Connection,
    data_directory: &str,
    waypoints: Vec<Waypoint>,
) -> Result<RoutingResult, ClientError> {
    let outcome = exchange_route(&mut conn, data_directory, waypoints).await;
    conn.close().await;
    let result = outcome?;

    match result.status {
        RouteStatus::Success => Ok(result),
        RouteStatus::LoadFailed => Err(ClientError::DataLoad(data_directory.to_string())),
        RouteStatus::RouteFailed => Err(ClientError::RouteFailed),
        RouteStatus::NameLookupFailed => Err(ClientError::NameLookup),
        RouteStatus::TypeLookupFailed => Err(ClientError::TypeLookup),
        RouteStatus::Unknown => Err(ClientError::UnknownStatus),
    }
}

async fn exchange_route(
    conn: &mut Connection,
    data_directory: &str,
    waypoints: Vec<Waypoint>,
) -> Result<RoutingResult, ClientError> {
    conn.write_message(&CommandEnvelope::new(CommandKind::RoutingCommand))
        .await?;
    conn.write_message(&RoutingRequest::new(data_directory, waypoints))
        .await?;
    conn.read_message().await
}

async fn exchange_version(conn: &mut Connection) -> Result<VersionResult, ClientError> {
    conn.write_message(&CommandEnvelope::new(CommandKind::VersionCommand))
        .await?;
    conn.write_message(&VersionRequest::default()).await?;
    conn.read_message().await
}

async fn exchange_unpack(
    conn: &mut Connection,
    request: &UnpackRequest,
) -> Result<UnpackResult, ClientError> {
    conn.write_message(&CommandEnvelope::new(CommandKind::UnpackCommand))
        .await?;
    conn.write_message(request).await?;
    conn.read_message().await
}

/// High-level client for the routing daemon.
///
/// Opens a fresh connection per call; the daemon protocol allows exactly one
/// command per connection. Concurrent requests therefore never share state.
pub struct Client {
    config: ConnectionConfig,
}

impl Client {
    /// Creates a new client with the given configuration.
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    /// Computes the shortest route through `waypoints`, in order.
    ///
    /// `data_directory` names a preprocessed map dataset on the daemon
    /// host. On success the result's `edge_names` and `edge_types` are
    /// index-aligned with `edges` via each edge's `name_id`/`type_id`.
    pub async fn route(
        &self,
        data_directory: &str,
        waypoints: Vec<Waypoint>,
    ) -> Result<RoutingResult, ClientError> {
        let conn = Connection::connect(self.config.clone()).await?;
        request_route(conn, data_directory, waypoints).await
    }

    /// Asks the daemon for its version string.
    pub async fn version(&self) -> Result<String, ClientError> {
        let mut conn = Connection::connect(self.config.clone()).await?;
        let outcome = exchange_version(&mut conn).await;
        conn.close().await;
        Ok(outcome?.version)
    }

    /// Unpacks a packed map module on the daemon host.
    pub async fn unpack(
        &self,
        map_module_file: &str,
        delete_file: bool,
    ) -> Result<(), ClientError> {
        let mut conn = Connection::connect(self.config.clone()).await?;
        let request = UnpackRequest::new(map_module_file, delete_file);
        let outcome = exchange_unpack(&mut conn, &request).await;
        conn.close().await;

        match outcome?.status {
            UnpackStatus::Success => Ok(()),
            UnpackStatus::FailUnpacking => Err(ClientError::Unpack(map_module_file.to_string())),
            UnpackStatus::Unknown => Err(ClientError::UnknownStatus),
        }
    }
}
