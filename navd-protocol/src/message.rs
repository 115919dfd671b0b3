//! Typed messages exchanged with the routing daemon.
//!
//! Every exchange opens with a [`CommandEnvelope`] announcing the command
//! kind, followed by the command body, and is answered by a single result
//! message. The daemon serves exactly one command per connection.

use serde::{Deserialize, Serialize};

/// Command kinds understood by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandKind {
    VersionCommand,
    UnpackCommand,
    RoutingCommand,
}

/// Envelope announcing the kind of command that follows on the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub value: CommandKind,
}

impl CommandEnvelope {
    pub fn new(value: CommandKind) -> Self {
        Self { value }
    }
}

/// One point a computed route must pass through, in route order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,

    /// Penalty in seconds for leaving this waypoint against `heading`.
    /// Serialized only when set; the daemon distinguishes unset from zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_penalty: Option<f64>,

    /// Heading in degrees at this waypoint. Serialized only when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
}

impl Waypoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            heading_penalty: None,
            heading: None,
        }
    }

    pub fn with_heading_penalty(mut self, penalty: f64) -> Self {
        self.heading_penalty = Some(penalty);
        self
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }
}

/// Body of a ROUTING_COMMAND exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingRequest {
    /// Identifier of the preprocessed map dataset on the daemon host.
    pub data_directory: String,

    /// Radius in meters for snapping waypoints to the road network.
    pub lookup_radius: u32,

    /// Resolve street names and road types for the edges of the route.
    pub lookup_edge_names: bool,

    /// Waypoints in route order.
    pub waypoints: Vec<Waypoint>,
}

impl RoutingRequest {
    pub fn new(data_directory: impl Into<String>, waypoints: Vec<Waypoint>) -> Self {
        Self {
            data_directory: data_directory.into(),
            lookup_radius: crate::DEFAULT_LOOKUP_RADIUS,
            lookup_edge_names: true,
            waypoints,
        }
    }

    pub fn with_lookup_radius(mut self, radius: u32) -> Self {
        self.lookup_radius = radius;
        self
    }

    pub fn with_lookup_edge_names(mut self, lookup: bool) -> Self {
        self.lookup_edge_names = lookup;
        self
    }
}

/// Daemon verdict on a routing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteStatus {
    Success,
    LoadFailed,
    RouteFailed,
    NameLookupFailed,
    TypeLookupFailed,
    /// Any status code this client does not recognize.
    #[serde(other)]
    Unknown,
}

/// One node of a computed route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub latitude: f64,
    pub longitude: f64,
}

/// One edge of a computed route.
///
/// `name_id` and `type_id` index into `RoutingResult::edge_names` and
/// `RoutingResult::edge_types` once the daemon has resolved them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub n_segments: u32,
    pub name_id: u32,
    pub type_id: u32,
    pub seconds: f64,
    pub branching_possible: bool,
}

/// Result of a ROUTING_COMMAND exchange.
///
/// The route fields are populated only when `status` is `SUCCESS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingResult {
    pub status: RouteStatus,

    /// Total travel time of the route in seconds.
    #[serde(default)]
    pub seconds: f64,

    #[serde(default)]
    pub nodes: Vec<Node>,

    #[serde(default)]
    pub edges: Vec<Edge>,

    #[serde(default)]
    pub edge_names: Vec<String>,

    #[serde(default)]
    pub edge_types: Vec<String>,
}

impl RoutingResult {
    /// Creates an empty result with the given status.
    pub fn with_status(status: RouteStatus) -> Self {
        Self {
            status,
            seconds: 0.0,
            nodes: Vec::new(),
            edges: Vec::new(),
            edge_names: Vec::new(),
            edge_types: Vec::new(),
        }
    }
}

/// Body of a VERSION_COMMAND exchange (carries no fields).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRequest {}

/// Result of a VERSION_COMMAND exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionResult {
    pub version: String,
}

/// Body of an UNPACK_COMMAND exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnpackRequest {
    /// Path to the packed map module on the daemon host.
    pub map_module_file: String,

    /// Delete the packed file after unpacking.
    pub delete_file: bool,
}

impl UnpackRequest {
    pub fn new(map_module_file: impl Into<String>, delete_file: bool) -> Self {
        Self {
            map_module_file: map_module_file.into(),
            delete_file,
        }
    }
}

/// Daemon verdict on an unpack request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnpackStatus {
    Success,
    FailUnpacking,
    #[serde(other)]
    Unknown,
}

/// Result of an UNPACK_COMMAND exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnpackResult {
    pub status: UnpackStatus,
}
