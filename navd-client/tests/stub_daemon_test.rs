//! End-to-end exchanges against an in-process stub daemon.

use navd_client::{request_route, Client, ClientError, Connection, ConnectionConfig};
use navd_protocol::message::*;
use navd_protocol::{Decoder, Encoder, ProtocolError, LENGTH_PREFIX_SIZE};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

/// Spawns a stub daemon that runs `handler` on the first connection.
async fn spawn_stub<F, Fut>(handler: F) -> SocketAddr
where
    F: FnOnce(TcpStream) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        handler(stream).await;
    });
    addr
}

fn config(addr: SocketAddr) -> ConnectionConfig {
    ConnectionConfig::new(addr).with_request_timeout(Duration::from_secs(5))
}

async fn read_stub_message<T: serde::de::DeserializeOwned>(
    stream: &mut TcpStream,
    decoder: &mut Decoder,
) -> T {
    let mut buf = [0u8; 4096];
    loop {
        if let Some(message) = decoder.decode_message().unwrap() {
            return message;
        }
        let n = stream.read(&mut buf).await.unwrap();
        assert!(n > 0, "stub: client closed mid-message");
        decoder.extend(&buf[..n]);
    }
}

async fn write_stub_message<T: serde::Serialize>(stream: &mut TcpStream, message: &T) {
    let encoded = Encoder::encode_message(message).unwrap();
    stream.write_all(&encoded).await.unwrap();
}

/// Reads a routing exchange (envelope then request, in that order) and
/// answers it with `result`. Forwards the parsed request to `request_tx`.
async fn routing_stub(
    mut stream: TcpStream,
    result: RoutingResult,
    request_tx: oneshot::Sender<RoutingRequest>,
) {
    let mut decoder = Decoder::new();

    let envelope: CommandEnvelope = read_stub_message(&mut stream, &mut decoder).await;
    assert_eq!(envelope.value, CommandKind::RoutingCommand);

    let request: RoutingRequest = read_stub_message(&mut stream, &mut decoder).await;
    request_tx.send(request).unwrap();

    write_stub_message(&mut stream, &result).await;
}

async fn route_against_stub(
    result: RoutingResult,
    waypoints: Vec<Waypoint>,
) -> (Result<RoutingResult, ClientError>, RoutingRequest) {
    let (request_tx, request_rx) = oneshot::channel();
    let addr = spawn_stub(move |stream| routing_stub(stream, result, request_tx)).await;

    let client = Client::new(config(addr));
    let outcome = client.route("berlin/routing_fast", waypoints).await;
    let seen_request = request_rx.await.unwrap();
    (outcome, seen_request)
}

fn success_result() -> RoutingResult {
    RoutingResult {
        status: RouteStatus::Success,
        seconds: 120.5,
        nodes: vec![
            Node { latitude: 52.00, longitude: 4.30 },
            Node { latitude: 52.05, longitude: 4.35 },
            Node { latitude: 52.10, longitude: 4.40 },
        ],
        edges: vec![
            Edge {
                n_segments: 1,
                name_id: 0,
                type_id: 0,
                seconds: 80.5,
                branching_possible: false,
            },
            Edge {
                n_segments: 1,
                name_id: 1,
                type_id: 1,
                seconds: 40.0,
                branching_possible: true,
            },
        ],
        edge_names: vec!["Main St".to_string(), "Oak Ave".to_string()],
        edge_types: vec!["primary".to_string(), "secondary".to_string()],
    }
}

fn two_waypoints() -> Vec<Waypoint> {
    vec![Waypoint::new(52.0, 4.3), Waypoint::new(52.1, 4.4)]
}

#[tokio::test]
async fn test_route_success() {
    let (outcome, _) = route_against_stub(success_result(), two_waypoints()).await;
    let result = outcome.unwrap();

    assert_eq!(result.seconds, 120.5);
    assert_eq!(result.nodes.len(), 3);
    assert_eq!(result.edges.len(), 2);
    assert_eq!(result.edge_names, vec!["Main St", "Oak Ave"]);
    assert_eq!(result.edge_types, vec!["primary", "secondary"]);
    assert_eq!(result.edge_names.len(), result.edges.len());
    assert_eq!(result.edge_types.len(), result.edges.len());
}

#[tokio::test]
async fn test_request_carries_defaults_and_waypoints() {
    let waypoints = vec![
        Waypoint::new(52.0, 4.3),
        Waypoint::new(52.05, 4.35).with_heading_penalty(30.0),
        Waypoint::new(52.1, 4.4)
            .with_heading_penalty(15.0)
            .with_heading(90.0),
    ];
    let (outcome, request) = route_against_stub(success_result(), waypoints.clone()).await;
    outcome.unwrap();

    assert_eq!(request.data_directory, "berlin/routing_fast");
    assert_eq!(request.lookup_radius, 10000);
    assert!(request.lookup_edge_names);
    assert_eq!(request.waypoints, waypoints);

    // 2-element waypoint: both optionals absent
    assert_eq!(request.waypoints[0].heading_penalty, None);
    assert_eq!(request.waypoints[0].heading, None);
    // 3-element: penalty only
    assert_eq!(request.waypoints[1].heading_penalty, Some(30.0));
    assert_eq!(request.waypoints[1].heading, None);
    // 4-element: both
    assert_eq!(request.waypoints[2].heading_penalty, Some(15.0));
    assert_eq!(request.waypoints[2].heading, Some(90.0));
}

#[tokio::test]
async fn test_load_failed_maps_to_data_load_error() {
    let (outcome, _) = route_against_stub(
        RoutingResult::with_status(RouteStatus::LoadFailed),
        two_waypoints(),
    )
    .await;
    assert!(matches!(outcome, Err(ClientError::DataLoad(dir)) if dir == "berlin/routing_fast"));
}

#[tokio::test]
async fn test_route_failed_maps_to_route_error() {
    let (outcome, _) = route_against_stub(
        RoutingResult::with_status(RouteStatus::RouteFailed),
        two_waypoints(),
    )
    .await;
    assert!(matches!(outcome, Err(ClientError::RouteFailed)));
}

#[tokio::test]
async fn test_name_lookup_failed_maps_to_name_error() {
    let (outcome, _) = route_against_stub(
        RoutingResult::with_status(RouteStatus::NameLookupFailed),
        two_waypoints(),
    )
    .await;
    assert!(matches!(outcome, Err(ClientError::NameLookup)));
}

#[tokio::test]
async fn test_type_lookup_failed_maps_to_type_error() {
    let (outcome, _) = route_against_stub(
        RoutingResult::with_status(RouteStatus::TypeLookupFailed),
        two_waypoints(),
    )
    .await;
    assert!(matches!(outcome, Err(ClientError::TypeLookup)));
}

#[tokio::test]
async fn test_unrecognized_status_maps_to_unknown_status() {
    let addr = spawn_stub(|mut stream| async move {
        let mut decoder = Decoder::new();
        let _: CommandEnvelope = read_stub_message(&mut stream, &mut decoder).await;
        let _: RoutingRequest = read_stub_message(&mut stream, &mut decoder).await;
        // A status this client has never heard of.
        write_stub_message(&mut stream, &serde_json::json!({ "status": "GPS_LOOKUP_FAILED" }))
            .await;
    })
    .await;

    let client = Client::new(config(addr));
    let outcome = client.route("berlin/routing_fast", two_waypoints()).await;
    assert!(matches!(outcome, Err(ClientError::UnknownStatus)));
}

#[tokio::test]
async fn test_truncated_result_is_a_framing_error() {
    let addr = spawn_stub(|mut stream| async move {
        let mut decoder = Decoder::new();
        let _: CommandEnvelope = read_stub_message(&mut stream, &mut decoder).await;
        let _: RoutingRequest = read_stub_message(&mut stream, &mut decoder).await;
        // Declare 100 payload bytes but send only 40, then hang up.
        stream.write_all(&100u32.to_ne_bytes()).await.unwrap();
        stream.write_all(&[b'x'; 40]).await.unwrap();
        stream.shutdown().await.unwrap();
    })
    .await;

    let client = Client::new(config(addr));
    let outcome = client.route("berlin/routing_fast", two_waypoints()).await;
    assert!(matches!(
        outcome,
        Err(ClientError::Protocol(ProtocolError::IncompleteMessage { needed: 60 }))
    ));
}

#[tokio::test]
async fn test_close_without_reply_is_connection_closed() {
    let addr = spawn_stub(|mut stream| async move {
        let mut decoder = Decoder::new();
        let _: CommandEnvelope = read_stub_message(&mut stream, &mut decoder).await;
        let _: RoutingRequest = read_stub_message(&mut stream, &mut decoder).await;
        stream.shutdown().await.unwrap();
    })
    .await;

    let client = Client::new(config(addr));
    let outcome = client.route("berlin/routing_fast", two_waypoints()).await;
    assert!(matches!(outcome, Err(ClientError::ConnectionClosed)));
}

#[tokio::test]
async fn test_connect_to_unreachable_daemon() {
    // Bind then drop to get a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = Client::new(config(addr));
    let outcome = client.route("berlin/routing_fast", two_waypoints()).await;
    assert!(matches!(outcome, Err(ClientError::Connect { .. })));
}

#[tokio::test]
async fn test_connection_is_closed_after_request_route() {
    let (request_tx, _request_rx) = oneshot::channel();
    let addr =
        spawn_stub(move |stream| routing_stub(stream, success_result(), request_tx)).await;

    let conn = Connection::connect(config(addr)).await.unwrap();
    assert!(conn.is_open());

    // request_route consumes the connection; single-use is enforced by the
    // type system.
    let result = request_route(conn, "berlin/routing_fast", two_waypoints())
        .await
        .unwrap();
    assert_eq!(result.status, RouteStatus::Success);
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let addr = spawn_stub(|mut stream| async move {
        let mut buf = [0u8; 1024];
        while stream.read(&mut buf).await.unwrap_or(0) > 0 {}
    })
    .await;

    let mut conn = Connection::connect(config(addr)).await.unwrap();
    conn.close().await;
    assert!(!conn.is_open());
    conn.close().await;
    assert!(!conn.is_open());
}

#[tokio::test]
async fn test_version_exchange() {
    let addr = spawn_stub(|mut stream| async move {
        let mut decoder = Decoder::new();
        let envelope: CommandEnvelope = read_stub_message(&mut stream, &mut decoder).await;
        assert_eq!(envelope.value, CommandKind::VersionCommand);
        let _: VersionRequest = read_stub_message(&mut stream, &mut decoder).await;
        write_stub_message(
            &mut stream,
            &VersionResult {
                version: "0.4".to_string(),
            },
        )
        .await;
    })
    .await;

    let client = Client::new(config(addr));
    assert_eq!(client.version().await.unwrap(), "0.4");
}

#[tokio::test]
async fn test_unpack_failure_maps_to_unpack_error() {
    let addr = spawn_stub(|mut stream| async move {
        let mut decoder = Decoder::new();
        let envelope: CommandEnvelope = read_stub_message(&mut stream, &mut decoder).await;
        assert_eq!(envelope.value, CommandKind::UnpackCommand);
        let request: UnpackRequest = read_stub_message(&mut stream, &mut decoder).await;
        assert_eq!(request.map_module_file, "/maps/berlin.mmm");
        assert!(request.delete_file);
        write_stub_message(
            &mut stream,
            &UnpackResult {
                status: UnpackStatus::FailUnpacking,
            },
        )
        .await;
    })
    .await;

    let client = Client::new(config(addr));
    let outcome = client.unpack("/maps/berlin.mmm", true).await;
    assert!(matches!(outcome, Err(ClientError::Unpack(file)) if file == "/maps/berlin.mmm"));
}

#[tokio::test]
async fn test_result_arrives_across_split_writes() {
    // The daemon may flush the prefix and payload separately; the reader
    // must reassemble them.
    let addr = spawn_stub(|mut stream| async move {
        let mut decoder = Decoder::new();
        let _: CommandEnvelope = read_stub_message(&mut stream, &mut decoder).await;
        let _: RoutingRequest = read_stub_message(&mut stream, &mut decoder).await;

        let encoded = Encoder::encode_message(&success_result()).unwrap();
        stream.write_all(&encoded[..LENGTH_PREFIX_SIZE]).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        stream.write_all(&encoded[LENGTH_PREFIX_SIZE..]).await.unwrap();
    })
    .await;

    let client = Client::new(config(addr));
    let result = client
        .route("berlin/routing_fast", two_waypoints())
        .await
        .unwrap();
    assert_eq!(result.seconds, 120.5);
}
