//! End-to-end tests against a real listener: HTTP accounts and the relay socket.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use socialhub::{app, config::ServerConfig, relay::Heartbeat, store::SqliteStore, AppState};
use tokio::net::TcpListener;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

async fn test_state() -> AppState {
    let store = SqliteStore::in_memory().await.expect("in-memory store");
    AppState::new(Arc::new(store))
}

async fn start_test_server() -> SocketAddr {
    start_server(test_state().await).await
}

async fn start_server(state: AppState) -> SocketAddr {
    let app = app(state, &ServerConfig::default());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn open_socket(addr: SocketAddr) -> Socket {
    let (socket, _) = connect_async(format!("ws://{addr}/ws")).await.expect("ws connect");
    socket
}

async fn send(socket: &mut Socket, event: &str, data: Value) {
    let frame = json!({ "event": event, "data": data });
    socket.send(Message::text(frame.to_string())).await.unwrap();
}

async fn next_event(socket: &mut Socket) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for event")
            .expect("socket closed")
            .expect("socket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn assert_silent(socket: &mut Socket) {
    let res = tokio::time::timeout(Duration::from_millis(200), socket.next()).await;
    assert!(res.is_err(), "unexpected frame: {res:?}");
}

/// Registers `username` and waits until the server has processed it, using a
/// chat message echo as the barrier.
async fn register(socket: &mut Socket, username: &str) {
    send(socket, "register user", json!({ "username": username })).await;
    send(socket, "chat message", json!({ "from": username, "message": "joined" })).await;
    loop {
        let event = next_event(socket).await;
        if event["event"] == "chat message" && event["data"]["from"] == username {
            break;
        }
    }
}

async fn logged_in_client(base: &str, username: &str) -> reqwest::Client {
    let client = reqwest::Client::builder().cookie_store(true).build().unwrap();
    let creds = json!({ "username": username, "password": "pw" });
    client.post(format!("{base}/signup")).json(&creds).send().await.unwrap();
    let resp = client.post(format!("{base}/login")).json(&creds).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    client
}

async fn online(client: &reqwest::Client, base: &str) -> Value {
    client.get(format!("{base}/api/online")).send().await.unwrap().json().await.unwrap()
}

/// Polls `/api/online` until it matches, giving the server time to notice a
/// dropped socket.
async fn wait_for_online(client: &reqwest::Client, base: &str, expected: Value) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let current = online(client, base).await;
        if current == expected {
            return;
        }
        assert!(tokio::time::Instant::now() < deadline, "online stuck at {current}");
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[tokio::test]
async fn private_message_scenario_over_websocket() {
    let addr = start_test_server().await;
    let mut a = open_socket(addr).await;
    let mut b = open_socket(addr).await;
    let mut c = open_socket(addr).await;

    register(&mut a, "alice").await;
    register(&mut b, "bob").await;

    // flush the join chatter everyone saw
    for socket in [&mut a, &mut c] {
        loop {
            let event = next_event(socket).await;
            if event["data"]["from"] == "bob" {
                break;
            }
        }
    }

    send(&mut a, "private message", json!({ "from": "alice", "to": "bob", "message": "hi" })).await;

    let expected = json!({
        "event": "private message",
        "data": { "from": "alice", "to": "bob", "message": "hi" }
    });
    assert_eq!(next_event(&mut b).await, expected);
    assert_eq!(next_event(&mut a).await, expected);
    assert_silent(&mut a).await;
    assert_silent(&mut b).await;
    assert_silent(&mut c).await;
}

#[tokio::test]
async fn bad_frames_get_an_error_event() {
    let addr = start_test_server().await;
    let mut a = open_socket(addr).await;

    a.send(Message::text("not json")).await.unwrap();
    let event = next_event(&mut a).await;
    assert_eq!(event["event"], "error");
    assert_eq!(event["data"]["event"], "unknown");

    // the connection survives
    send(&mut a, "screen share", json!({ "username": "alice", "sharing": true })).await;
    assert_eq!(next_event(&mut a).await["event"], "screen share");
}

#[tokio::test]
async fn account_session_round_trip() {
    let addr = start_test_server().await;
    let base = format!("http://{addr}");
    let client = reqwest::Client::builder().cookie_store(true).build().unwrap();
    let creds = json!({ "username": "alice", "password": "correct horse" });

    let resp = client.post(format!("{base}/signup")).json(&creds).send().await.unwrap();
    assert_eq!(resp.status(), 201);

    let resp = client.post(format!("{base}/signup")).json(&creds).send().await.unwrap();
    assert_eq!(resp.status(), 409);

    let resp = client.get(format!("{base}/api/me")).send().await.unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client
        .post(format!("{base}/login"))
        .json(&json!({ "username": "alice", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client.post(format!("{base}/login")).json(&creds).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let me: Value = client.get(format!("{base}/api/me")).send().await.unwrap().json().await.unwrap();
    assert_eq!(me["username"], "alice");

    let blogs: Value = client.get(format!("{base}/api/blogs")).send().await.unwrap().json().await.unwrap();
    assert_eq!(blogs, json!([]));

    let resp = client.post(format!("{base}/logout")).send().await.unwrap();
    assert_eq!(resp.status(), 204);

    let resp = client.get(format!("{base}/api/me")).send().await.unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn history_endpoints_reflect_relay_writes() {
    let addr = start_test_server().await;
    let base = format!("http://{addr}");
    let client = reqwest::Client::builder().cookie_store(true).build().unwrap();
    let creds = json!({ "username": "bob", "password": "pw" });
    client.post(format!("{base}/signup")).json(&creds).send().await.unwrap();
    client.post(format!("{base}/login")).json(&creds).send().await.unwrap();

    let mut a = open_socket(addr).await;
    register(&mut a, "alice").await;
    send(&mut a, "private message", json!({ "from": "alice", "to": "bob", "message": "ping" })).await;
    assert_eq!(next_event(&mut a).await["event"], "private message");

    let history: Value = client
        .get(format!("{base}/api/messages/alice"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history[0]["from"], "alice");
    assert_eq!(history[0]["message"], "ping");

    let online: Value = client.get(format!("{base}/api/online")).send().await.unwrap().json().await.unwrap();
    assert_eq!(online, json!(["alice"]));
}

#[tokio::test]
async fn malformed_credentials_get_a_json_error() {
    let addr = start_test_server().await;
    let base = format!("http://{addr}");
    let client = reqwest::Client::new();

    for path in ["signup", "login"] {
        let resp = client
            .post(format!("{base}/{path}"))
            .json(&json!({ "username": "x" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        let message = body["error"].as_str().expect("error message");
        assert!(message.contains("password"), "{message}");
    }
}

#[tokio::test]
async fn closing_the_socket_releases_presence() {
    let addr = start_test_server().await;
    let base = format!("http://{addr}");
    let client = logged_in_client(&base, "bob").await;

    let mut a = open_socket(addr).await;
    register(&mut a, "alice").await;
    assert_eq!(online(&client, &base).await, json!(["alice"]));

    a.close(None).await.unwrap();
    wait_for_online(&client, &base, json!([])).await;
}

#[tokio::test]
async fn silent_client_is_dropped_after_missed_pongs() {
    let heartbeat = Heartbeat {
        interval: Duration::from_millis(100),
        timeout: Duration::from_millis(100),
    };
    let addr = start_server(test_state().await.with_heartbeat(heartbeat)).await;
    let base = format!("http://{addr}");
    let client = logged_in_client(&base, "bob").await;

    let mut a = open_socket(addr).await;
    register(&mut a, "alice").await;

    // the socket stays open but is never polled again, so pings go unanswered
    wait_for_online(&client, &base, json!([])).await;
    drop(a);
}
