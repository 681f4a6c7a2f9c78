#![allow(dead_code)]
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::{
    net::TcpStream,
    task,
    time::{timeout, Duration, Instant},
};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use url::Url;

pub type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub async fn spawn_server() -> (u16, task::JoinHandle<()>) {
    let port = portpicker::pick_unused_port().unwrap();
    let bind = format!("127.0.0.1:{port}");
    let server = werewolf_server::run_on(&bind).await.unwrap();
    let handle = task::spawn(async move {
        server.await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(200)).await;
    (port, handle)
}

pub async fn connect(port: u16, n: usize) -> Vec<Ws> {
    let url = Url::parse(&format!("ws://127.0.0.1:{port}/ws")).unwrap();
    futures::future::join_all((0..n).map(|_| async {
        let (ws, _) = connect_async(url.clone()).await.unwrap();
        ws
    }))
    .await
}

pub async fn send(sock: &mut Ws, target: &str, payload: Value) {
    let frame = json!({ "type": 1, "target": target, "arguments": [payload] });
    sock.send(Message::Text(frame.to_string())).await.unwrap();
}

/// Read frames until one with `target` arrives; returns its payload.
pub async fn recv(sock: &mut Ws, target: &str) -> Value {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        let msg = timeout(left, sock.next())
            .await
            .unwrap_or_else(|_| panic!("no {target} frame in time"))
            .expect("socket closed")
            .expect("socket error");
        if let Message::Text(txt) = msg {
            let v: Value = serde_json::from_str(&txt).unwrap();
            if v["target"] == target {
                return v["arguments"][0].clone();
            }
        }
    }
}

pub async fn recv_phase(sock: &mut Ws, phase: &str) -> Value {
    loop {
        let p = recv(sock, "phase").await;
        if p["phase"] == phase {
            return p;
        }
    }
}

/// Seat everyone in a fresh room: client 0 hosts, the rest join.
/// Returns (room id, player id per client).
pub async fn seat(clients: &mut [Ws], config: Value) -> (String, Vec<String>) {
    send(&mut clients[0], "createRoom", json!({ "name": "P0", "config": config })).await;
    let joined = recv(&mut clients[0], "joined").await;
    let room_id = joined["roomId"].as_str().unwrap().to_string();
    let mut ids = vec![joined["playerId"].as_str().unwrap().to_string()];

    for (i, sock) in clients.iter_mut().enumerate().skip(1) {
        send(sock, "joinRoom", json!({ "roomId": room_id, "name": format!("P{i}") })).await;
        let joined = recv(sock, "joined").await;
        ids.push(joined["playerId"].as_str().unwrap().to_string());
    }
    (room_id, ids)
}

/// Each client's dealt role key.
pub async fn roles(clients: &mut [Ws]) -> Vec<String> {
    let mut out = Vec::new();
    for sock in clients.iter_mut() {
        let role = recv(sock, "role").await;
        out.push(role["role"].as_str().unwrap().to_string());
    }
    out
}
