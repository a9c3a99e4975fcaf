use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::{
    net::TcpStream,
    task,
    time::{timeout, Duration, Instant},
};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use url::Url;
use werewolf_server::config::Config;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> (u16, task::JoinHandle<()>) {
    let port = portpicker::pick_unused_port().unwrap();
    let bind = format!("127.0.0.1:{port}");
    let server = werewolf_server::run_on(&bind, &Config::default()).await.unwrap();
    let handle = task::spawn(async move {
        server.await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(200)).await;
    (port, handle)
}

async fn connect(port: u16) -> Socket {
    let url = Url::parse(&format!("ws://127.0.0.1:{port}/ws")).unwrap();
    let (ws, _) = connect_async(url).await.unwrap();
    ws
}

async fn send(sock: &mut Socket, target: &str, argument: Value) {
    let frame = json!({"type": 1, "target": target, "arguments": [argument]});
    sock.send(Message::Text(frame.to_string())).await.unwrap();
}

async fn next_frame(sock: &mut Socket) -> Value {
    loop {
        match timeout(Duration::from_secs(10), sock.next()).await {
            Ok(Some(Ok(Message::Text(txt)))) => return serde_json::from_str(&txt).unwrap(),
            Ok(Some(Ok(_))) => continue,
            other => panic!("socket closed or silent: {other:?}"),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn full_game_flow() {
    let (port, srv) = spawn_server().await;
    let mut sock = connect(port).await;

    send(
        &mut sock,
        "startGame",
        json!({"playerName": "Tester", "playerCount": 6, "useAI": false, "seed": 42}),
    )
    .await;

    let deadline = Instant::now() + Duration::from_secs(60);
    let mut states = 0;
    let summary = loop {
        assert!(Instant::now() < deadline, "game did not finish in time");
        let frame = next_frame(&mut sock).await;
        let payload = frame["arguments"][0].clone();
        match frame["target"].as_str().unwrap() {
            "state" => {
                states += 1;
                if payload["phase"] != "gameOver" {
                    for player in payload["players"].as_array().unwrap() {
                        if player["id"] != 1 {
                            assert!(player["role"].is_null(), "role leaked: {player}");
                        }
                    }
                }
            }
            "question" => {
                let text = payload["text"].as_str().unwrap();
                let answer = if text.ends_with("(y/n)") { "n" } else { "I trust nobody." };
                send(&mut sock, "answer", json!(answer)).await;
            }
            "options" => {
                assert!(!payload["options"].as_array().unwrap().is_empty());
                send(&mut sock, "answer", json!(0)).await;
            }
            "gameEnd" => break payload,
            "message" => assert!(payload["text"].is_string()),
            other => panic!("unexpected frame `{other}`: {frame}"),
        }
    };

    assert!(states > 0);
    let winner = summary["winner"].as_str().unwrap();
    assert!(winner == "village" || winner == "werewolf");
    let players = summary["players"].as_array().unwrap();
    assert_eq!(players.len(), 6);
    assert!(players.iter().all(|p| p["role"].is_string()));
    assert_eq!(players[0]["name"], "Tester");

    srv.abort();
}
