//! In-process fake of the chat backend.
//!
//! Serves the three HTTP endpoints and the socket with canned replies, and
//! records what the client sent.

#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::sync::broadcast;
use url::Url;

/// What the socket should do next.
#[derive(Debug, Clone)]
pub enum Push {
    /// Send a text frame.
    Text(String),
    /// Send a close frame (`None` = no status) and hang up.
    Close(Option<u16>),
    /// Hang up without a close frame.
    Drop,
}

/// Canned HTTP reply.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self { status: 200, body: body.into() }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }
}

#[derive(Clone)]
pub struct Backend {
    pub history: Arc<Mutex<Reply>>,
    pub send_reply: Arc<Mutex<Reply>>,
    pub delete_reply: Arc<Mutex<Reply>>,
    /// Broadcast accepted sends back as `new_message` frames.
    pub echo_sends: bool,
    pub sent: Arc<Mutex<Vec<Value>>>,
    pub deleted: Arc<Mutex<Vec<Value>>>,
    /// Close codes received from clients (`None` = no status).
    pub closes: Arc<Mutex<Vec<Option<u16>>>>,
    pub pushes: broadcast::Sender<Push>,
    clock: Arc<Mutex<u32>>,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            history: Arc::new(Mutex::new(Reply::ok(r#"{"status":"success","data":[]}"#))),
            send_reply: Arc::new(Mutex::new(Reply::ok(r#"{"status":"success"}"#))),
            delete_reply: Arc::new(Mutex::new(Reply::ok(r#"{"status":"success"}"#))),
            echo_sends: false,
            sent: Arc::default(),
            deleted: Arc::default(),
            closes: Arc::default(),
            pushes: broadcast::channel(64).0,
            clock: Arc::default(),
        }
    }
}

impl Backend {
    pub fn with_history(self, records: Value) -> Self {
        *self.history.lock().unwrap() =
            Reply::ok(json!({ "status": "success", "data": records }).to_string());
        self
    }

    pub fn echoing(mut self) -> Self {
        self.echo_sends = true;
        self
    }

    pub fn set_send_reply(&self, reply: Reply) {
        *self.send_reply.lock().unwrap() = reply;
    }

    pub fn set_delete_reply(&self, reply: Reply) {
        *self.delete_reply.lock().unwrap() = reply;
    }

    /// Push to every connected socket.
    pub fn push(&self, push: Push) {
        let _ = self.pushes.send(push);
    }

    /// Start serving; returns the base URL.
    pub async fn spawn(self) -> Url {
        let app = Router::new()
            .route("/api/chat/messages", get(messages))
            .route("/api/chat/send", post(send))
            .route("/api/chat/delete", post(delete))
            .route("/api/chat/ws", get(socket))
            .with_state(self);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    /// Wait until a client close has been recorded.
    pub async fn next_close(&self) -> Option<u16> {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(code) = self.closes.lock().unwrap().first().copied() {
                    return code;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap()
    }
}

pub fn new_message_frame(timestamp: &str, user: &str, content: &str) -> String {
    json!({
        "action": "new_message",
        "payload": { "Timestamp": timestamp, "UserName": user, "MessageType": "text", "Content": content },
    })
    .to_string()
}

fn reply(r: &Reply) -> Response {
    (StatusCode::from_u16(r.status).unwrap(), r.body.clone()).into_response()
}

async fn messages(State(b): State<Backend>) -> Response {
    let r = b.history.lock().unwrap().clone();
    reply(&r)
}

async fn send(State(b): State<Backend>, Json(body): Json<Value>) -> Response {
    b.sent.lock().unwrap().push(body.clone());
    let r = b.send_reply.lock().unwrap().clone();

    if b.echo_sends && (200..300).contains(&r.status) {
        let second = {
            let mut clock = b.clock.lock().unwrap();
            *clock += 1;
            *clock
        };
        let timestamp = format!("2024-06-01T00:00:{second:02}Z");
        let user = body["userName"].as_str().unwrap_or_default();
        let content = body["content"].as_str().unwrap_or_default();
        b.push(Push::Text(new_message_frame(&timestamp, user, content)));
    }
    reply(&r)
}

async fn delete(State(b): State<Backend>, Json(body): Json<Value>) -> Response {
    b.deleted.lock().unwrap().push(body.clone());
    let r = b.delete_reply.lock().unwrap().clone();

    if (200..300).contains(&r.status) {
        if let Some(ts) = body["timestamp"].as_str() {
            let frame = json!({ "action": "delete_message", "payload": { "timestamp": ts } });
            b.push(Push::Text(frame.to_string()));
        }
    }
    reply(&r)
}

async fn socket(State(b): State<Backend>, upgrade: WebSocketUpgrade) -> Response {
    // Subscribe before the handshake completes so no push is missed.
    let pushes = b.pushes.subscribe();
    upgrade.on_upgrade(move |ws| serve_socket(ws, pushes, b))
}

async fn serve_socket(mut ws: WebSocket, mut pushes: broadcast::Receiver<Push>, b: Backend) {
    loop {
        tokio::select! {
            push = pushes.recv() => match push {
                Ok(Push::Text(text)) => {
                    if ws.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                },
                Ok(Push::Close(code)) => {
                    let frame = code.map(|code| CloseFrame { code, reason: "".into() });
                    let _ = ws.send(Message::Close(frame)).await;
                    break;
                },
                Ok(Push::Drop) | Err(_) => break,
            },
            incoming = ws.recv() => match incoming {
                Some(Ok(Message::Close(frame))) => {
                    b.closes.lock().unwrap().push(frame.map(|f| f.code));
                    break;
                },
                Some(Ok(_)) => {},
                _ => break,
            },
        }
    }
}
