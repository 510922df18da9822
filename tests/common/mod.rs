//! In-process stand-in for the leaderboard service

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};

pub struct FakeLeaderboard {
    pub url: String,
    received: Arc<Mutex<Vec<Value>>>,
}

impl FakeLeaderboard {
    /// Payloads received so far
    pub fn received(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }
}

struct Reply {
    status: StatusCode,
    body: String,
    received: Arc<Mutex<Vec<Value>>>,
}

async fn submit(State(reply): State<Arc<Reply>>, Json(payload): Json<Value>) -> Response {
    reply.received.lock().unwrap().push(payload);
    (reply.status, reply.body.clone()).into_response()
}

/// Start a leaderboard that answers every submission with `status` and `body`
pub async fn spawn_leaderboard(status: StatusCode, body: &str) -> FakeLeaderboard {
    let received = Arc::new(Mutex::new(Vec::new()));
    let reply = Arc::new(Reply {
        status,
        body: body.to_string(),
        received: Arc::clone(&received),
    });

    let app = Router::new()
        .route("/api/submit", post(submit))
        .with_state(reply);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeLeaderboard {
        url: format!("http://{}/api/submit", addr),
        received,
    }
}
