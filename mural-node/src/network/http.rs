use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tower_http::cors::{Any, CorsLayer};

use crate::node::Node;
use crate::protocol::{MessageType, Reply, Request};

#[derive(Debug, Deserialize)]
struct LoginBody {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostBody {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(default, alias = "visibility")]
    message_type: MessageType,
}

/// The `/api/*` surface served on the node's HTTP port.
pub fn router(node: Arc<Node>) -> Router {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/post", post(post_message))
        .route("/api/toggle_offline", post(toggle_offline))
        .route("/api/messages", get(messages))
        .route("/api/status", get(status))
        .fallback(not_found)
        .layer(cors_layer())
        .with_state(node)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Decodes a JSON body whatever its `Content-Type`. An empty body counts as
/// `{}` so the handler reports the missing fields itself.
fn parse_body<T: DeserializeOwned>(node: &Node, body: &Bytes) -> Result<T, Json<Reply>> {
    let raw: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        &body[..]
    };
    serde_json::from_slice(raw).map_err(|err| {
        log::debug!("[{}] Unreadable HTTP body: {err}", node.id());
        Json(Reply::error("Invalid request"))
    })
}

async fn login(State(node): State<Arc<Node>>, body: Bytes) -> Json<Reply> {
    let body: LoginBody = match parse_body(&node, &body) {
        Ok(body) => body,
        Err(reply) => return reply,
    };
    Json(
        node.handle(Request::Login {
            username: body.username,
            password: body.password,
        })
        .await,
    )
}

async fn logout(State(node): State<Arc<Node>>, body: Bytes) -> Json<Reply> {
    let body: TokenBody = match parse_body(&node, &body) {
        Ok(body) => body,
        Err(reply) => return reply,
    };
    Json(node.handle(Request::Logout { token: body.token }).await)
}

async fn post_message(State(node): State<Arc<Node>>, body: Bytes) -> Json<Reply> {
    let body: PostBody = match parse_body(&node, &body) {
        Ok(body) => body,
        Err(reply) => return reply,
    };
    Json(
        node.handle(Request::PostMessage {
            token: body.token,
            content: body.content,
            message_type: body.message_type,
        })
        .await,
    )
}

async fn toggle_offline(State(node): State<Arc<Node>>, body: Bytes) -> Json<Reply> {
    let body: TokenBody = match parse_body(&node, &body) {
        Ok(body) => body,
        Err(reply) => return reply,
    };
    Json(node.handle(Request::ToggleOffline { token: body.token }).await)
}

async fn messages(State(node): State<Arc<Node>>, headers: HeaderMap) -> Json<Reply> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    Json(
        node.handle(Request::GetMessages {
            token,
            public_only: false,
        })
        .await,
    )
}

async fn status(State(node): State<Arc<Node>>) -> Json<Reply> {
    Json(node.handle(Request::CheckStatus).await)
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}
