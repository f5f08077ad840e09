//! `DemoServer`: axum routes for the demo page, push stream and todo form.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use futures::Stream;
use parking_lot::RwLock;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::config::DemoConfig;
use crate::updates::tick_frames;

/// Demo page. Connects to the push stream and posts the todo form.
pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>SSEXI demo</title></head>
<body>
  <div id="app" sx-connect="/website-logic">
    <div id="timestamp">Current Time: -</div>
    <div id="counter">Count: 0</div>
    <ul id="todos"></ul>
  </div>
  <form id="todo-form" sx-post="/todo">
    <input type="text" name="todo_text" placeholder="New todo">
    <button type="submit">Add</button>
  </form>
</body>
</html>
"#;

/// Shared state accessible from axum handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Todo items in insertion order.
    pub todos: Arc<RwLock<Vec<String>>>,
    /// Interval between push stream ticks.
    pub tick: Duration,
}

/// The demo server.
#[derive(Debug)]
pub struct DemoServer {
    config: DemoConfig,
    state: AppState,
}

impl DemoServer {
    /// Create a server with an empty todo list.
    pub fn new(config: DemoConfig) -> Self {
        let state = AppState {
            todos: Arc::new(RwLock::new(Vec::new())),
            tick: config.tick(),
        };
        Self { config, state }
    }

    /// Build the axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(index_handler))
            .route("/website-logic", get(website_logic_handler))
            .route("/todo", post(add_todo_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Get the server configuration.
    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    /// Current todo items.
    pub fn todos(&self) -> Vec<String> {
        self.state.todos.read().clone()
    }
}

/// GET /
async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /website-logic
async fn website_logic_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("push stream opened");
    let stream = async_stream::stream! {
        let mut count: u64 = 0;
        loop {
            count += 1;
            let todos = state.todos.read().clone();
            for frame in tick_frames(count, chrono::Utc::now().timestamp(), &todos) {
                yield Ok(Event::default().data(frame.to_string()));
            }
            tokio::time::sleep(state.tick).await;
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// POST /todo
async fn add_todo_handler(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut todo_text = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("todo_text") {
                    continue;
                }
                match field.text().await {
                    Ok(text) => todo_text = Some(text),
                    Err(e) => return e.into_response(),
                }
            }
            Ok(None) => break,
            Err(e) => return e.into_response(),
        }
    }

    let Some(todo_text) = todo_text else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "status": "error", "message": "missing field todo_text" })),
        )
            .into_response();
    };

    info!(todo = %todo_text, "received todo");
    let message = format!("Added todo: {todo_text}");
    state.todos.write().push(todo_text);
    Json(json!({ "status": "success", "message": message })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn make_server() -> DemoServer {
        DemoServer::new(DemoConfig {
            tick_ms: 10,
            ..DemoConfig::default()
        })
    }

    fn multipart_request(name: &str, value: &str) -> Request<Body> {
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n--{boundary}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/todo")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn index_serves_page() {
        let app = make_server().router();
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        let page = String::from_utf8(body.to_vec()).unwrap();
        assert!(page.contains("sx-connect=\"/website-logic\""));
        assert!(page.contains("sx-post=\"/todo\""));
    }

    #[tokio::test]
    async fn add_todo_stores_item() {
        let server = make_server();
        let resp = server
            .router()
            .oneshot(multipart_request("todo_text", "buy milk"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["status"], "success");
        assert_eq!(parsed["message"], "Added todo: buy milk");
        assert_eq!(server.todos(), ["buy milk"]);
    }

    #[tokio::test]
    async fn add_todo_without_field_is_rejected() {
        let server = make_server();
        let resp = server
            .router()
            .oneshot(multipart_request("other", "x"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(server.todos().is_empty());
    }

    #[tokio::test]
    async fn push_stream_is_event_stream() {
        let app = make_server().router();
        let req = Request::builder()
            .uri("/website-logic")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "text/event-stream"
        );
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let app = make_server().router();
        let req = Request::builder()
            .uri("/nonexistent")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
