//! End-to-end tests for the runtime over the HTTP transport.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ssexi_core::Document;
use ssexi_events::{EventRecorder, LifecycleEvent, LifecycleObserver};
use ssexi_runtime::{GlobalScope, Runtime, SessionState};
use ssexi_settings::SsexiSettings;

const TIMEOUT: Duration = Duration::from_secs(10);

const PAGE: &str = r#"<html><body>
  <div id="app" sx-connect="/website-logic">
    <span id="counter">0</span>
    <ul id="todos"></ul>
    <form id="add" sx-post="/todo"><input name="todo_text" value=""></form>
  </div>
</body></html>"#;

fn settings(server: &MockServer) -> SsexiSettings {
    let mut settings = SsexiSettings::default();
    settings.transport.base_url = Some(server.uri());
    settings.runtime.reconnect_delay_ms = 50;
    settings
}

fn boot(settings: SsexiSettings) -> (Runtime, Arc<EventRecorder>, GlobalScope) {
    let recorder = Arc::new(EventRecorder::new());
    let scope = GlobalScope::new();
    let mut runtime = Runtime::builder(Document::parse(PAGE))
        .settings(settings)
        .script_host(scope.clone())
        .observer(Arc::clone(&recorder) as Arc<dyn LifecycleObserver>)
        .build()
        .unwrap();
    runtime.start();
    (runtime, recorder, scope)
}

/// Step the runtime until `done` holds.
async fn step_until(runtime: &mut Runtime, mut done: impl FnMut(&Runtime) -> bool) {
    timeout(TIMEOUT, async {
        while !done(runtime) {
            assert!(runtime.step().await, "event channel closed");
        }
    })
    .await
    .expect("condition not reached in time");
}

async fn mount_stream(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/website-logic"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

// ── Push stream ──

#[tokio::test]
async fn stream_frames_patch_document() {
    let server = MockServer::start().await;
    mount_stream(
        &server,
        concat!(
            "data: {\"html\":{\"counter\":\"<span>3</span>\"}}\n\n",
            "data: {\"js\":{\"counterValue\":3},\"html\":{\"todos\":\"<ul><li>milk</li></ul>\"}}\n\n",
        ),
    )
    .await;

    let (mut runtime, recorder, scope) = boot(settings(&server));
    step_until(&mut runtime, |_| recorder.count(LifecycleEvent::Processed) == 2).await;

    let doc = runtime.document();
    let counter = doc.get_element_by_id("counter").unwrap();
    let todos = doc.get_element_by_id("todos").unwrap();
    assert_eq!(doc.text_content(counter), "3");
    assert_eq!(doc.inner_html(todos), "<li>milk</li>");
    assert_eq!(scope.global("counterValue"), Some(serde_json::json!(3)));
    assert_eq!(recorder.count(LifecycleEvent::Connected), 1);
}

#[tokio::test]
async fn ended_stream_reconnects() {
    let server = MockServer::start().await;
    mount_stream(&server, "data: {\"js\":{\"n\":1}}\n\n").await;

    let (mut runtime, recorder, _scope) = boot(settings(&server));
    step_until(&mut runtime, |_| recorder.count(LifecycleEvent::Connected) == 2).await;

    assert!(recorder.count(LifecycleEvent::Error) >= 1);
    assert_eq!(recorder.count(LifecycleEvent::Reconnect), 1);
    let requests = server.received_requests().await.unwrap();
    assert!(requests.len() >= 2);
}

#[tokio::test]
async fn refused_stream_reports_error_and_schedules_reconnect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/website-logic"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut settings = settings(&server);
    settings.runtime.reconnect_delay_ms = 60_000;
    let (mut runtime, recorder, _scope) = boot(settings);
    step_until(&mut runtime, |_| recorder.count(LifecycleEvent::Error) == 1).await;

    let error = recorder.last(LifecycleEvent::Error).unwrap();
    assert_eq!(error.detail["kind"], "connection");
    assert_eq!(error.detail["endpoint"], "/website-logic");
    assert_eq!(
        runtime.session_state("/website-logic"),
        Some(SessionState::ReconnectScheduled)
    );
    assert_eq!(recorder.count(LifecycleEvent::Connected), 0);
}

#[tokio::test]
async fn malformed_frame_does_not_close_stream() {
    let server = MockServer::start().await;
    mount_stream(
        &server,
        concat!(
            "data: not json\n\n",
            "data: {\"html\":{\"counter\":\"<span>1</span>\"}}\n\n",
        ),
    )
    .await;

    let mut settings = settings(&server);
    settings.runtime.reconnect_delay_ms = 60_000;
    let (mut runtime, recorder, _scope) = boot(settings);
    step_until(&mut runtime, |_| recorder.count(LifecycleEvent::Processed) == 1).await;

    assert_eq!(recorder.count(LifecycleEvent::ParseError), 1);
    let counter = runtime.document().get_element_by_id("counter").unwrap();
    assert_eq!(runtime.document().text_content(counter), "1");
}

// ── Forms ──

#[tokio::test]
async fn form_post_round_trip() {
    let server = MockServer::start().await;
    mount_stream(&server, "").await;
    Mock::given(method("POST"))
        .and(path("/todo"))
        .and(body_string_contains("buy milk"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"status\":\"ok\"}"))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = settings(&server);
    settings.runtime.reconnect_delay_ms = 60_000;
    let (mut runtime, recorder, _scope) = boot(settings);

    let form = runtime.document().get_element_by_id("add").unwrap();
    let input = runtime.document().descendants(form)[0];
    runtime.document_mut().set_field_value(input, "buy milk").unwrap();
    assert_eq!(runtime.submit(form).unwrap(), Some(1));

    step_until(&mut runtime, |_| recorder.count(LifecycleEvent::FormSuccess) == 1).await;

    let success = recorder.last(LifecycleEvent::FormSuccess).unwrap();
    assert_eq!(success.detail["body"], "{\"status\":\"ok\"}");
    assert_eq!(runtime.document().field_value(input).unwrap(), "");
}

#[tokio::test]
async fn form_post_rejected() {
    let server = MockServer::start().await;
    mount_stream(&server, "").await;
    Mock::given(method("POST"))
        .and(path("/todo"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut settings = settings(&server);
    settings.runtime.reconnect_delay_ms = 60_000;
    let (mut runtime, recorder, _scope) = boot(settings);

    let form = runtime.document().get_element_by_id("add").unwrap();
    let input = runtime.document().descendants(form)[0];
    runtime.document_mut().set_field_value(input, "keep me").unwrap();
    let _ = runtime.submit(form).unwrap();

    step_until(&mut runtime, |_| recorder.count(LifecycleEvent::FormError) == 1).await;

    assert_eq!(recorder.last(LifecycleEvent::FormError).unwrap().detail["status"], 500);
    assert_eq!(runtime.document().field_value(input).unwrap(), "keep me");
}
