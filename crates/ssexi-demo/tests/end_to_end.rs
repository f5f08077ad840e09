//! Runtime against a live demo server.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use ssexi_core::Document;
use ssexi_demo::{DemoConfig, DemoServer};
use ssexi_events::{EventRecorder, LifecycleEvent, LifecycleObserver};
use ssexi_runtime::{GlobalScope, Runtime, SessionState};
use ssexi_settings::SsexiSettings;

const TIMEOUT: Duration = Duration::from_secs(10);

/// Serve the demo on an ephemeral port. Returns its base URL.
async fn boot_server(tick_ms: u64) -> String {
    let server = DemoServer::new(DemoConfig {
        port: 0,
        tick_ms,
        ..DemoConfig::default()
    });
    let listener = tokio::net::TcpListener::bind(server.config().bind_addr())
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    let router = server.router();
    let _ = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn boot_runtime(base: &str) -> (Runtime, Arc<EventRecorder>, GlobalScope) {
    let page = reqwest::get(base).await.unwrap().text().await.unwrap();

    let mut settings = SsexiSettings::default();
    settings.transport.base_url = Some(base.to_string());
    settings.runtime.reconnect_delay_ms = 100;

    let recorder = Arc::new(EventRecorder::new());
    let scope = GlobalScope::new();
    let mut runtime = Runtime::builder(Document::parse(&page))
        .settings(settings)
        .script_host(scope.clone())
        .observer(Arc::clone(&recorder) as Arc<dyn LifecycleObserver>)
        .build()
        .unwrap();
    runtime.start();
    (runtime, recorder, scope)
}

async fn step_until(runtime: &mut Runtime, mut done: impl FnMut(&Runtime) -> bool) {
    timeout(TIMEOUT, async {
        while !done(runtime) {
            assert!(runtime.step().await, "event channel closed");
        }
    })
    .await
    .expect("condition not reached in time");
}

fn text_of(runtime: &Runtime, id: &str) -> String {
    let doc = runtime.document();
    doc.get_element_by_id(id)
        .map(|n| doc.text_content(n))
        .unwrap_or_default()
}

#[tokio::test]
async fn counter_ticks_and_variable_is_assigned() {
    let base = boot_server(10).await;
    let (mut runtime, recorder, scope) = boot_runtime(&base).await;

    step_until(&mut runtime, |_| recorder.count(LifecycleEvent::Error) >= 1).await;

    assert_eq!(
        runtime.session_state("/website-logic"),
        Some(SessionState::Open)
    );
    assert!(text_of(&runtime, "counter").starts_with("Count: "));
    assert!(text_of(&runtime, "timestamp").starts_with("Current Time: "));
    assert_eq!(scope.global("counterValue"), Some(serde_json::json!(5)));
    // exec is off by default: the log statement is reported, never run
    assert!(scope.executed().is_empty());
    assert_eq!(recorder.count(LifecycleEvent::JsExec), 0);
    assert_eq!(recorder.count(LifecycleEvent::ParseError), 0);
}

#[tokio::test]
async fn submitted_todo_appears_in_list() {
    let base = boot_server(20).await;
    let (mut runtime, recorder, _scope) = boot_runtime(&base).await;

    let form = runtime.document().get_element_by_id("todo-form").unwrap();
    assert!(
        runtime
            .bindings()
            .is_bound(form, ssexi_runtime::BindingKind::PostSubmit)
    );
    let input = runtime
        .document()
        .descendants(form)
        .into_iter()
        .find(|&n| runtime.document().attr(n, "name") == Some("todo_text"))
        .unwrap();
    runtime
        .document_mut()
        .set_field_value(input, "water plants")
        .unwrap();
    assert_eq!(runtime.submit(form).unwrap(), Some(1));

    step_until(&mut runtime, |rt| {
        recorder.count(LifecycleEvent::FormSuccess) == 1
            && text_of(rt, "todos").contains("water plants")
    })
    .await;

    let success = recorder.last(LifecycleEvent::FormSuccess).unwrap();
    assert_eq!(success.detail["status"], 200);
    assert_eq!(runtime.document().field_value(input).unwrap(), "");
    let todos = runtime.document().get_element_by_id("todos").unwrap();
    assert_eq!(runtime.document().inner_html(todos), "<li>water plants</li>");
}
