use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use kubeagent::tools::core::{ToolContext, ToolSet};
use kubeagent_ocp::MetricsToolsExt;
use kubeagent_ocp::tools::{GET_EXISTING_METRICS, MetricsClient, NO_METRICS};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn similar(
    State(seen): State<Seen>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let query = params.get("query").cloned().unwrap_or_default();
    seen.lock().unwrap().push(params);
    match query.as_str() {
        "nothing" => Json(json!([])),
        "no series" => Json(json!([{ "score": 0.1 }])),
        _ => Json(json!([
            {
                "series": [
                    "container_memory_working_set_bytes",
                    { "__name__": "kube_pod_container_resource_limits", "resource": "memory" }
                ]
            }
        ])),
    }
}

async fn broken() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn serve() -> (SocketAddr, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/metrics", get(similar))
        .route("/broken", get(broken))
        .with_state(seen.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, seen)
}

fn client(url: String) -> MetricsClient {
    MetricsClient::new(url, 5, Duration::from_secs(2)).unwrap()
}

async fn get_existing_metrics(client: MetricsClient, prompt: &str) -> String {
    let tools = ToolSet::new().with_metrics_tools(client);
    let ctx = ToolContext::new("metrics", prompt);
    tools
        .execute(
            &ctx,
            GET_EXISTING_METRICS,
            &json!({ "prompt": prompt }).to_string(),
            None,
        )
        .await
}

#[tokio::test]
async fn series_are_rendered_one_per_line() {
    let (addr, seen) = serve().await;
    let out = get_existing_metrics(client(format!("http://{addr}/metrics")), "pod memory usage").await;

    assert_eq!(
        out,
        "container_memory_working_set_bytes\n\
         {\"__name__\":\"kube_pod_container_resource_limits\",\"resource\":\"memory\"}"
    );

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["query"], "pod memory usage");
    assert_eq!(seen[0]["top_k"], "5");
}

#[tokio::test]
async fn empty_array_is_an_absent_result() {
    let (addr, _) = serve().await;
    let out = get_existing_metrics(client(format!("http://{addr}/metrics")), "nothing").await;
    assert_eq!(out, NO_METRICS);
}

#[tokio::test]
async fn missing_series_is_an_absent_result() {
    let (addr, _) = serve().await;
    let out = get_existing_metrics(client(format!("http://{addr}/metrics")), "no series").await;
    assert_eq!(out, NO_METRICS);
}

#[tokio::test]
async fn http_error_is_an_absent_result() {
    let (addr, _) = serve().await;
    let out = get_existing_metrics(client(format!("http://{addr}/broken")), "cpu").await;
    assert_eq!(out, NO_METRICS);
}

#[tokio::test]
async fn unreachable_service_is_an_absent_result() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let out = get_existing_metrics(client(format!("http://{addr}/metrics")), "cpu").await;
    assert_eq!(out, NO_METRICS);
}

#[tokio::test]
async fn client_reports_typed_upstream_errors() {
    let (addr, _) = serve().await;
    let err = client(format!("http://{addr}/metrics"))
        .candidates("nothing")
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("metrics similarity service request failed"));
}
