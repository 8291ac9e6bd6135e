//! wiremock helpers standing in for the download backend

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mount a successful submission returning `id`
pub async fn mount_submit(server: &MockServer, id: &str) {
    Mock::given(method("POST"))
        .and(path("/api/download"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "download_id": id })))
        .mount(server)
        .await;
}

/// Mount a progress stream for `id` that sends `body` and then closes
pub async fn mount_progress(server: &MockServer, id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/api/progress/{id}")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("cache-control", "no-cache")
                .set_body_raw(body.into_bytes(), "text/event-stream"),
        )
        .mount(server)
        .await;
}

/// Mount the log endpoint for `id`
pub async fn mount_logs(server: &MockServer, id: &str, lines: &[&str]) {
    Mock::given(method("GET"))
        .and(path(format!("/api/logs/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "logs": lines })))
        .mount(server)
        .await;
}

/// Requests the server saw for `route`
pub async fn requests_to(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == route)
        .count()
}

/// Body of the first submission request
pub async fn submitted_body(server: &MockServer) -> Option<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .find(|r| r.url.path() == "/api/download")
        .and_then(|r| serde_json::from_slice(&r.body).ok())
}
