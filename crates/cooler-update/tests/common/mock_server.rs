//! Mock server helpers for release and artifact endpoints

use serde_json::Value;
use std::net::TcpListener;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path of the latest-release endpoint for a component
pub fn release_path(id: &str) -> String {
    format!("/repos/test/{}/releases/latest", id)
}

/// Path of a downloadable file
pub fn artifact_path(name: &str) -> String {
    format!("/download/{}", name)
}

/// Full URL of a downloadable file on `server`
pub fn artifact_url(server: &MockServer, name: &str) -> String {
    format!("{}{}", server.uri(), artifact_path(name))
}

/// Serve `release` as the latest release of `id`
pub async fn mock_latest_release(server: &MockServer, id: &str, release: &Value) {
    Mock::given(method("GET"))
        .and(path(release_path(id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(release))
        .mount(server)
        .await;
}

/// Make the latest-release endpoint of `id` answer with `status`
pub async fn mock_release_status(server: &MockServer, id: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(release_path(id)))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Serve `content` at `/download/{name}`, expecting exactly `expected` requests
pub async fn mock_artifact(server: &MockServer, name: &str, content: &[u8], expected: u64) {
    Mock::given(method("GET"))
        .and(path(artifact_path(name)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .expect(expected)
        .mount(server)
        .await;
}

/// Serve `content` at `/download/{name}` only after `delay`
pub async fn mock_slow_artifact(server: &MockServer, name: &str, content: &[u8], delay: Duration) {
    Mock::given(method("GET"))
        .and(path(artifact_path(name)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(content.to_vec())
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Release endpoint on a local port nothing listens on
pub fn unreachable_endpoint(id: &str) -> Url {
    let port = TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .expect("reserve local port")
        .port();
    Url::parse(&format!("http://127.0.0.1:{}{}", port, release_path(id)))
        .expect("valid endpoint")
}

/// Serve a download that fails `fail_count` times with 500 before succeeding
pub async fn mock_flaky_artifact(server: &MockServer, name: &str, fail_count: u64, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(artifact_path(name)))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(fail_count)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(artifact_path(name)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(server)
        .await;
}

/// Make a download answer with `status`, expecting exactly `expected` requests
pub async fn mock_artifact_status(server: &MockServer, name: &str, status: u16, expected: u64) {
    Mock::given(method("GET"))
        .and(path(artifact_path(name)))
        .respond_with(ResponseTemplate::new(status))
        .expect(expected)
        .mount(server)
        .await;
}

/// Serve a `sha256sum`-style sidecar for `name`
pub async fn mock_checksum(server: &MockServer, name: &str, digest: &str) {
    Mock::given(method("GET"))
        .and(path(artifact_path(&format!("{}.sha256", name))))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("{}  {}\n", digest, name)))
        .mount(server)
        .await;
}
