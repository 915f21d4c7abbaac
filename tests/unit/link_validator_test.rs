//! Unit tests for the concurrent link validator, using local TCP listeners
//! instead of real network endpoints.

use linkvault::services::link_validator::{is_local_url, LinkValidator, ValidatorConfig, Verdict};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn validator_with_timeout(timeout_secs: u64) -> LinkValidator {
    LinkValidator::new(ValidatorConfig {
        timeout_secs,
        concurrency: 4,
        user_agent: "linkvault-test".to_string(),
    })
}

/// Serves every connection with the given status line, then closes.
async fn spawn_http_server(status_line: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().expect("local_addr failed");
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    status_line
                );
                let _ = socket.write_all(response.as_bytes()).await;
            });
        }
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn responding_url_is_active() {
    let url = spawn_http_server("HTTP/1.1 200 OK").await;
    let validator = validator_with_timeout(5);

    let verdicts = validator.validate(vec![url.clone()]).await;
    assert_eq!(verdicts.get(&url), Some(&Verdict::Active));
}

#[tokio::test]
async fn error_status_is_dead() {
    let url = spawn_http_server("HTTP/1.1 404 Not Found").await;
    let validator = validator_with_timeout(5);

    let verdicts = validator.validate(vec![url.clone()]).await;
    assert_eq!(verdicts.get(&url), Some(&Verdict::Dead));
}

#[tokio::test]
async fn connection_refused_is_dead() {
    // bind to learn a free port, then drop the listener so nothing answers
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().expect("local_addr failed");
    drop(listener);

    let url = format!("http://{}", addr);
    let validator = validator_with_timeout(5);

    let verdicts = validator.validate(vec![url.clone()]).await;
    assert_eq!(verdicts.get(&url), Some(&Verdict::Dead));
}

#[tokio::test]
async fn stalled_server_is_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().expect("local_addr failed");
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                // hold the connection open without ever answering
                tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            });
        }
    });

    let url = format!("http://{}", addr);
    let validator = validator_with_timeout(1);

    let verdicts = validator.validate(vec![url.clone()]).await;
    assert_eq!(verdicts.get(&url), Some(&Verdict::Timeout));
}

#[tokio::test]
async fn head_rejection_falls_back_to_get() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().expect("local_addr failed");
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let response = if request.starts_with("HEAD") {
                    "HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                } else {
                    "HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                };
                let _ = socket.write_all(response.as_bytes()).await;
            });
        }
    });

    let url = format!("http://{}", addr);
    let validator = validator_with_timeout(5);

    let verdicts = validator.validate(vec![url.clone()]).await;
    assert_eq!(verdicts.get(&url), Some(&Verdict::Active));
}

#[tokio::test]
async fn batch_resolves_every_url() {
    let live = spawn_http_server("HTTP/1.1 200 OK").await;
    let broken = spawn_http_server("HTTP/1.1 500 Internal Server Error").await;

    let validator = validator_with_timeout(5);
    let verdicts = validator
        .validate(vec![live.clone(), broken.clone(), live.clone()])
        .await;

    // repeated URLs are probed once but every unique URL gets a verdict
    assert_eq!(verdicts.len(), 2);
    assert_eq!(verdicts.get(&live), Some(&Verdict::Active));
    assert_eq!(verdicts.get(&broken), Some(&Verdict::Dead));
}

#[test]
fn config_loads_from_json_and_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let path = dir.path().join("validator.json");
    std::fs::write(&path, r#"{ "timeout_secs": 3, "concurrency": 2 }"#).expect("write failed");

    let config = ValidatorConfig::load(&path);
    assert_eq!(config.timeout_secs, 3);
    assert_eq!(config.concurrency, 2);
    // unspecified fields keep their defaults
    assert!(config.user_agent.starts_with("linkvault/"));

    let missing = ValidatorConfig::load(dir.path().join("nope.json"));
    assert_eq!(missing.timeout_secs, 10);

    std::fs::write(&path, "{ not json").expect("write failed");
    let malformed = ValidatorConfig::load(&path);
    assert_eq!(malformed.timeout_secs, 10);
}

#[test]
fn local_urls_are_recognized() {
    assert!(is_local_url("http://localhost:3000/dev"));
    assert!(is_local_url("http://127.0.0.1:8080"));
    assert!(is_local_url("https://app.localhost/admin"));
    assert!(!is_local_url("https://example.com"));
    assert!(!is_local_url("not a url"));
}
