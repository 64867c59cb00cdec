//! Webhook delivery tests against a local single-shot HTTP server.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use keywatch::notifier::{Notifier, NotifyError, WebhookNotifier};

/// Whether `request` holds complete headers plus the advertised body.
fn request_is_complete(request: &[u8]) -> bool {
    let text = String::from_utf8_lossy(request);
    let Some((headers, body)) = text.split_once("\r\n\r\n") else {
        return false;
    };
    let Some(content_length) = headers.lines().find_map(|line| {
        let lowered = line.to_ascii_lowercase();
        lowered
            .strip_prefix("content-length:")
            .and_then(|value| value.trim().parse::<usize>().ok())
    }) else {
        return true;
    };
    body.len() >= content_length
}

/// Serve one request with the given response, capturing the raw request text.
async fn serve_once(status_line: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener_result = TcpListener::bind("127.0.0.1:0").await;
    assert!(listener_result.is_ok());
    let listener = match listener_result {
        Ok(listener) => listener,
        Err(err) => panic!("listener should bind: {err}"),
    };

    let addr_result = listener.local_addr();
    assert!(addr_result.is_ok());
    let addr = match addr_result {
        Ok(addr) => addr,
        Err(err) => panic!("listener should expose local addr: {err}"),
    };

    let status_line_owned = status_line.to_owned();
    let body_owned = body.to_owned();
    let handle = tokio::spawn(async move {
        let accepted = listener.accept().await;
        let (mut socket, _) = match accepted {
            Ok(pair) => pair,
            Err(err) => panic!("listener should accept: {err}"),
        };

        let mut request = Vec::new();
        let mut read_buf = [0_u8; 1024];
        loop {
            let read = match socket.read(&mut read_buf).await {
                Ok(read) => read,
                Err(err) => panic!("server should read request: {err}"),
            };
            if read == 0 {
                break;
            }
            request.extend_from_slice(&read_buf[..read]);
            if request_is_complete(&request) {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 {status_line_owned}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body_owned}",
            body_owned.len()
        );
        let _ = socket.write_all(response.as_bytes()).await;

        String::from_utf8_lossy(&request).into_owned()
    });

    (format!("http://{addr}/"), handle)
}

#[tokio::test]
async fn webhook_posts_json_content_payload() {
    let (url, server) = serve_once("204 No Content", "").await;

    let notifier = WebhookNotifier::new(url);
    notifier
        .notify("a wild creeper appears")
        .await
        .expect("delivery should succeed");

    let request = server.await.expect("server task should complete");
    assert!(request.starts_with("POST / HTTP/1.1\r\n"));
    assert!(request
        .to_ascii_lowercase()
        .contains("content-type: application/json"));

    let (_, body) = request
        .split_once("\r\n\r\n")
        .expect("request should carry a body");
    let value: serde_json::Value = serde_json::from_str(body).expect("body should be JSON");
    assert_eq!(value, serde_json::json!({ "content": "a wild creeper appears" }));
}

#[tokio::test]
async fn http_error_status_is_reported_with_its_body() {
    let (url, server) = serve_once("400 Bad Request", "{\"message\": \"invalid token\"}").await;

    let notifier = WebhookNotifier::new(url);
    let err = notifier
        .notify("boom")
        .await
        .expect_err("non-success status should error");

    match err {
        NotifyError::HttpStatus { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("invalid token"));
        }
        other => panic!("expected http status error, got: {other}"),
    }

    server.await.expect("server task should complete");
}

#[tokio::test]
async fn error_bodies_are_whitespace_collapsed() {
    let (url, server) = serve_once("500 Internal Server Error", "rate\n   limited\t badly").await;

    let notifier = WebhookNotifier::new(url);
    let err = notifier
        .notify("boom")
        .await
        .expect_err("non-success status should error");

    match err {
        NotifyError::HttpStatus { body, .. } => {
            assert_eq!(body, "rate limited badly");
        }
        other => panic!("expected http status error, got: {other}"),
    }

    server.await.expect("server task should complete");
}

#[tokio::test]
async fn long_error_bodies_are_truncated() {
    let long_body = "y".repeat(400);
    let (url, server) = serve_once("429 Too Many Requests", &long_body).await;

    let notifier = WebhookNotifier::new(url);
    let err = notifier
        .notify("boom")
        .await
        .expect_err("non-success status should error");

    match err {
        NotifyError::HttpStatus { status, body } => {
            assert_eq!(status, 429);
            assert!(body.ends_with("...[truncated]"));
            assert!(body.chars().count() < 400);
        }
        other => panic!("expected http status error, got: {other}"),
    }

    server.await.expect("server task should complete");
}

#[tokio::test]
async fn transport_failures_surface_as_request_errors() {
    // Bind, learn the port, close it again: connecting must now fail.
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener
        .local_addr()
        .expect("listener should expose local addr");
    drop(listener);

    let notifier = WebhookNotifier::new(format!("http://{addr}/"));
    let err = notifier
        .notify("boom")
        .await
        .expect_err("refused connection should error");
    assert!(matches!(err, NotifyError::Request(_)));
}
