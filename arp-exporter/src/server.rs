//! HTTP surface: gratuitous ARP on request, and the metrics scrape endpoint.

use arp_exporter_runtime::session::MonitorSession;
use axum::extract::{Query, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::Router;
use std::collections::HashMap;
use std::future::IntoFuture;
use std::io;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub fn router(session: Arc<MonitorSession>) -> Router {
    Router::new()
        .route("/v1/garp", any(send_garp))
        .route("/metrics", get(metrics))
        .with_state(session)
}

/// Serves `router` on `listener` until `cancel` fires. In-flight requests then get `grace` to
/// finish before their connections are dropped.
pub async fn serve(
    listener: TcpListener,
    session: Arc<MonitorSession>,
    cancel: CancellationToken,
    grace: Duration,
) -> io::Result<()> {
    info!(addr = %listener.local_addr()?, "HTTP server listening");

    let shutdown = cancel.clone();
    let server = axum::serve(listener, router(session))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .into_future();
    let mut server = std::pin::pin!(server);

    tokio::select! {
        result = &mut server => return result,
        _ = cancel.cancelled() => {}
    }

    info!("HTTP server shutting down");
    match tokio::time::timeout(grace, server).await {
        Ok(result) => result,
        Err(_) => {
            warn!(?grace, "HTTP server did not drain in time, dropping connections");
            Ok(())
        }
    }
}

// Error bodies end with a newline, like every other plain-text body served here.
fn plain_error(status: StatusCode, message: String) -> Response {
    (status, format!("{}\n", message)).into_response()
}

async fn send_garp(
    method: Method,
    State(session): State<Arc<MonitorSession>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    // `get()` would also route HEAD here, and HEAD must not inject.
    if method != Method::GET {
        return method_not_allowed();
    }

    let target = params.get("target").map(String::as_str).unwrap_or("");
    let new = params.get("new").map(String::as_str).unwrap_or("");

    if target.is_empty() || new.is_empty() {
        return plain_error(
            StatusCode::BAD_REQUEST,
            format!(
                "Missing 'target' or 'new' query parameters: '{}' - '{}'",
                target, new
            ),
        );
    }

    let (target_ip, new_ip) = match (target.parse::<IpAddr>(), new.parse::<IpAddr>()) {
        (Ok(target_ip), Ok(new_ip)) => (target_ip, new_ip),
        _ => {
            return plain_error(
                StatusCode::BAD_REQUEST,
                "Invalid IP Address format".to_string(),
            )
        }
    };

    info!(target = %target_ip, new = %new_ip, "received gARP request");
    match session.announce(new_ip) {
        Ok(()) => (
            StatusCode::OK,
            format!("Successfully sent gARP for {}\n", new),
        )
            .into_response(),
        Err(err) => {
            let message = format!("Error sending gARP for {}: {}", new, err);
            error!(new = %new_ip, error = %err, "error sending gARP");
            plain_error(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    }
}

fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET")],
        "Only GET requests are allowed\n",
    )
        .into_response()
}

async fn metrics(State(session): State<Arc<MonitorSession>>) -> Response {
    let metrics = session.metrics();
    match metrics.encode() {
        Ok(body) => ([(header::CONTENT_TYPE, metrics.content_type())], body).into_response(),
        Err(err) => {
            error!(error = %err, "error encoding metrics");
            plain_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arp_exporter_packets::{ArpOp, MacAddr};
    use arp_exporter_runtime::io::Frame;
    use arp_exporter_runtime::processor::Processor;
    use arp_exporter_runtime::session::MonitorConfig;
    use arp_exporter_runtime::utils::test::frame_collectors::{FailingInjector, RecordingInjector};
    use arp_exporter_runtime::utils::test::frame_generators::arp_frame_bytes;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use std::net::Ipv4Addr;
    use tower::ServiceExt;

    const HW: MacAddr = MacAddr {
        bytes: [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff],
    };

    fn session() -> Arc<MonitorSession> {
        Arc::new(MonitorSession::new("node-a".to_string(), MonitorConfig::default()).unwrap())
    }

    async fn request(
        session: Arc<MonitorSession>,
        method: Method,
        uri: &str,
    ) -> (StatusCode, String, Option<String>) {
        let response = router(session)
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|value| value.to_str().unwrap().to_string());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap(), content_type)
    }

    #[tokio::test]
    async fn missing_parameters_are_a_bad_request() {
        let (status, body, _) = request(session(), Method::GET, "/v1/garp?target=10.0.0.1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            "Missing 'target' or 'new' query parameters: '10.0.0.1' - ''\n"
        );

        let (status, _, _) = request(session(), Method::GET, "/v1/garp").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unparseable_addresses_are_a_bad_request() {
        let (status, body, _) = request(
            session(),
            Method::GET,
            "/v1/garp?target=10.0.0.1&new=not-an-ip",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Invalid IP Address format\n");
    }

    #[tokio::test]
    async fn only_get_is_allowed() {
        let (status, body, _) = request(
            session(),
            Method::POST,
            "/v1/garp?target=10.0.0.1&new=10.0.0.2",
        )
        .await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, "Only GET requests are allowed\n");
    }

    #[tokio::test]
    async fn head_is_rejected_without_sending() {
        let session = session();
        let (injector, frames) = RecordingInjector::new();
        session.attach_injector(Arc::new(injector), HW);

        let response = router(Arc::clone(&session))
            .oneshot(
                Request::builder()
                    .method(Method::HEAD)
                    .uri("/v1/garp?target=10.0.0.1&new=10.0.0.2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "GET");
        assert_eq!(frames.try_iter().count(), 0);
    }

    #[tokio::test]
    async fn announces_the_new_address() {
        let session = session();
        let (injector, frames) = RecordingInjector::new();
        session.attach_injector(Arc::new(injector), HW);

        let (status, body, _) = request(
            Arc::clone(&session),
            Method::GET,
            "/v1/garp?target=192.168.1.10&new=192.168.1.50",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Successfully sent gARP for 192.168.1.50\n");

        let written: Vec<Vec<u8>> = frames.try_iter().collect();
        assert_eq!(written.len(), 1);
        // Sender protocol address
        assert_eq!(&written[0][28..32], &[192u8, 168, 1, 50]);
    }

    #[tokio::test]
    async fn announce_errors_are_server_errors() {
        let (status, body, _) = request(
            session(),
            Method::GET,
            "/v1/garp?target=10.0.0.1&new=10.0.0.2",
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            "Error sending gARP for 10.0.0.2: no capture handle is open for injection\n"
        );

        let session = session();
        session.attach_injector(Arc::new(FailingInjector), HW);
        let (status, body, _) = request(
            Arc::clone(&session),
            Method::GET,
            "/v1/garp?target=10.0.0.1&new=2001:db8::1",
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.starts_with("Error sending gARP for 2001:db8::1: only IPv4"));
    }

    #[tokio::test]
    async fn metrics_expose_observed_packets() {
        let session = session();
        let mut processor = session.processor();
        processor.process(Frame::new(arp_frame_bytes(
            MacAddr::new([0x02, 0, 0, 0, 0, 1]),
            MacAddr::BROADCAST,
            ArpOp::Request,
            Ipv4Addr::new(10, 0, 0, 1),
            MacAddr::ZERO,
            Ipv4Addr::new(10, 0, 0, 2),
        )));

        let (status, body, content_type) =
            request(Arc::clone(&session), Method::GET, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/plain; version=0.0.4"));
        assert!(body.contains("arp_packets_total{"));
        assert!(body.contains("sender_ip=\"10.0.0.1\""));
        assert!(body.contains("node=\"node-a\""));
    }

    #[tokio::test]
    async fn serve_stops_on_cancellation() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let cancel = CancellationToken::new();
        let server = tokio::spawn(serve(
            listener,
            session(),
            cancel.clone(),
            Duration::from_secs(5),
        ));

        cancel.cancel();
        server.await.unwrap().unwrap();
    }
}
