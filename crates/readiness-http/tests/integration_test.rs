//! Integration tests for the HTTP readiness prober

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use ringkeeper_readiness::{Endpoint, ReadinessProber};
use ringkeeper_readiness_http::{Error, HttpProberOptions, HttpReadinessProber, Scheme};

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    addr
}

/// The member's advertised address sits one port below its readiness listener.
fn member_of(addr: SocketAddr) -> Endpoint {
    Endpoint::parse(&format!("127.0.0.1:{}", addr.port() - 1)).unwrap()
}

fn prober(timeout: Duration) -> HttpReadinessProber {
    HttpReadinessProber::new(HttpProberOptions {
        scheme: Scheme::Http,
        port_offset: 1,
        timeout,
    })
    .unwrap()
}

#[tokio::test]
async fn test_ready_member() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let addr = serve(Router::new().route("/-/ready", get(|| async { "OK" }))).await;

    let result = prober(Duration::from_secs(2)).probe(&member_of(addr)).await;

    assert!(result.is_ok(), "unexpected error: {result:?}");
}

#[tokio::test]
async fn test_non_200_is_not_ready() {
    let addr = serve(Router::new().route(
        "/-/ready",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "OK") }),
    ))
    .await;

    let result = prober(Duration::from_secs(2)).probe(&member_of(addr)).await;

    assert!(matches!(
        result,
        Err(Error::NotReady { status, .. }) if status == StatusCode::SERVICE_UNAVAILABLE
    ));
}

#[tokio::test]
async fn test_wrong_body_is_not_ready() {
    let addr = serve(Router::new().route("/-/ready", get(|| async { "OK\n" }))).await;

    let result = prober(Duration::from_secs(2)).probe(&member_of(addr)).await;

    assert!(matches!(
        result,
        Err(Error::NotReady { status, ref body, .. }) if status == StatusCode::OK && body == "OK\n"
    ));
}

#[tokio::test]
async fn test_missing_route_is_not_ready() {
    let addr = serve(Router::new().route("/healthy", get(|| async { "OK" }))).await;

    let result = prober(Duration::from_secs(2)).probe(&member_of(addr)).await;

    assert!(matches!(
        result,
        Err(Error::NotReady { status, .. }) if status == StatusCode::NOT_FOUND
    ));
}

#[tokio::test]
async fn test_slow_member_times_out() {
    let addr = serve(Router::new().route(
        "/-/ready",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "OK"
        }),
    ))
    .await;

    let started = std::time::Instant::now();
    let result = prober(Duration::from_millis(200))
        .probe(&member_of(addr))
        .await;

    assert!(matches!(result, Err(Error::Request { .. })));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_unreachable_member() {
    // Bind then drop so the port is very likely closed.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = prober(Duration::from_secs(2)).probe(&member_of(addr)).await;

    assert!(matches!(result, Err(Error::Request { .. })));
}
