use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

use avatar_catalog::{
    config::GatewayConfig,
    engine::gateway::{AvatarGateway, AvatarStatus, GatewayError},
    remote::http::HttpGateway,
    types::{BuildVariant, PerformanceRating, Platform},
};

fn gateway_for(server: &MockServer) -> HttpGateway {
    let cfg = GatewayConfig {
        base_url: format!("{}/api/1/", server.uri()),
        auth_cookie: Some("auth=abc123".to_string()),
        request_timeout_ms: 2_000,
        ..GatewayConfig::default()
    };
    HttpGateway::new(&cfg).expect("client")
}

fn avatar_body() -> serde_json::Value {
    json!({
        "id": "avtr_0a",
        "name": "Fox",
        "authorName": "Ann",
        "thumbnailImageUrl": "https://img.example/fox.png",
        "created_at": "2023-05-01T10:00:00.000Z",
        "releaseStatus": "public",
        "unityPackages": [
            {
                "platform": "android",
                "variant": "security",
                "performanceRating": "Medium",
                "created_at": "2023-05-02T10:00:00.000Z"
            },
            { "platform": "standalonewindows", "variant": "standard" },
            { "platform": "ios", "performanceRating": "Shiny" }
        ]
    })
}

#[tokio::test]
async fn resolve_parses_record_and_sends_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1/avatars/avtr_0a"))
        .and(header("cookie", "auth=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(avatar_body()))
        .expect(1)
        .mount(&server)
        .await;

    let rec = gateway_for(&server).resolve("avtr_0a").await.expect("resolve");

    assert_eq!(rec.name, "Fox");
    assert_eq!(rec.author_name, "Ann");
    assert!(rec.created_at.is_some());
    assert_eq!(rec.variants.len(), 3);
    assert_eq!(rec.variants[1].variant, BuildVariant::Other);
    assert_eq!(rec.variants[2].platform, Platform::Other);
    assert_eq!(rec.variants[2].performance_rating, PerformanceRating::Unknown);
    assert!(rec.supports(Platform::Mobile));
    assert_eq!(rec.security_rating(Platform::Mobile), PerformanceRating::Medium);
}

#[tokio::test]
async fn status_maps_not_found_to_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1/avatars/avtr_gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/1/avatars/avtr_0a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(avatar_body()))
        .mount(&server)
        .await;

    let gw = gateway_for(&server);
    assert_eq!(gw.status("avtr_gone").await.expect("status"), AvatarStatus::Unavailable);
    assert!(matches!(
        gw.status("avtr_0a").await.expect("status"),
        AvatarStatus::Available(rec) if rec.name == "Fox"
    ));
}

#[tokio::test]
async fn server_errors_are_never_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1/avatars/avtr_0b"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/1/avatars/avtr_0c"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let gw = gateway_for(&server);
    assert!(matches!(
        gw.status("avtr_0b").await,
        Err(GatewayError::Http { status: 503, .. })
    ));
    assert!(matches!(
        gw.resolve("avtr_0b").await,
        Err(GatewayError::Http { status: 503, .. })
    ));
    assert!(matches!(gw.resolve("avtr_0c").await, Err(GatewayError::Decode(_))));
}

#[tokio::test]
async fn select_uses_put_and_reports_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/1/avatars/avtr_0a/select"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/1/avatars/avtr_0d/select"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let gw = gateway_for(&server);
    gw.select("avtr_0a").await.expect("select");
    let err = gw.select("avtr_0d").await.expect_err("unauthorized");
    assert_eq!(
        err,
        GatewayError::Http {
            status: 401,
            reason: Some("Unauthorized".to_string()),
        }
    );
    assert!(err.to_string().contains("401 Unauthorized"));
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    let cfg = GatewayConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        request_timeout_ms: 2_000,
        ..GatewayConfig::default()
    };
    let gw = HttpGateway::new(&cfg).expect("client");
    assert!(matches!(
        gw.resolve("avtr_0a").await,
        Err(GatewayError::Network(_) | GatewayError::Timeout)
    ));
}
