//! Two services talking over real HTTP.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use matcher::{FederationConfig, RetryConfig};
use serde_json::{json, Value};
use server::{build_router, ResolverSettings, ServerConfig, ServerState};
use tower::ServiceExt;

const THREE: &str = "s-heppner.com/semanticID/three";
const TROIS: &str = "remote-service.com/semanticID/trois";
const TRES: &str = "remote-service.com/semanticID/tres";

async fn call(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn remote_service() -> SocketAddr {
    let app = build_router(Arc::new(ServerState::new(ServerConfig::default()).unwrap()));
    let (status, _) = call(
        &app,
        "/post_matches",
        json!({ "matches": [{
            "base_semantic_id": TROIS,
            "match_semantic_id": TRES,
            "score": 1.0,
            "meta_information": { "matchSource": "Defined by Moritz Sommer" }
        }]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    serve(app).await
}

async fn local_service(remote: String) -> Router {
    let config = ServerConfig {
        public_endpoint: Some("http://local-service:8000".into()),
        resolver: ResolverSettings {
            namespaces: HashMap::from([("remote-service.com".to_string(), remote)]),
            ..ResolverSettings::default()
        },
        federation: FederationConfig::default()
            .with_peer_timeout(Duration::from_millis(500))
            .with_deadline(Duration::from_secs(2))
            .with_retry(RetryConfig::default().with_max_retries(0)),
        ..ServerConfig::default()
    };
    let app = build_router(Arc::new(ServerState::new(config).unwrap()));
    let (status, _) = call(
        &app,
        "/post_matches",
        json!({ "matches": [{
            "base_semantic_id": THREE,
            "match_semantic_id": TROIS,
            "score": 1.0,
            "meta_information": { "matchSource": "Defined by Sebastian Heppner" }
        }]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    app
}

#[tokio::test]
async fn federated_query_reaches_remote_service() {
    let remote = remote_service().await;
    let local = local_service(format!("http://{remote}")).await;

    let (status, body) = call(
        &local,
        "/get_matches",
        json!({ "semantic_id": THREE, "score_limit": 0.7, "local_only": false }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "matches": [
            {
                "base_semantic_id": THREE,
                "match_semantic_id": TROIS,
                "score": 1.0,
                "meta_information": { "matchSource": "Defined by Sebastian Heppner" }
            },
            {
                "base_semantic_id": THREE,
                "match_semantic_id": TRES,
                "score": 1.0,
                "meta_information": { "matchSource": "Defined by Moritz Sommer", "path": [TROIS] }
            }
        ]})
    );
}

#[tokio::test]
async fn local_only_query_stays_local() {
    let remote = remote_service().await;
    let local = local_service(format!("http://{remote}")).await;

    let (_, body) = call(
        &local,
        "/get_matches",
        json!({ "semantic_id": THREE, "score_limit": 0.7 }),
    )
    .await;
    assert_eq!(body["matches"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unreachable_peer_degrades_to_local_results() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = listener.local_addr().unwrap();
    drop(listener);
    let local = local_service(format!("http://{dead}")).await;

    let started = Instant::now();
    let (status, body) = call(
        &local,
        "/get_matches",
        json!({ "semantic_id": THREE, "score_limit": 0.7, "local_only": false }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(body["matches"].as_array().unwrap().len(), 1);
    assert_eq!(body["matches"][0]["match_semantic_id"], TROIS);

    let request = Request::builder().uri("/ready").body(Body::empty()).unwrap();
    let response = local.oneshot(request).await.unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let ready: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(ready["components"]["peers"]["known"], 1);
}
