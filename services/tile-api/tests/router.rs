//! End-to-end tests of the HTTP surface against the in-memory engine.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body, Bytes};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use storage::QueryParam;
use test_utils::{
    decode_ids, house_tile, london_tile, ocean_tile, quoted_label_footprints,
    scenario_footprints, MemoryEngine,
};
use tile_api::build_router;
use tile_api::config::ServiceConfig;
use tile_api::response::{ErrorBody, StatsBody, GENERIC_ENGINE_ERROR, TILE_CONTENT_TYPE};
use tile_api::state::AppState;
use tile_common::{EngineError, TileAddress};

struct TestResponse {
    status: StatusCode,
    content_type: Option<String>,
    body: Bytes,
}

impl TestResponse {
    fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("response body is not the expected JSON")
    }

    fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).unwrap()
    }
}

fn app(engine: Arc<MemoryEngine>) -> Router {
    app_with_config(engine, &ServiceConfig::default())
}

fn app_with_config(engine: Arc<MemoryEngine>, config: &ServiceConfig) -> Router {
    let state = AppState::with_engine(engine, config).unwrap();
    build_router(Arc::new(state))
}

async fn get(app: Router, uri: &str) -> TestResponse {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    TestResponse {
        status,
        content_type,
        body,
    }
}

fn tile_uri(address: &TileAddress, query: &str) -> String {
    format!("/tiles/{}.pbf{}", address, query)
}

#[tokio::test]
async fn test_scenario_stats_for_houses() {
    let engine = Arc::new(MemoryEngine::new(scenario_footprints()));
    let response = get(app(engine), "/stats?category=residential&subtype=house").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.content_type.as_deref(), Some("application/json"));
    assert_eq!(
        response.json::<StatsBody>(),
        StatsBody {
            count: 3,
            avg_height: Some(20.0)
        }
    );
}

#[tokio::test]
async fn test_unfiltered_stats_cover_whole_dataset() {
    let engine = Arc::new(MemoryEngine::new(scenario_footprints()));
    let response = get(app(engine), "/stats").await;

    assert_eq!(response.status, StatusCode::OK);
    let body: StatsBody = response.json();
    assert_eq!(body.count, 10);
    assert_eq!(body.avg_height, Some(27.7));
}

#[tokio::test]
async fn test_zero_match_stats_have_null_average() {
    let engine = Arc::new(MemoryEngine::new(scenario_footprints()));
    let response = get(app(engine), "/stats?category=castle").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), r#"{"count":0,"avg_height":null}"#);
}

#[tokio::test]
async fn test_empty_parameters_mean_no_filter() {
    let engine = Arc::new(MemoryEngine::new(scenario_footprints()));
    let response = get(app(engine.clone()), "/stats?category=&subtype=").await;

    assert_eq!(response.json::<StatsBody>().count, 10);
    let query = engine.last_query().unwrap();
    assert!(query.params().is_empty());
}

#[tokio::test]
async fn test_house_tile_is_not_empty() {
    let engine = Arc::new(MemoryEngine::new(scenario_footprints()));
    let uri = tile_uri(&house_tile(), "?category=residential&subtype=house");
    let response = get(app(engine.clone()), &uri).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.content_type.as_deref(), Some(TILE_CONTENT_TYPE));
    assert_eq!(decode_ids(&response.body), vec![1, 2, 3]);

    let query = engine.last_query().unwrap();
    let address = house_tile();
    assert_eq!(
        query.params(),
        &[
            QueryParam::Int(address.zoom as i64),
            QueryParam::Int(address.column as i64),
            QueryParam::Int(address.row as i64),
            QueryParam::Text("residential".to_string()),
            QueryParam::Text("house".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_disjoint_tile_is_empty_success() {
    let engine = Arc::new(MemoryEngine::new(scenario_footprints()));
    let uri = tile_uri(&london_tile(), "?category=residential&subtype=house");
    let response = get(app(engine), &uri).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.content_type.as_deref(), Some(TILE_CONTENT_TYPE));
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_unpopulated_tiles_are_empty_success() {
    let engine = Arc::new(MemoryEngine::new(scenario_footprints()));

    let response = get(app(engine.clone()), &tile_uri(&ocean_tile(), "")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.is_empty());

    let response = get(app(engine), "/tiles/0/0/0.pbf?category=castle").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_every_extension_and_bare_row_accepted() {
    let engine = Arc::new(MemoryEngine::new(scenario_footprints()));
    let address = house_tile();

    let mut bodies = Vec::new();
    for suffix in [".tile", ".pbf", ".mvt", ""] {
        let uri = format!("/tiles/{}{}?subtype=house", address, suffix);
        let response = get(app(engine.clone()), &uri).await;
        assert_eq!(response.status, StatusCode::OK, "{uri}");
        bodies.push(response.body);
    }
    assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn test_repeated_tile_requests_are_identical() {
    let engine = Arc::new(MemoryEngine::new(scenario_footprints()));
    let uri = tile_uri(&house_tile(), "?category=residential");

    let first = get(app(engine.clone()), &uri).await;
    let second = get(app(engine), &uri).await;
    assert!(!first.body.is_empty());
    assert_eq!(first.body, second.body);
}

#[tokio::test]
async fn test_out_of_grid_tile_skips_engine() {
    let engine = Arc::new(MemoryEngine::new(scenario_footprints()));

    for uri in [
        "/tiles/3/8/0.pbf",
        "/tiles/3/0/8.pbf",
        "/tiles/40/0/0.pbf",
        "/tiles/0/4294967295/4294967295.pbf",
    ] {
        let response = get(app(engine.clone()), uri).await;
        assert_eq!(response.status, StatusCode::OK, "{uri}");
        assert!(response.body.is_empty(), "{uri}");
    }
    assert_eq!(engine.executed_queries(), 0);
}

#[tokio::test]
async fn test_malformed_address_is_rejected_before_engine() {
    let engine = Arc::new(MemoryEngine::new(scenario_footprints()));

    for uri in [
        "/tiles/a/1/1.pbf",
        "/tiles/1/-1/1.pbf",
        "/tiles/1/1/1.png",
        "/tiles/1/1/x.pbf",
        "/tiles/1/1/4294967296.pbf",
    ] {
        let response = get(app(engine.clone()), uri).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(response
            .content_type
            .as_deref()
            .unwrap_or_default()
            .starts_with("text/plain"));
    }
    assert_eq!(engine.executed_queries(), 0);
}

#[tokio::test]
async fn test_quoted_category_matches_exactly() {
    let engine = Arc::new(MemoryEngine::new(quoted_label_footprints()));

    let response = get(app(engine.clone()), "/stats?category=o%27reilly").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json::<StatsBody>(),
        StatsBody {
            count: 1,
            avg_height: Some(9.0)
        }
    );

    let query = engine.last_query().unwrap();
    assert!(!query.sql().contains("o'reilly"));
    assert_eq!(query.params(), &[QueryParam::Text("o'reilly".to_string())]);

    let uri = tile_uri(&house_tile(), "?category=o%27reilly");
    let response = get(app(engine.clone()), &uri).await;
    assert_eq!(decode_ids(&response.body), vec![21]);

    let response = get(app(engine), "/stats?subtype=o%27reilly%22s").await;
    assert_eq!(response.json::<StatsBody>().count, 1);
}

#[tokio::test]
async fn test_injection_shaped_value_matches_nothing() {
    let engine = Arc::new(MemoryEngine::new(quoted_label_footprints()));
    let response = get(app(engine), "/stats?category=x%27%20OR%20%271%27%3D%271").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json::<StatsBody>().count, 0);
}

#[tokio::test]
async fn test_engine_failure_on_tile_is_plain_text_500() {
    let engine = Arc::new(MemoryEngine::failing(EngineError::Execution(
        "function st_asmvt does not exist".into(),
    )));
    let response = get(app(engine.clone()), &tile_uri(&house_tile(), "")).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response
        .content_type
        .as_deref()
        .unwrap_or_default()
        .starts_with("text/plain"));
    let text = response.text();
    assert!(text.starts_with("Error generating tile: "));
    assert!(text.contains("st_asmvt"));
    assert_eq!(engine.active_contexts(), 0);
}

#[tokio::test]
async fn test_engine_failure_on_stats_is_json_500() {
    let engine = Arc::new(MemoryEngine::failing(EngineError::Unavailable(
        "connection refused".into(),
    )));
    let response = get(app(engine.clone()), "/stats?category=residential").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = response.json();
    assert!(body.error.contains("connection refused"));
    assert_eq!(engine.active_contexts(), 0);
}

#[tokio::test]
async fn test_engine_diagnostics_can_be_hidden() {
    let mut config = ServiceConfig::default();
    config.errors.expose_engine_errors = false;
    let engine = Arc::new(MemoryEngine::failing(EngineError::Execution(
        "relation \"buildings\" does not exist".into(),
    )));

    let response = get(
        app_with_config(engine.clone(), &config),
        &tile_uri(&house_tile(), ""),
    )
    .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.text().contains("buildings"));

    let response = get(app_with_config(engine, &config), "/stats").await;
    assert_eq!(
        response.json::<ErrorBody>(),
        ErrorBody {
            error: GENERIC_ENGINE_ERROR.to_string()
        }
    );
}

#[tokio::test]
async fn test_concurrent_requests_use_separate_contexts() {
    let engine = Arc::new(
        MemoryEngine::new(scenario_footprints()).with_delay(Duration::from_millis(50)),
    );
    let router = app(engine.clone());

    let mut handles = Vec::new();
    for i in 0..8 {
        let router = router.clone();
        let uri = if i % 2 == 0 {
            "/stats?category=residential".to_string()
        } else {
            tile_uri(&house_tile(), "?subtype=house")
        };
        handles.push(tokio::spawn(async move { get(router, &uri).await.status }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    assert_eq!(engine.executed_queries(), 8);
    assert!(engine.peak_contexts() > 1);
    assert_eq!(engine.active_contexts(), 0);
}

#[tokio::test]
async fn test_health_and_readiness() {
    let engine = Arc::new(MemoryEngine::new(scenario_footprints()));
    let response = get(app(engine.clone()), "/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), r#"{"status":"ok"}"#);

    let response = get(app(engine), "/ready").await;
    assert_eq!(response.status, StatusCode::OK);

    let down = Arc::new(MemoryEngine::failing(EngineError::Unavailable(
        "pool closed".into(),
    )));
    let response = get(app(down), "/ready").await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json();
    assert_eq!(body["ready"], false);
}

#[tokio::test]
async fn test_metrics_endpoint_without_recorder() {
    let engine = Arc::new(MemoryEngine::new(scenario_footprints()));
    let response = get(app(engine), "/metrics").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response
        .content_type
        .as_deref()
        .unwrap_or_default()
        .starts_with("text/plain"));
}

#[tokio::test]
async fn test_repeated_filter_keys_use_first_value() {
    let engine = Arc::new(MemoryEngine::new(scenario_footprints()));

    let response = get(
        app(engine.clone()),
        "/stats?category=residential&subtype=house&category=commercial&subtype=office",
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.content_type.as_deref(), Some("application/json"));
    assert_eq!(
        response.json::<StatsBody>(),
        StatsBody {
            count: 3,
            avg_height: Some(20.0)
        }
    );

    let uri = tile_uri(&house_tile(), "?category=residential&category=commercial");
    let response = get(app(engine), &uri).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(decode_ids(&response.body), vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_cors_and_compression_layers_apply() {
    let engine = Arc::new(MemoryEngine::new(scenario_footprints()));
    let request = Request::builder()
        .uri("/stats?category=residential")
        .header(header::ORIGIN, "https://maps.example.org")
        .header(header::ACCEPT_ENCODING, "gzip")
        .body(Body::empty())
        .unwrap();

    let response = app(engine).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
