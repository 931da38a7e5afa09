use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use reco_api::{
    create_router,
    db::InMemoryMarketplaceStore,
    services::{policy::ClassifierPolicy, PersonaClassifier, Pipeline, ScoringPolicy},
    AppState,
};

fn pipeline() -> Pipeline {
    Pipeline::new(
        PersonaClassifier::new(ClassifierPolicy::default()),
        &ScoringPolicy::default(),
    )
}

fn create_test_server() -> TestServer {
    let app = create_router(AppState::with_sample_data(pipeline()));
    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_list_personas() {
    let server = create_test_server();
    let response = server.get("/api/v1/personas").await;
    response.assert_status_ok();

    let body: Value = response.json();
    let personas = body["personas"].as_array().unwrap();
    assert_eq!(personas.len(), 10);
    assert_eq!(personas[0]["type"], "local_offline");
    assert_eq!(personas[3]["type"], "trust_safety_pro");
    assert_eq!(personas[3]["vector"]["trust_safety"], 100.0);
    assert_eq!(personas[3]["name"], "Trust & safety expert");
}

#[tokio::test]
async fn test_recommend_returns_sorted_products() {
    let server = create_test_server();
    let response = server
        .post("/api/v1/recommend")
        .json(&json!({ "search_query": "phone" }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 3);
    assert_eq!(body["total_count"], 3);

    let scores: Vec<f64> = products
        .iter()
        .map(|p| p["match_score"].as_f64().unwrap())
        .collect();
    for pair in scores.windows(2) {
        assert!(pair[0] >= pair[1]);
    }

    assert_eq!(body["persona_classification"]["persona_type"], "hybrid_trade");
    assert_eq!(body["search_query"]["original_query"], "phone");
    assert!(body["execution_time"].as_f64().is_some());

    let request_id = response.header("x-request-id");
    assert_eq!(body["session_id"], request_id.to_str().unwrap());
}

#[tokio::test]
async fn test_recommend_honors_request_id() {
    let server = create_test_server();
    let response = server
        .post("/api/v1/recommend")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("trace-123"),
        )
        .json(&json!({ "search_query": "laptop" }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["session_id"], "trace-123");
}

#[tokio::test]
async fn test_recommend_trust_safety_pro() {
    let server = create_test_server();
    let response = server
        .post("/api/v1/recommend")
        .json(&json!({
            "search_query": "camera",
            "trust_safety": 100,
            "quality_condition": 50,
            "remote_transaction": 50,
            "activity_responsiveness": 75,
            "price_flexibility": 25
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let classification = &body["persona_classification"];
    assert_eq!(classification["persona_type"], "trust_safety_pro");
    assert!((classification["confidence"].as_f64().unwrap() - 1.0).abs() < 1e-9);
    assert_eq!(
        body["search_query"]["enhanced_query"],
        "camera safe-payment trusted"
    );
}

#[tokio::test]
async fn test_recommend_applies_filters() {
    let server = create_test_server();
    let response = server
        .post("/api/v1/recommend")
        .json(&json!({ "search_query": "shoes", "category": "shoes" }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["product_id"], "prod_3");
}

#[tokio::test]
async fn test_recommend_empty_store_is_server_error() {
    let state = AppState::new(pipeline(), Arc::new(InMemoryMarketplaceStore::default()), 50);
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server
        .post("/api/v1/recommend")
        .json(&json!({ "search_query": "phone" }))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().starts_with("Empty input"));
}

#[tokio::test]
async fn test_recommend_invalid_slider_is_server_error() {
    let server = create_test_server();
    let response = server
        .post("/api/v1/recommend")
        .json(&json!({ "search_query": "phone", "trust_safety": "very high" }))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("trust_safety"));
}
