use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use reach_api::{app, AppState};
use reach_core::PageLimits;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app() -> Router {
    app(AppState::in_memory(PageLimits::default()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_influencer(app: &Router, name: &str, email: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/influencers",
        Some(json!({ "name": name, "email": email })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().unwrap()
}

async fn create_gaming_offer(app: &Router) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/offers",
        Some(json!({
            "title": "Gaming Platform Promotion",
            "description": "Promote our new gaming platform to your audience",
            "categories": ["Gaming", "Tech"],
            "payout": {
                "payout_type": "CPA",
                "cpa_amount": 20.0,
                "country_overrides": [
                    { "country_code": "DE", "cpa_amount": 30.0 },
                    { "country_code": "US", "cpa_amount": 25.0 }
                ]
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_and_root() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy" }));

    let (status, body) = send(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["api_version"], "v1");
}

#[tokio::test]
async fn test_create_and_fetch_offer() {
    let app = test_app();
    let offer_id = create_gaming_offer(&app).await;

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/offers/{}", offer_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Gaming Platform Promotion");
    assert_eq!(body["categories"], json!(["Gaming", "Tech"]));
    assert_eq!(body["payout"]["payout_type"], "CPA");
    assert_eq!(body["payout"]["cpa_amount"], 20.0);
    assert_eq!(body["payout"]["country_overrides"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_invalid_payout_is_bad_request() {
    let app = test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/offers",
        Some(json!({
            "title": "Broken",
            "description": "Missing cpa amount",
            "categories": ["Tech"],
            "payout": { "payout_type": "CPA" }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "CPA payout requires a valid cpa_amount");
}

#[tokio::test]
async fn test_missing_offer_is_not_found() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/api/v1/offers/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Offer 999 not found");
}

#[tokio::test]
async fn test_base_payout_view_spans_overrides() {
    let app = test_app();
    let offer_id = create_gaming_offer(&app).await;
    let bob = create_influencer(&app, "Bob Smith", "bob@example.com").await;

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/offers/influencer/{}", bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);

    let item = &body["offers"][0];
    assert_eq!(item["id"], offer_id);
    assert_eq!(item["payout_info"]["payout_type"], "CPA");
    assert_eq!(item["payout_info"]["display_text"], "$20.00 - $30.00 CPA");
    assert_eq!(item["payout_info"]["min_amount"], 20.0);
    assert_eq!(item["payout_info"]["max_amount"], 30.0);
    assert_eq!(item["payout_info"]["is_custom"], false);
}

#[tokio::test]
async fn test_custom_payout_replaces_base_view() {
    let app = test_app();
    let offer_id = create_gaming_offer(&app).await;
    let alice = create_influencer(&app, "Alice Johnson", "alice@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/offers/{}/custom-payouts", offer_id),
        Some(json!({
            "influencer_id": alice,
            "payout_type": "FIXED",
            "fixed_amount": 2000.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["payout_type"], "FIXED");

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/offers/{}/influencer/{}", offer_id, alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payout_info"]["payout_type"], "Fixed");
    assert_eq!(body["payout_info"]["display_text"], "$2000.00 Fixed");
    assert_eq!(body["payout_info"]["min_amount"], 2000.0);
    assert_eq!(body["payout_info"]["max_amount"], 2000.0);
    assert_eq!(body["payout_info"]["is_custom"], true);

    // Removing it restores the base view
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/offers/{}/custom-payouts/{}", offer_id, alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/offers/{}/influencer/{}", offer_id, alice),
        None,
    )
    .await;
    assert_eq!(body["payout_info"]["display_text"], "$20.00 - $30.00 CPA");
}

#[tokio::test]
async fn test_unknown_influencer_gets_empty_listing() {
    let app = test_app();
    create_gaming_offer(&app).await;

    let (status, body) = send(&app, Method::GET, "/api/v1/offers/influencer/4242", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "offers": [], "total": 0 }));
}

#[tokio::test]
async fn test_update_merges_payout_then_validates() {
    let app = test_app();
    let offer_id = create_gaming_offer(&app).await;
    let uri = format!("/api/v1/offers/{}", offer_id);

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({ "payout": { "payout_type": "FIXED", "fixed_amount": 500.0 } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Fixed payout should not have cpa_amount");

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({
            "title": "Gaming Platform Flat Fee",
            "payout": { "payout_type": "FIXED", "cpa_amount": null, "fixed_amount": 500.0 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["title"], "Gaming Platform Flat Fee");
    assert_eq!(body["description"], "Promote our new gaming platform to your audience");
    assert_eq!(body["payout"]["payout_type"], "FIXED");
    assert_eq!(body["payout"]["fixed_amount"], 500.0);
    assert!(body["payout"]["cpa_amount"].is_null());
}

#[tokio::test]
async fn test_list_offers_with_title_filter_and_paging() {
    let app = test_app();
    create_gaming_offer(&app).await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/offers",
        Some(json!({
            "title": "Fashion Brand Campaign",
            "description": "Exclusive fashion brand partnership",
            "categories": ["Fashion"],
            "payout": { "payout_type": "FIXED", "fixed_amount": 1000.0 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::GET, "/api/v1/offers?title=fashion", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["offers"][0]["title"], "Fashion Brand Campaign");

    let (_, body) = send(&app, Method::GET, "/api/v1/offers?skip=1&limit=1", None).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["offers"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::GET, "/api/v1/offers?limit=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_offer_cascades() {
    let app = test_app();
    let offer_id = create_gaming_offer(&app).await;
    let alice = create_influencer(&app, "Alice Johnson", "alice@example.com").await;
    send(
        &app,
        Method::POST,
        &format!("/api/v1/offers/{}/custom-payouts", offer_id),
        Some(json!({ "influencer_id": alice, "payout_type": "CPA", "cpa_amount": 22.0 })),
    )
    .await;

    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/offers/{}", offer_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/offers/{}/custom-payouts/{}", offer_id, alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_influencer_crud_and_duplicate_email() {
    let app = test_app();
    let carol = create_influencer(&app, "Carol White", "carol@example.com").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/influencers",
        Some(json!({ "name": "Carol Again", "email": "Carol@Example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/influencers/{}", carol),
        Some(json!({ "name": "Carol W." })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Carol W.");
    assert_eq!(body["email"], "carol@example.com");

    let (status, body) = send(&app, Method::GET, "/api/v1/influencers", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/influencers/{}", carol), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, &format!("/api/v1/influencers/{}", carol), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
