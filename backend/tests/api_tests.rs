//! HTTP API tests
//!
//! Drives the router end to end over the in-memory store.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use common::*;
use ks_server::create_app;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let app = create_app(Kitchen::new().state);
        let (status, body) = send(&app, "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["store"], "connected");
    }

    #[tokio::test]
    async fn test_sale_to_placed_order() {
        let app = create_app(Kitchen::new().state);

        let (status, supplier) = send(
            &app,
            "POST",
            "/api/v1/suppliers",
            Some(json!({ "name": "Dairy Co", "contact_email": "orders@dairy.example" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let supplier_id = id_of(&supplier);

        let (status, milk) = send(
            &app,
            "POST",
            "/api/v1/ingredients",
            Some(json!({
                "name": "Milk",
                "unit": "l",
                "current_stock": "6",
                "min_stock_level": "5",
                "cost_per_unit": "1.20",
                "supplier_id": supplier_id,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let milk_id = id_of(&milk);

        let latte = Uuid::new_v4();
        let (status, _) = send(
            &app,
            "PUT",
            "/api/v1/recipes",
            Some(json!({
                "kind": "menu_item",
                "owner_id": latte,
                "name": "Latte",
                "components": [{ "ingredient_id": milk_id, "quantity_per_serving": "0.25" }],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, recipe) =
            send(&app, "GET", &format!("/api/v1/recipes/menu_item/{}", latte), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(recipe["components"].as_array().unwrap().len(), 1);

        let (status, outcome) = send(
            &app,
            "POST",
            "/api/v1/sales",
            Some(json!({
                "line_items": [{
                    "menu_item_id": latte,
                    "name": "Latte",
                    "quantity": "4",
                    "unit_price": "3.50",
                }],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(outcome["sale"]["deduction_status"], "applied");
        assert_eq!(outcome["alerts"].as_array().unwrap().len(), 1);
        let sale_id = outcome["sale"]["id"].as_str().unwrap().to_string();

        let (status, journal) =
            send(&app, "GET", &format!("/api/v1/sales/{}/journal", sale_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(journal.as_array().unwrap().len(), 1);

        let (status, report) =
            send(&app, "POST", &format!("/api/v1/sales/{}/deduct", sale_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["already_applied"], true);

        let (status, alerts) = send(
            &app,
            "GET",
            &format!("/api/v1/alerts?ingredient_id={}", milk_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(alerts[0]["severity"], "high");

        let (status, generated) = send(&app, "POST", "/api/v1/drafts/generate", None).await;
        assert_eq!(status, StatusCode::CREATED);
        let draft_id = generated["drafts"][0]["id"].as_str().unwrap().to_string();
        // 5 left, par 10
        assert_eq!(generated["drafts"][0]["lines"][0]["quantity"], "5.00");

        let (status, placed) =
            send(&app, "POST", &format!("/api/v1/drafts/{}/place", draft_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(placed["supplier_notified"], true);
        assert_eq!(placed["draft"]["status"], "pending");

        let (status, error) = send(
            &app,
            "PUT",
            &format!("/api/v1/drafts/{}/lines", draft_id),
            Some(json!({ "ingredient_id": milk_id, "quantity": "1" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error["error"]["code"], "INVALID_DRAFT_TRANSITION");
    }

    #[tokio::test]
    async fn test_validation_errors_are_bilingual() {
        let app = create_app(Kitchen::new().state);
        let (status, error) = send(
            &app,
            "POST",
            "/api/v1/suppliers",
            Some(json!({ "name": "", "contact_email": "not-an-email" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"]["code"], "VALIDATION_ERROR");
        assert!(error["error"]["message_th"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_unknown_records_are_not_found() {
        let app = create_app(Kitchen::new().state);
        let (status, error) =
            send(&app, "GET", &format!("/api/v1/sales/{}", Uuid::new_v4()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["error"]["code"], "NOT_FOUND");

        let (status, _) = send(
            &app,
            "GET",
            &format!("/api/v1/recipes/combo/{}", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_partial_deduction_body_lists_ingredients() {
        let kitchen = Kitchen::new();
        let beans = kitchen.ingredient("Beans", "5", "1", None, None).await.id;
        let espresso = Uuid::new_v4();
        kitchen
            .recipe(shared::RecipeOwner::menu_item(espresso), &[(beans, "0.018")])
            .await;
        kitchen.store.inject_failures(beans, 1).await;
        let app = create_app(kitchen.state.clone());

        let (status, error) = send(
            &app,
            "POST",
            "/api/v1/sales",
            Some(json!({
                "line_items": [{
                    "menu_item_id": espresso,
                    "name": "Espresso",
                    "quantity": "1",
                    "unit_price": "2.50",
                }],
            })),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error["error"]["code"], "PARTIAL_DEDUCTION");
        assert_eq!(error["error"]["details"]["applied"], json!([]));
        assert_eq!(error["error"]["details"]["pending"], json!([beans]));

        let (status, unfinished) = send(&app, "GET", "/api/v1/sales/unfinished", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(unfinished.as_array().unwrap().len(), 1);
    }
}
