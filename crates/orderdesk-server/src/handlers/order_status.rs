//! Order-status HTTP handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use orderdesk_core::CanonicalOrderStatus;

use crate::error::AppError;
use crate::extract::AppPath;
use crate::services::order_status as order_service;
use crate::ServerState;

/// GET /api/order-status/{customer_name}
pub async fn get(
    State(state): State<Arc<ServerState>>,
    AppPath(customer_name): AppPath<String>,
) -> Result<Json<CanonicalOrderStatus>, AppError> {
    let status = order_service::lookup(&state, &customer_name).await?;
    Ok(Json(status))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use orderdesk_core::UpstreamError;
    use serde_json::json;

    use crate::test_support::{app, send, FakeAgent, FakeOrders};

    fn orders() -> FakeOrders {
        let mut orders = FakeOrders::default();
        orders.records.insert(
            "Ada Lovelace".into(),
            json!({
                "customerName": "Ada Lovelace",
                "customerNumber": 1042,
                "orderDate": "2024-01-05",
                "pickupDate": null,
                "readyDate": "",
                "mountPrice": "350.00",
                "boardPrice": "",
                "depositCash": null,
                "depositCheck": "check #12",
                "paymentCash": 20,
                "balance": "330",
            }),
        );
        orders.records.insert("Nameless".into(), json!({"mountPrice": "10"}));
        orders.failures.insert("down".into(), UpstreamError::Connectivity("refused".into()));
        orders.failures.insert("slow".into(), UpstreamError::Timeout);
        orders.failures.insert("broken".into(), UpstreamError::from_status(500, "trace"));
        orders.failures.insert("db".into(), UpstreamError::Database("locked".into()));
        orders
    }

    async fn get_status(name: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .uri(format!("/api/order-status/{name}"))
            .body(Body::empty())
            .unwrap();
        send(app(orders(), FakeAgent::default()), request).await
    }

    #[tokio::test]
    async fn test_returns_normalized_status() {
        let (status, body) = get_status("Ada%20Lovelace").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "customerName": "Ada Lovelace",
                "customerNumber": "1042",
                "phoneNumber": null,
                "species": null,
                "boardType": null,
                "orderDate": "2024-01-05",
                "readyDate": "",
                "calledDate": null,
                "pickupDate": null,
                "mountPrice": 350.0,
                "boardPrice": 0.0,
                "depositCash": 0.0,
                "depositCheck": 0.0,
                "paymentCash": 20.0,
                "paymentCheck": 0.0,
                "balance": 330.0,
                "lastUpdatedAt": null,
            })
        );
    }

    #[tokio::test]
    async fn test_unknown_customer_is_not_found() {
        let (status, body) = get_status("Nobody").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"detail": "No order found for that customer."}));
    }

    #[tokio::test]
    async fn test_record_without_identifier_is_not_found() {
        let (status, _) = get_status("Nameless").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_non_utf8_path_is_bad_request() {
        let (status, body) = get_status("%FF").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"detail": "The customer name in the request path is not valid."}));
    }

    #[tokio::test]
    async fn test_upstream_failures_map_to_distinct_statuses() {
        assert_eq!(get_status("down").await.0, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(get_status("slow").await.0, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(get_status("db").await.0, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, body) = get_status("broken").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({"detail": "The order status service is currently unavailable."}));
    }
}
