//! HTTP server for the Mercury economy ledger.
//!
//! Exposes balances, history, transfers, and stipend claims over a small
//! JSON API. Minting, burning, and the global history are admin routes,
//! guarded by a bearer token when one is configured.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use auth::{Action, AdminTokenAuth, AuthProvider, Credentials, Identity};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use router::build_router;
pub use server::MercuryServer;
pub use state::AppState;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use mercury_ledger::{Ledger, StipendPolicy};
    use mercury_store::InMemoryEventStore;
    use mercury_types::{Currency, EventKind, StoredEvent};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use super::*;

    const TOKEN: &str = "admin-secret";

    fn app() -> Router {
        let ledger = Ledger::open(Arc::new(InMemoryEventStore::new())).unwrap();
        let state = AppState::new(
            Arc::new(ledger),
            StipendPolicy::new(Duration::from_secs(3_600)),
            Arc::new(AdminTokenAuth::new(Some(TOKEN.into()))),
            50,
        );
        build_router(state)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (status, body) = send(&app(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn current_stipend_in_micro_units() {
        let (status, body) = send(&app(), get("/currentStipend")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["amount"], Currency::STIPEND.micros());
        assert_eq!(body["cooldown_secs"], 3_600);
    }

    #[tokio::test]
    async fn mint_transfer_burn_flow() {
        let app = app();

        let (status, event) = send(
            &app,
            post("/mint", json!({"to": "alice", "amount": 50_000_000, "note": "seed"}), Some(TOKEN)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(event["event"]["kind"], "mint");

        let (status, _) = send(
            &app,
            post("/transact", json!({"from": "alice", "to": "bob", "amount": 25_000_000}), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            post(
                "/burn",
                json!({"from": "bob", "amount": 10_000_000, "note": "hat", "link": "/shop/hat"}),
                Some(TOKEN),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, alice) = send(&app, get("/balance/alice")).await;
        let (_, bob) = send(&app, get("/balance/bob")).await;
        assert_eq!(alice["balance"], 25_000_000);
        assert_eq!(bob["balance"], 15_000_000);

        let (status, history) = send(&app, get("/transactions/bob")).await;
        assert_eq!(status, StatusCode::OK);
        let events: Vec<StoredEvent> = serde_json::from_value(history).unwrap();
        let kinds: Vec<EventKind> = events.iter().map(StoredEvent::kind).collect();
        assert_eq!(kinds, [EventKind::Burn, EventKind::Transfer]);
    }

    #[tokio::test]
    async fn admin_routes_need_the_token() {
        let app = app();

        let (status, _) = send(&app, post("/mint", json!({"to": "eve", "amount": 1}), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            post("/mint", json!({"to": "eve", "amount": 1}), Some("wrong")),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, get("/transactions")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let request = Request::builder()
            .uri("/transactions?limit=5")
            .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn read_routes_check_credentials() {
        let app = app();

        let (status, _) = send(&app, get("/balance/alice")).await;
        assert_eq!(status, StatusCode::OK);

        for uri in ["/balance/alice", "/transactions/alice"] {
            let request = Request::builder()
                .uri(uri)
                .header(header::AUTHORIZATION, "Bearer wrong")
                .body(Body::empty())
                .unwrap();
            let (status, _) = send(&app, request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn client_faults_are_bad_requests() {
        let app = app();

        let (status, body) = send(
            &app,
            post("/transact", json!({"from": "alice", "to": "bob", "amount": 100}), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("insufficient balance"));

        let (status, _) = send(
            &app,
            post("/mint", json!({"to": "alice", "amount": 0}), Some(TOKEN)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, balance) = send(&app, get("/balance/alice")).await;
        assert_eq!(balance["balance"], 0);
    }

    #[tokio::test]
    async fn stipend_cooldown_is_enforced() {
        let app = app();

        let (status, event) = send(&app, post("/stipend/carol", json!({}), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(event["event"]["note"], "Stipend");

        let (status, body) = send(&app, post("/stipend/carol", json!({}), None)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert!(body["next_eligible_ms"].as_u64().unwrap() > 0);

        let (_, balance) = send(&app, get("/balance/carol")).await;
        assert_eq!(balance["balance"], Currency::STIPEND.micros());
    }
}
