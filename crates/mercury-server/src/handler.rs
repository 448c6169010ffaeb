//! REST handlers.
//!
//! | Method | Path | Access |
//! |--------|------|--------|
//! | `GET` | `/health` | anyone |
//! | `GET` | `/currentStipend` | anyone |
//! | `GET` | `/balance/:id` | anyone (read) |
//! | `GET` | `/transactions` | admin |
//! | `GET` | `/transactions/:id` | anyone (read) |
//! | `POST` | `/transact` | anyone |
//! | `POST` | `/mint` | admin |
//! | `POST` | `/burn` | admin |
//! | `POST` | `/stipend/:id` | anyone, subject to cooldown |
//!
//! Ledger calls block on the commit lock and on disk, so they run on the
//! blocking thread pool.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use mercury_ledger::{BurnRequest, LedgerReader, LedgerWriter, MintRequest, TransferRequest};
use mercury_store::EventFilter;
use mercury_types::{Currency, StoredEvent, User};

use crate::auth::{Action, Credentials};
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Upper bound on `limit` for history queries.
pub const MAX_HISTORY_LIMIT: usize = 1_000;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StipendResponse {
    /// Micro-units granted per stipend.
    pub amount: Currency,
    pub cooldown_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub user: User,
    /// Micro-units.
    pub balance: Currency,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

impl HistoryQuery {
    fn limit(&self, default: usize) -> usize {
        self.limit.unwrap_or(default).min(MAX_HISTORY_LIMIT)
    }
}

async fn blocking<T, F>(work: F) -> ServerResult<T>
where
    F: FnOnce() -> ServerResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ServerError::Internal(format!("ledger task failed: {e}")))?
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

pub async fn current_stipend_handler(State(state): State<AppState>) -> Json<StipendResponse> {
    Json(StipendResponse {
        amount: Currency::STIPEND,
        cooldown_secs: state.stipends.cooldown().as_secs(),
    })
}

pub async fn balance_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ServerResult<Json<BalanceResponse>> {
    state
        .require(&Credentials::from_headers(&headers), Action::Read)
        .await?;
    let ledger = state.ledger.clone();
    let response = blocking(move || {
        let user = User::new(id);
        let balance = ledger.balance_of(&user)?;
        Ok(BalanceResponse { user, balance })
    })
    .await?;
    Ok(Json(response))
}

pub async fn admin_transactions_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> ServerResult<Json<Vec<StoredEvent>>> {
    state
        .require(&Credentials::from_headers(&headers), Action::Admin)
        .await?;
    let limit = query.limit(state.recent_limit);
    let ledger = state.ledger.clone();
    let events = blocking(move || Ok(ledger.recent_events(limit, &EventFilter::all())?)).await?;
    Ok(Json(events))
}

pub async fn transactions_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ServerResult<Json<Vec<StoredEvent>>> {
    state
        .require(&Credentials::from_headers(&headers), Action::Read)
        .await?;
    let limit = query.limit(state.recent_limit);
    let ledger = state.ledger.clone();
    let events =
        blocking(move || Ok(ledger.recent_events(limit, &EventFilter::involving(id))?)).await?;
    Ok(Json(events))
}

pub async fn transact_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TransferRequest>,
) -> ServerResult<Json<StoredEvent>> {
    state
        .require(&Credentials::from_headers(&headers), Action::Transact)
        .await?;
    let ledger = state.ledger.clone();
    let event = blocking(move || Ok(ledger.transfer(request)?)).await?;
    Ok(Json(event))
}

pub async fn mint_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<MintRequest>,
) -> ServerResult<Json<StoredEvent>> {
    state
        .require(&Credentials::from_headers(&headers), Action::Admin)
        .await?;
    let ledger = state.ledger.clone();
    let event = blocking(move || Ok(ledger.mint(request)?)).await?;
    Ok(Json(event))
}

pub async fn burn_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<BurnRequest>,
) -> ServerResult<Json<StoredEvent>> {
    state
        .require(&Credentials::from_headers(&headers), Action::Admin)
        .await?;
    let ledger = state.ledger.clone();
    let event = blocking(move || Ok(ledger.burn(request)?)).await?;
    Ok(Json(event))
}

pub async fn stipend_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ServerResult<Json<StoredEvent>> {
    state
        .require(&Credentials::from_headers(&headers), Action::Transact)
        .await?;
    let ledger = state.ledger.clone();
    let stipends = state.stipends.clone();
    let event = blocking(move || {
        let user = User::new(id);
        Ok(stipends.claim(&*ledger, &user, ledger.now_ms())?)
    })
    .await?;
    Ok(Json(event))
}
