use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, patch, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use sea_orm::DatabaseConnection;

use std::sync::Arc;

use crate::{account, auth, category, token, transaction};
use ledger::{Caller, Ledger};

/// Token-signing configuration, supplied once at startup.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub signing_secret: String,
    pub token_ttl: chrono::Duration,
}

#[derive(Clone)]
pub struct ServerState {
    pub ledger: Arc<Ledger>,
    pub db: DatabaseConnection,
    pub auth: Arc<AuthConfig>,
}

/// Verifies the bearer token and stores the resulting [`Caller`] in the
/// request extensions for the handlers.
async fn require_token(
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(bearer)) = bearer else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let claims = token::verify(&state.auth.signing_secret, bearer.token())
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    request
        .extensions_mut()
        .insert(Caller::new(claims.sub, claims.admin));
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route("/account/create", post(account::create))
        .route("/account/read/{id}", get(account::read))
        .route("/account/update/{id}", patch(account::update))
        .route("/account/delete/{id}", delete(account::delete))
        .route("/account/list", get(account::list))
        .route("/account/topup", post(account::top_up))
        .route("/account/my", get(account::my))
        .route("/account/balance", get(account::balance))
        .route("/account/transfer", post(account::transfer))
        .route("/account/mutation", get(account::mutation))
        .route("/transaction-category/create", post(category::create))
        .route("/transaction-category/read/{id}", get(category::read))
        .route("/transaction-category/update/{id}", patch(category::update))
        .route(
            "/transaction-category/delete/{id}",
            delete(category::delete),
        )
        .route("/transaction-category/list", get(category::list))
        .route("/transaction-category/my", get(category::my))
        .route("/transaction/new", post(transaction::new))
        .route("/transaction/list", get(transaction::list))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/upsert", post(auth::upsert))
        .merge(protected)
        .with_state(state)
}

/// Builds the application router. Exposed for in-process testing.
pub fn app(ledger: Ledger, db: DatabaseConnection, auth: AuthConfig) -> Router {
    let state = ServerState {
        ledger: Arc::new(ledger),
        db,
        auth: Arc::new(auth),
    };
    router(state)
}

pub async fn run(ledger: Ledger, db: DatabaseConnection, auth: AuthConfig) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(ledger, db, auth, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    ledger: Ledger,
    db: DatabaseConnection,
    auth: AuthConfig,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(ledger, db, auth)).await
}

pub fn spawn_with_listener(
    ledger: Ledger,
    db: DatabaseConnection,
    auth: AuthConfig,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(ledger, db, auth, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
