//! # Tally API
//!
//! HTTP server for Tally POS: catalog, accounts, dashboard and the sale
//! endpoint backed by [`SaleProcessor`].
//!
//! ## Routes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET  /health                                        public             │
//! │                                                                         │
//! │  /api/v1                                                                │
//! │  ├── POST /login, /register                          public             │
//! │  ├── products, categories, transactions, dashboard   bearer token       │
//! │  └── users                                           bearer + admin     │
//! │                                                                         │
//! │  Layers: TraceLayer → CORS → (require_auth → require_admin) → handler  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tally_core::SaleProcessor;
use tally_db::Database;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{require_admin, require_auth, JwtManager};
use crate::handlers::{auth as auth_handlers, categories, dashboard, health, products, transactions, users};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub processor: Arc<SaleProcessor<Database>>,
    pub jwt: JwtManager,
}

impl AppState {
    pub fn new(db: Database, jwt: JwtManager) -> Self {
        AppState {
            processor: Arc::new(SaleProcessor::new(db.clone())),
            db,
            jwt,
        }
    }
}

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/login", post(auth_handlers::login))
        .route("/register", post(auth_handlers::register));

    let admin = Router::new()
        .route("/users", get(users::list).post(users::create))
        .route("/users/:id", put(users::update).delete(users::delete))
        .route_layer(middleware::from_fn(require_admin));

    let protected = Router::new()
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/:id",
            get(products::get).put(products::update).delete(products::delete),
        )
        .route("/categories", get(categories::list).post(categories::create))
        .route(
            "/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route("/transactions/:id", get(transactions::get))
        .route("/dashboard", get(dashboard::get))
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api/v1", public.merge(protected))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
