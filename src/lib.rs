//! Reelhub is the account, session and media profile API of a video sharing
//! platform.

#[forbid(unsafe_code)]
#[deny(missing_docs, unused_mut)]
mod crypto;
pub mod error;
mod mail;
mod middleware;
mod payment;
mod router;
mod session;
mod storage;
pub mod telemetry;
#[cfg(test)]
mod testutil;
mod token;
mod user;

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, header};
use axum::routing::{get, post};
use axum::{Router, middleware as AxumMiddleware};
use error::ServerError;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

/// MUST NEVER be used in production.
#[cfg(test)]
pub(crate) async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    body: String,
    token: Option<&str>,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder =
            builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    app.oneshot(builder.body(axum::body::Body::from(body)).unwrap())
        .await
        .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub store: Arc<dyn user::CredentialStore>,
    pub token: token::TokenManager,
    pub session: session::SessionManager,
    pub mail: mail::MailManager,
    pub storage: storage::MediaStorage,
    pub payment: payment::PaymentGateway,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        // Remove sensitive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
                .allow_headers(Any)
                .vary([header::AUTHORIZATION]),
        );

    // Operations on the current session. Authorization required.
    let session_router = Router::new()
        .route("/logout", post(router::logout::handler))
        .route("/change-password", post(router::change_password::handler))
        .route_layer(AxumMiddleware::from_fn_with_state(
            state.clone(),
            middleware::authorize,
        ));

    // Payment confirmation flow. Authorization required.
    let payments_router = Router::new()
        .route("/verify", post(router::payment::verify))
        .route("/receipt", post(router::payment::receipt))
        .route_layer(AxumMiddleware::from_fn_with_state(
            state.clone(),
            middleware::authorize,
        ));

    Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::status))
        // `POST /register` goes to `create`.
        .route("/register", post(router::create::handler))
        // `POST /login` goes to `login`.
        .route("/login", post(router::login::handler))
        // `POST /refresh-token` rotates the session pair.
        .route("/refresh-token", post(router::refresh_token::handler))
        .merge(session_router)
        .nest("/users", router::users::router(state.clone()))
        .nest("/payments", payments_router)
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state() -> Result<AppState, Box<dyn std::error::Error>>
{
    // read configuration file. let it in memory.
    let config = config::Configuration::default().read()?;

    let pwd = crypto::PasswordManager::new(config.argon2.clone())?;

    let store = match config.postgres {
        Some(ref postgres) => {
            user::PgCredentialStore::connect(postgres, pwd).await?
        },
        None => {
            // The credential store is the single source of truth for
            // refresh-token validity; nothing works without it.
            tracing::error!("missing `postgres` entry on `config.yaml` file");
            std::process::exit(0);
        },
    };

    // execute migrations scripts on start.
    sqlx::migrate!().run(store.pool()).await?;

    // handle jwt.
    let Some(token_config) = &config.token else {
        tracing::warn!("missing `token` entry on `config.yaml` file");
        std::process::exit(0);
    };
    let token = token::TokenManager::new(&config.url, token_config)?;

    // handle mail sender.
    let mail = if let Some(cfg) = &config.mail {
        mail::MailManager::new(cfg).await?
    } else {
        mail::MailManager::default()
    };

    let storage = storage::MediaStorage::new(config.cloudinary.clone());
    let payment = payment::PaymentGateway::new(config.payment.clone());

    let store: Arc<dyn user::CredentialStore> = Arc::new(store);
    let session =
        session::SessionManager::new(Arc::clone(&store), token.clone());

    Ok(AppState {
        config,
        store,
        token,
        session,
        mail,
        storage,
        payment,
    })
}
