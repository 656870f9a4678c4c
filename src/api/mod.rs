//! HTTP surface: router construction, middleware stack and server startup.

use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Method, Request, header::CONTENT_TYPE},
    routing::{get, options},
    Extension, Json, Router,
};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use url::Url;
use utoipa::openapi::{InfoBuilder, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

pub(crate) mod cookies;
pub(crate) mod handlers;
pub(crate) mod response;

use crate::auth::{
    LoginOrchestrator, RegistrationOrchestrator, TokenConfig, TokenManager,
};
use crate::oauth::{KakaoConfig, KakaoProvider, OAuthProvider};
use crate::storage::{
    AccountGateway, BlobConfig, BlobStore, HttpBlobStore, PgAccountGateway, PgTokenStore,
};

/// Shared per-process state handed to every handler.
pub struct AppContext {
    pub tokens: TokenManager,
    pub login: LoginOrchestrator,
    pub registration: RegistrationOrchestrator,
}

impl AppContext {
    #[must_use]
    pub fn new(
        provider: Arc<dyn OAuthProvider>,
        accounts: Arc<dyn AccountGateway>,
        blobs: Arc<dyn BlobStore>,
        token_store: Arc<dyn crate::storage::TokenStore>,
        token_config: TokenConfig,
    ) -> Self {
        let tokens = TokenManager::new(token_store, token_config);
        let login = LoginOrchestrator::new(provider, accounts.clone(), tokens.clone());
        let registration = RegistrationOrchestrator::new(accounts, blobs, tokens.clone());
        Self {
            tokens,
            login,
            registration,
        }
    }
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and included in the generated `OpenAPI` spec.
/// Routes added outside (like `OPTIONS /health`) are intentionally not documented.
fn api_router() -> OpenApiRouter {
    // `routes!` reads #[utoipa::path] to bind HTTP method + path and add the route to OpenAPI.
    let mut router = OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(handlers::health::health))
        .routes(routes!(handlers::login::login))
        .routes(routes!(handlers::join::join))
        .routes(routes!(handlers::refresh::refresh))
        .routes(routes!(handlers::logout::logout));

    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Kakao login, session tokens and registration".to_string());
    router.get_openapi_mut().tags = Some(vec![auth_tag]);

    router
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(Some(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    OpenApiBuilder::new().info(info).build()
}

/// Build the application router for a given context.
pub fn router(ctx: Arc<AppContext>, frontend_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(AllowOrigin::exact(frontend_origin))
        .allow_credentials(true);

    let (router, api) = api_router().split_for_parts();

    router
        .route("/health", options(handlers::health))
        .route(
            "/openapi.json",
            get(move || {
                let api = api.clone();
                async move { Json(api) }
            }),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(ctx)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    dsn: String,
    frontend_url: String,
    token_config: TokenConfig,
    kakao_config: KakaoConfig,
    blob_config: BlobConfig,
) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let provider = Arc::new(
        KakaoProvider::new(kakao_config)
            .map_err(|err| anyhow!("failed to build Kakao client: {err}"))?,
    );
    let accounts = Arc::new(PgAccountGateway::new(pool.clone()));
    let blobs = Arc::new(HttpBlobStore::new(blob_config)?);
    let token_store = Arc::new(PgTokenStore::new(pool));

    let ctx = Arc::new(AppContext::new(
        provider,
        accounts,
        blobs,
        token_store,
        token_config,
    ));

    let app = router(ctx, frontend_origin(&frontend_url)?);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn frontend_origin(frontend_base_url: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(frontend_base_url)
        .with_context(|| format!("Invalid frontend base URL: {frontend_base_url}"))?;
    let host = parsed.host_str().ok_or_else(|| {
        anyhow!("Frontend base URL must include a valid host: {frontend_base_url}")
    })?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build frontend origin header")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontend_origin_strips_path_and_keeps_port() {
        let origin = frontend_origin("https://haru.app/some/path").unwrap();
        assert_eq!(origin.to_str().unwrap(), "https://haru.app");

        let origin = frontend_origin("http://localhost:5173/").unwrap();
        assert_eq!(origin.to_str().unwrap(), "http://localhost:5173");
    }

    #[test]
    fn frontend_origin_rejects_garbage() {
        assert!(frontend_origin("not a url").is_err());
    }

    #[test]
    fn openapi_documents_every_route() {
        let (_router, api) = api_router().split_for_parts();
        for path in ["/health", "/auth/kakao", "/auth/join", "/refresh", "/logout"] {
            assert!(api.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
