//! Axum router construction and brand API route mapping.
//!
//! The [`app`] function wires every endpoint to its handler and returns a
//! ready-to-serve [`axum::Router`].  Unlike a gateway that multiplexes on
//! query parameters, the brand API is small enough that each route maps
//! straight to one handler.

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderMap, HeaderValue, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::errors::{generate_request_id, ApiError};
use crate::metrics::{metrics_handler, metrics_middleware, LOGO_BYTES_RECEIVED_TOTAL};
use crate::AppState;

// -- OpenAPI specification ----------------------------------------------------

/// OpenAPI documentation for the BrandVault API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "BrandVault API",
        version = "0.1.0",
        description = "Brand catalog service: logo upload, blob storage, brand listing"
    ),
    paths(health_check, list_brands, create_brand, get_logo),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Brand", description = "Brand catalog operations"),
        (name = "Logo", description = "Logo blob serving"),
    )
)]
struct ApiDoc;

/// Build the axum [`Router`] with all brand API routes.
///
/// The returned router is ready to be passed to `axum::serve`.
pub fn app(state: Arc<AppState>) -> Router {
    let openapi = ApiDoc::openapi();
    let max_upload_size = state.config.server.max_upload_size;

    Router::new()
        // Health check endpoint.
        .route("/health", get(health_check))
        // Prometheus metrics endpoint.
        .route("/metrics", get(metrics_handler))
        // The original system served the brand list at the gateway root.
        .route("/", get(list_brands))
        // Brand catalog routes.
        .route("/brands", get(list_brands))
        .route("/brands/:name", post(create_brand))
        // Logo blob serving, so logoUrl resolves against this process.
        .route("/logos/:blob_ref", get(get_logo))
        // Swagger UI at /docs, OpenAPI spec at /openapi.json
        .merge(SwaggerUi::new("/docs").url("/openapi.json", openapi))
        .with_state(state.clone())
        // Layer ordering: inner layers run first, outer layers wrap them.
        // gateway_key_middleware is innermost (closest to handlers).
        .layer(middleware::from_fn_with_state(state, gateway_key_middleware))
        // common_headers_middleware adds standard response headers.
        .layer(middleware::from_fn(common_headers_middleware))
        // metrics_middleware is outer (captures full request lifecycle).
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        // Logo uploads are capped; oversize bodies fail extraction with 413.
        .layer(DefaultBodyLimit::max(max_upload_size))
}

// -- Common headers middleware -----------------------------------------------

/// Tower middleware that adds common response headers to every response:
/// - `x-request-id`: 16-character uppercase hex string
/// - `Date`: RFC 7231 formatted timestamp
/// - `Server`: `BrandVault`
async fn common_headers_middleware(req: Request<axum::body::Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    // Only set x-request-id if not already present (the error renderer sets it).
    if !headers.contains_key("x-request-id") {
        let request_id = generate_request_id();
        headers.insert("x-request-id", HeaderValue::from_str(&request_id).unwrap());
    }

    let date = httpdate::fmt_http_date(std::time::SystemTime::now());
    headers.insert("date", HeaderValue::from_str(&date).unwrap());
    headers.insert("server", HeaderValue::from_static("BrandVault"));

    response
}

// -- Gateway key middleware ---------------------------------------------------

/// Header the upstream gateway injects its shared secret into.
const GATEWAY_KEY_HEADER: &str = "x-functions-key";

/// Paths that bypass the gateway key check.
const KEY_SKIP_PATHS: &[&str] = &["/health", "/metrics", "/docs", "/openapi.json"];

/// Shared-secret middleware.
///
/// When `auth.gateway_key` is configured non-empty, brand routes require
/// a matching `x-functions-key` header (constant-time comparison).  Logo
/// serving and infrastructure endpoints are exempt; logos are public by
/// definition.
async fn gateway_key_middleware(
    State(state): State<Arc<AppState>>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let expected = state.config.auth.gateway_key.as_bytes();
    if expected.is_empty() {
        return Ok(next.run(req).await);
    }

    let path = req.uri().path();
    if KEY_SKIP_PATHS.iter().any(|skip| path == *skip)
        || path.starts_with("/docs/")
        || path.starts_with("/logos/")
    {
        return Ok(next.run(req).await);
    }

    let presented = req
        .headers()
        .get(GATEWAY_KEY_HEADER)
        .map(|v| v.as_bytes())
        .unwrap_or_default();

    if bool::from(presented.ct_eq(expected)) {
        Ok(next.run(req).await)
    } else {
        Err(ApiError::InvalidGatewayKey)
    }
}

// -- Health check ------------------------------------------------------------

/// `GET /health` -- Returns `{"status": "ok"}` with 200 OK.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "HealthCheck",
    responses(
        (status = 200, description = "Health check OK")
    )
)]
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "application/json")],
        r#"{"status":"ok"}"#,
    )
}

// -- Brand handlers ----------------------------------------------------------

/// `GET /brands` (also `GET /`) -- the public brand listing.
#[utoipa::path(
    get,
    path = "/brands",
    tag = "Brand",
    operation_id = "ListBrands",
    responses(
        (status = 200, description = "JSON array of {name, logoUrl}"),
        (status = 500, description = "Catalog store failure")
    )
)]
async fn list_brands(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let brands = state.service.list_brands().await?;
    let body = serde_json::to_string(&brands).map_err(anyhow::Error::from)?;
    Ok((
        StatusCode::OK,
        [("content-type", "application/json")],
        body,
    )
        .into_response())
}

/// `POST /brands/{name}` -- create a brand from a raw logo upload.
///
/// The body is the undecoded image bytes; the declared content type must
/// be `application/octet-stream`.  The true image type is sniffed from
/// the bytes.
#[utoipa::path(
    post,
    path = "/brands/{name}",
    tag = "Brand",
    operation_id = "CreateBrand",
    params(("name" = String, Path, description = "Brand display name")),
    request_body(content = Vec<u8>, content_type = "application/octet-stream", description = "Raw logo image bytes"),
    responses(
        (status = 204, description = "Brand created"),
        (status = 400, description = "Validation failure, JSON {message}")
    )
)]
async fn create_brand(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Response, ApiError> {
    let declared = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok());

    metrics::counter!(LOGO_BYTES_RECEIVED_TOTAL).increment(body.len() as u64);

    state.service.create_brand(&name, declared, body).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

// -- Logo serving ------------------------------------------------------------

/// `GET /logos/{blob_ref}` -- serve stored logo bytes with the content
/// type they were uploaded with.
#[utoipa::path(
    get,
    path = "/logos/{blob_ref}",
    tag = "Logo",
    operation_id = "GetLogo",
    params(("blob_ref" = String, Path, description = "Logo blob reference")),
    responses(
        (status = 200, description = "Logo bytes"),
        (status = 404, description = "No such logo")
    )
)]
async fn get_logo(
    State(state): State<Arc<AppState>>,
    Path(blob_ref): Path<String>,
) -> Result<Response, ApiError> {
    let blob = state
        .blobs
        .get(&blob_ref)
        .await?
        .ok_or(ApiError::LogoNotFound {
            blob_ref: blob_ref.clone(),
        })?;

    let content_type = HeaderValue::from_str(&blob.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    let mut response = (StatusCode::OK, blob.data).into_response();
    response.headers_mut().insert("content-type", content_type);
    Ok(response)
}
