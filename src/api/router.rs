//! HTTP router for the workbench API.
//!
//! Middleware stack (outermost first):
//! Extension(ApiContext) → CORS → Cache-Control → request log → handler.
//! The `/admin/*` routes add the admin password gate, except `/admin/auth`.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::multipart::MAX_UPLOAD_BYTES;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the full API router.
///
/// Middleware reads `Extension<ApiContext>`; handlers use `State<ApiContext>`.
pub fn api_router(core: Arc<CoreState>) -> Router {
    let cors = cors_layer(&core.config.cors_origins);
    let ctx = ApiContext::new(core);

    // NOTE: Path params use `:param` syntax (axum 0.7).
    let public = Router::new()
        .route("/", get(endpoints::root::root))
        .route("/health", get(endpoints::root::health))
        .route("/version", get(endpoints::root::version))
        .route(
            "/offices",
            get(endpoints::offices::list).post(endpoints::offices::create),
        )
        .route(
            "/employees",
            get(endpoints::employees::list).post(endpoints::employees::create),
        )
        .route("/employees/:id", patch(endpoints::employees::update))
        .route(
            "/agencies",
            get(endpoints::agencies::list).post(endpoints::agencies::create),
        )
        .route(
            "/agencies/",
            get(endpoints::agencies::list).post(endpoints::agencies::create),
        )
        .route(
            "/agencies/:id",
            get(endpoints::agencies::detail)
                .put(endpoints::agencies::replace)
                .patch(endpoints::agencies::update)
                .delete(endpoints::agencies::delete),
        )
        .route(
            "/contacts",
            get(endpoints::contacts::list).post(endpoints::contacts::create),
        )
        .route(
            "/contacts/:id",
            patch(endpoints::contacts::update).delete(endpoints::contacts::delete),
        )
        .route(
            "/logs",
            get(endpoints::logs::list).post(endpoints::logs::create),
        )
        .route(
            "/logs/:id",
            patch(endpoints::logs::update).delete(endpoints::logs::delete),
        )
        .route(
            "/tasks",
            get(endpoints::tasks::list).post(endpoints::tasks::create),
        )
        .route(
            "/tasks/:id",
            patch(endpoints::tasks::update).delete(endpoints::tasks::delete),
        )
        .route(
            "/production",
            get(endpoints::production::list).post(endpoints::production::create),
        )
        .route("/production/bulk", post(endpoints::production::bulk))
        .route("/production/trend", get(endpoints::production::trend))
        .route(
            "/submissions",
            get(endpoints::submissions::list).post(endpoints::submissions::create),
        )
        .route("/submissions/upload", post(endpoints::submissions::upload))
        .route(
            "/submissions/search-contacts/:agency_id",
            post(endpoints::submissions::search_contacts),
        )
        .route(
            "/submissions/:id",
            get(endpoints::submissions::detail)
                .put(endpoints::submissions::update)
                .delete(endpoints::submissions::delete),
        )
        .route(
            "/submissions/:id/export-csv",
            get(endpoints::submissions::export_csv),
        )
        .route("/ai/chat", post(endpoints::ai::chat))
        .route("/reinsurance/calculate", post(endpoints::reinsurance::calculate))
        .route("/admin/auth", post(endpoints::admin::auth))
        .with_state(ctx.clone());

    let admin = Router::new()
        .route("/admin/employees/:id", delete(endpoints::admin::delete_employee))
        .route("/admin/agencies/:id", delete(endpoints::admin::delete_agency))
        .route(
            "/admin/production/import",
            post(endpoints::admin::import_production),
        )
        .with_state(ctx.clone())
        .route_layer(axum::middleware::from_fn(middleware::admin::require_admin));

    Router::new()
        .merge(public)
        .merge(admin)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(axum::middleware::from_fn(middleware::request_log::log_request))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(cors)
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx))
}

/// CORS for the configured browser origins. Unparseable origins are skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}
