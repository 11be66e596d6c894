use crate::handlers::{
    admin::{admin_area, create_center, dashboard, update_center},
    auth::{get_session, sign_in, sign_out, sign_up},
    blog::{get_post, get_posts},
    centers::{get_center, get_centers, get_centers_map},
    health::health_check,
    images::{deactivate_image, reorder_images, upload_image},
    leads::{create_lead, get_leads},
    locations::{get_centers_by_state, get_neighboring_locations, get_states},
    pages::{center_page, state_page, town_page},
    seo::{center_og_image, fallback, robots_txt, sitemap_index, sitemap_static},
};
use crate::rate_limit::limit_lead_submissions;
use crate::schemas::{ApiDoc, AppState};
use crate::storage::{MAX_IMAGE_BYTES, MEDIA_PREFIX};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Room for multipart framing around a maximum-size image.
const UPLOAD_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 64 * 1024;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let media = ServeDir::new(&state.settings.storage_dir);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Directory JSON API
        .route("/api/states", get(get_states))
        .route("/api/centers", get(get_centers))
        .route("/api/centers-map", get(get_centers_map))
        .route("/api/centers-by-state", get(get_centers_by_state))
        .route("/api/centers/:key", get(get_center))
        .route("/api/neighboring-locations", get(get_neighboring_locations))
        .route("/api/centers/:key/images/reorder", put(reorder_images))
        // Lead submission, rate limited before the handler runs
        .route(
            "/api/leads",
            post(create_lead).route_layer(middleware::from_fn_with_state(
                state.clone(),
                limit_lead_submissions,
            )),
        )
        // Page data
        .route("/api/pages/states/:state", get(state_page))
        .route("/api/pages/states/:state/:city", get(town_page))
        .route("/api/pages/centers/:key", get(center_page))
        // Auth
        .route("/api/auth/sign-up", post(sign_up))
        .route("/api/auth/sign-in", post(sign_in))
        .route("/api/auth/sign-out", post(sign_out))
        .route("/api/auth/session", get(get_session))
        // Admin
        .route("/admin", get(admin_area))
        .route("/dashboard", get(dashboard))
        .route("/api/admin/leads", get(get_leads))
        .route("/api/admin/centers", post(create_center))
        .route("/api/admin/centers/:key", put(update_center))
        .route(
            "/api/admin/centers/:key/images",
            post(upload_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/admin/centers/:key/images/:image_id", delete(deactivate_image))
        // Blog
        .route("/api/blog", get(get_posts))
        .route("/api/blog/:slug", get(get_post))
        // SEO
        .route("/robots.txt", get(robots_txt))
        .route("/sitemap-index.xml", get(sitemap_index))
        .route("/sitemap-static.xml", get(sitemap_static))
        .route("/api/og/centers/:slug", get(center_og_image))
        .fallback(fallback)
        // Uploaded images
        .nest_service(MEDIA_PREFIX, media)
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
