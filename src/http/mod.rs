//! HTTP surface.
//!
//! Two groups of routes per workflow kind: an unauthenticated public
//! surface addressed by access token, and a staff surface gated on the
//! role the upstream authentication layer forwards in request headers.

mod error;
mod handlers;
mod staff;
mod state;

pub use error::{ApiError, ApiResult, ErrorBody};
pub use staff::{STAFF_ID_HEADER, STAFF_NAME_HEADER, STAFF_ROLE_HEADER, StaffIdentity, StaffRole};
pub use state::AppState;

use axum::{
    Json, Router,
    routing::{get, post},
};
use serde_json::json;
use tower_http::trace::TraceLayer;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .merge(order_confirmation_routes())
        .merge(bygherre_routes())
        .merge(photo_report_routes())
        .route("/communications", get(handlers::communications::list))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn order_confirmation_routes() -> Router<AppState> {
    use handlers::order_confirmation as oc;

    Router::new()
        .route("/order-confirmation/send", post(oc::send))
        .route("/order-confirmation/resend", post(oc::resend))
        .route("/order-confirmation/activate", post(oc::activate))
        .route("/order-confirmation/test-delivery", post(oc::test_delivery))
        .route("/order-confirmation/task/:task_id", get(oc::for_task))
        .route("/order-confirmation/public/:token", get(oc::public_fetch))
        .route("/order-confirmation/public/:token/respond", post(oc::respond))
}

fn bygherre_routes() -> Router<AppState> {
    use handlers::bygherre;

    Router::new()
        .route("/bygherre/send", post(bygherre::send))
        .route("/bygherre/task/:task_id", get(bygherre::for_task))
        .route("/bygherre/:id/confirm-final", post(bygherre::confirm_final))
        .route("/bygherre/public/:token", get(bygherre::public_fetch))
        .route("/bygherre/public/:token/respond", post(bygherre::respond))
}

fn photo_report_routes() -> Router<AppState> {
    use handlers::photo_reports as reports;

    Router::new()
        .route("/photoreports", post(reports::create).get(reports::list))
        .route("/photoreports/:id", get(reports::get).put(reports::update))
        .route("/photoreports/:id/send", post(reports::send))
        .route("/photoreports/:id/reset", post(reports::reset))
        .route("/photoreports/public/:token", get(reports::public_fetch))
        .route("/photoreports/public/:token/respond", post(reports::submit))
        .route("/photoreports/public/:token/submit", post(reports::submit))
}

#[cfg(test)]
mod tests;
