use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{handlers, AppState};

/// Build the axum router with all voucher endpoints under /api.
///
/// Static segments (`disabled`, `sold`) take priority over the `:key`
/// capture; `:key` is a voucher id on the management routes and a voucher
/// code on the recharge/balance routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/register", post(handlers::register))
        .route("/api/get-token", post(handlers::get_token))
        .route("/api/statistics", get(handlers::statistics))
        .route(
            "/api/vouchers",
            get(handlers::list_vouchers).post(handlers::create_voucher),
        )
        .route("/api/vouchers/disabled", get(handlers::disabled_vouchers))
        .route("/api/vouchers/sold", get(handlers::sold_vouchers))
        .route(
            "/api/vouchers/:key",
            get(handlers::voucher_detail).delete(handlers::disable_voucher),
        )
        .route("/api/vouchers/:key/enable", post(handlers::enable_voucher))
        .route(
            "/api/vouchers/:key/mark-sold",
            post(handlers::mark_voucher_sold),
        )
        .route("/api/vouchers/:key/recharge", post(handlers::recharge))
        .route("/api/vouchers/:key/balance", get(handlers::check_balance))
        .route("/api/pay", post(handlers::pay))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
