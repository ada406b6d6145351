//! Route definitions for the Pharmacy Management Platform
//!
//! Every protected group carries the capability it requires; the auth
//! middleware wraps all of them.

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use shared::Capability;

use crate::{
    handlers,
    middleware::{auth_middleware, require_capability},
    AppState,
};

/// Create API routes
pub fn api_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/auth/me", get(handlers::me))
        .merge(dashboard_routes())
        .merge(medicine_routes())
        .merge(stock_alert_routes())
        .merge(catalogue_routes())
        .merge(sales_view_routes())
        .merge(sales_routes())
        .merge(report_routes())
        .merge(receipt_routes())
        .merge(user_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .route("/auth/login", post(handlers::login))
        .merge(protected)
}

fn guarded(router: Router<AppState>, capability: Capability) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(capability, require_capability))
}

/// Dashboard routes (protected)
fn dashboard_routes() -> Router<AppState> {
    guarded(
        Router::new().route("/dashboard", get(handlers::get_dashboard)),
        Capability::ViewDashboard,
    )
}

/// Medicine read routes (protected)
fn medicine_routes() -> Router<AppState> {
    guarded(
        Router::new()
            .route("/medicines", get(handlers::list_medicines))
            .route("/medicines/:medicine_id", get(handlers::get_medicine)),
        Capability::ViewMedicines,
    )
}

/// Medicine write routes (protected)
fn catalogue_routes() -> Router<AppState> {
    guarded(
        Router::new()
            .route("/medicines", post(handlers::create_medicine))
            .route(
                "/medicines/:medicine_id",
                put(handlers::update_medicine).delete(handlers::delete_medicine),
            ),
        Capability::ManageMedicines,
    )
}

/// Stock alert routes (protected)
fn stock_alert_routes() -> Router<AppState> {
    guarded(
        Router::new()
            .route("/medicines/low-stock", get(handlers::low_stock))
            .route("/medicines/expired", get(handlers::expired))
            .route("/medicines/expiring-soon", get(handlers::expiring_soon)),
        Capability::ViewStockAlerts,
    )
}

/// Sales read routes (protected)
fn sales_view_routes() -> Router<AppState> {
    guarded(
        Router::new()
            .route("/sales", get(handlers::list_sales))
            .route("/sales/:sale_id", get(handlers::get_sale)),
        Capability::ViewSales,
    )
}

/// Sales ledger routes (protected)
fn sales_routes() -> Router<AppState> {
    guarded(
        Router::new()
            .route("/sales", post(handlers::record_sale))
            .route(
                "/sales/:sale_id",
                put(handlers::edit_sale).delete(handlers::reverse_sale),
            ),
        Capability::RecordSales,
    )
}

/// Report routes (protected)
fn report_routes() -> Router<AppState> {
    guarded(
        Router::new().route("/reports/sales", get(handlers::get_sales_report)),
        Capability::ViewReports,
    )
}

/// Stock receipt routes (protected)
fn receipt_routes() -> Router<AppState> {
    guarded(
        Router::new()
            .route(
                "/receipts",
                get(handlers::list_receipts).post(handlers::receive_stock),
            )
            .route("/receipts/:receipt_id", get(handlers::get_receipt)),
        Capability::ReceiveStock,
    )
}

/// User management and catalogue maintenance routes (protected)
fn user_routes() -> Router<AppState> {
    guarded(
        Router::new()
            .route("/users", get(handlers::list_users).post(handlers::create_user))
            .route("/users/:user_id", put(handlers::update_user))
            .route("/users/:user_id/deactivate", post(handlers::deactivate_user))
            .route("/medicines", delete(handlers::clear_catalogue)),
        Capability::ManageUsers,
    )
}
