use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use citydash_observability::{HealthCheck, HealthReport};
use citydash_shard::{Scope, ShardExecutor};
use http::StatusCode;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod detail;
mod listing;
mod payroll;
mod queries;

pub fn build_router(executor: ShardExecutor) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/api/ciudades", get(listing::cities))
        .route("/api/facturas", get(listing::invoices))
        .route("/api/facturas/detalle/{id}", get(detail::invoice))
        .route("/api/empleados", get(listing::employees))
        .route("/api/empleados/payroll/{id}", get(payroll::payroll))
        .route("/api/compras", get(listing::purchases))
        .route("/api/compras/detalle/{id}", get(detail::purchase_order))
        .route("/api/ventas", get(listing::sales))
        .route("/api/contabilidad/asientos", get(listing::accounting_entries))
        .route(
            "/api/contabilidad/asiento/detalle/{id}",
            get(detail::accounting_entry),
        )
        .route("/api/inventario/ajustes", get(listing::adjustments))
        .route(
            "/api/inventario/ajuste/detalle/{id}",
            get(detail::adjustment),
        )
        .route("/api/general/log", get(listing::general_log))
        .route("/{*path}", get(no_found))
        .route("/", get(no_found))
        .layer(Extension(executor))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// `?ciudad=` selects one city; missing or `ALL` means every city.
#[derive(Deserialize, Debug, Default)]
pub struct CityQuery {
    pub ciudad: Option<String>,
}

impl CityQuery {
    pub fn scope(&self) -> Scope {
        Scope::parse(self.ciudad.as_deref())
    }
}

pub async fn no_found() -> Response {
    (StatusCode::NOT_FOUND, String::from("NOT FOUND")).into_response()
}

pub async fn healthz() -> &'static str {
    "ok"
}

/// Per-shard session state. A shard nobody has queried yet is reported
/// as unknown; only a dropped session counts as unhealthy.
pub async fn readyz(Extension(executor): Extension<ShardExecutor>) -> Response {
    let pools = executor.pools();
    let checks = pools.states().await.into_iter().map(|state| {
        let check = match (state.open, state.connected) {
            (true, true) => HealthCheck::healthy(),
            (true, false) => HealthCheck::unhealthy("session disconnected"),
            (false, _) => HealthCheck::unknown("no session opened yet"),
        };
        (state.shard, check)
    });
    let report = HealthReport::from_checks(checks);
    let code = if pools.registry().is_empty() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (code, Json(report)).into_response()
}
