//! Single-document lookups. Without `ciudad` every city is probed in
//! turn until one of them has the document.

use axum::extract::{Path, Query};
use axum::{Extension, Json};
use citydash_shard::shaping::{
    AccountingEntry, InventoryAdjustment, InvoiceDetail, PurchaseOrder,
    shape_accounting_entry, shape_adjustment, shape_invoice, shape_purchase_order,
};
use citydash_shard::{
    DetailSearchResult, QuerySpec, RecordSets, ShapeError, ShardError, ShardExecutor,
    Tagged,
};
use serde::Serialize;

use super::CityQuery;
use super::queries;
use crate::error::GatewayError;

type Detail<T> = Result<Json<Tagged<T>>, GatewayError>;

async fn find<T, S>(
    executor: &ShardExecutor,
    query: &CityQuery,
    what: &str,
    id: &str,
    build: impl Fn(&str) -> QuerySpec,
    shape: S,
) -> Detail<T>
where
    T: Serialize,
    S: Fn(&RecordSets) -> Result<T, ShapeError>,
{
    let probe =
        |_: &str, sets: RecordSets| shape(&sets).map(Some).map_err(ShardError::from);
    match executor.find_first(&query.scope(), build, probe).await? {
        DetailSearchResult::Found(found) => Ok(Json(found)),
        DetailSearchResult::NotFound => {
            Err(GatewayError::NotFound(format!("{what} '{id}'")))
        }
    }
}

pub async fn invoice(
    Extension(executor): Extension<ShardExecutor>,
    Path(id): Path<String>,
    Query(query): Query<CityQuery>,
) -> Detail<InvoiceDetail> {
    find(
        &executor,
        &query,
        "invoice",
        &id,
        |_| queries::invoice_detail(&id),
        shape_invoice,
    )
    .await
}

pub async fn purchase_order(
    Extension(executor): Extension<ShardExecutor>,
    Path(id): Path<String>,
    Query(query): Query<CityQuery>,
) -> Detail<PurchaseOrder> {
    find(
        &executor,
        &query,
        "purchase order",
        &id,
        |_| queries::purchase_order_detail(&id),
        shape_purchase_order,
    )
    .await
}

pub async fn accounting_entry(
    Extension(executor): Extension<ShardExecutor>,
    Path(id): Path<String>,
    Query(query): Query<CityQuery>,
) -> Detail<AccountingEntry> {
    find(
        &executor,
        &query,
        "accounting entry",
        &id,
        |_| queries::accounting_entry_detail(&id),
        shape_accounting_entry,
    )
    .await
}

pub async fn adjustment(
    Extension(executor): Extension<ShardExecutor>,
    Path(id): Path<String>,
    Query(query): Query<CityQuery>,
) -> Detail<InventoryAdjustment> {
    find(
        &executor,
        &query,
        "inventory adjustment",
        &id,
        |_| queries::adjustment_detail(&id),
        shape_adjustment,
    )
    .await
}
