//! City-wide listings. Every row carries the city it came from in `CiudadDB`.

use axum::extract::Query;
use axum::{Extension, Json};
use citydash_shard::shaping::{PurchaseSummary, SaleSummary};
use citydash_shard::{QuerySpec, Row, Scope, ShardExecutor, Tagged};
use serde::Serialize;

use super::CityQuery;
use super::queries;
use crate::error::GatewayError;

type Listing<T> = Result<Json<Vec<Tagged<T>>>, GatewayError>;

#[derive(Debug, Serialize)]
#[allow(non_snake_case)]
pub struct City {
    pub id_Ciudad: String,
    pub ciu_descripcion: String,
}

pub async fn cities(Extension(executor): Extension<ShardExecutor>) -> Json<Vec<City>> {
    let cities = executor
        .pools()
        .registry()
        .iter()
        .map(|shard| City {
            id_Ciudad: shard.code.clone(),
            ciu_descripcion: shard.display_name.clone(),
        })
        .collect();
    Json(cities)
}

async fn rows(
    executor: &ShardExecutor,
    scope: &Scope,
    build: impl Fn(&str) -> QuerySpec,
) -> Listing<Row> {
    let merged = executor.run_all(scope, build).await?;
    Ok(Json(merged.into_rows()))
}

/// Like [`rows`], converting each row of the first result set into `T`.
async fn mapped<T>(
    executor: &ShardExecutor,
    scope: &Scope,
    build: impl Fn(&str) -> QuerySpec,
) -> Listing<T>
where
    T: for<'a> From<&'a Row>,
{
    let merged = executor
        .run_all_with(scope, build, |_, sets| {
            Ok(sets
                .first()
                .map(|set| set.iter().map(T::from).collect())
                .unwrap_or_default())
        })
        .await?;
    Ok(Json(merged.into_rows()))
}

pub async fn invoices(
    Extension(executor): Extension<ShardExecutor>,
    Query(query): Query<CityQuery>,
) -> Listing<Row> {
    let scope = query.scope();
    rows(&executor, &scope, |_| queries::invoice_listing(&scope)).await
}

pub async fn sales(
    Extension(executor): Extension<ShardExecutor>,
    Query(query): Query<CityQuery>,
) -> Listing<SaleSummary> {
    let scope = query.scope();
    mapped(&executor, &scope, |_| queries::invoice_listing(&scope)).await
}

pub async fn employees(
    Extension(executor): Extension<ShardExecutor>,
    Query(query): Query<CityQuery>,
) -> Listing<Row> {
    let scope = query.scope();
    rows(&executor, &scope, |_| queries::employees(&scope)).await
}

pub async fn purchases(
    Extension(executor): Extension<ShardExecutor>,
    Query(query): Query<CityQuery>,
) -> Listing<PurchaseSummary> {
    let scope = query.scope();
    mapped(&executor, &scope, |_| queries::purchases(&scope)).await
}

pub async fn accounting_entries(
    Extension(executor): Extension<ShardExecutor>,
    Query(query): Query<CityQuery>,
) -> Listing<Row> {
    rows(&executor, &query.scope(), |_| queries::accounting_entries()).await
}

pub async fn adjustments(
    Extension(executor): Extension<ShardExecutor>,
    Query(query): Query<CityQuery>,
) -> Listing<Row> {
    let scope = query.scope();
    rows(&executor, &scope, |_| queries::adjustments(&scope)).await
}

/// Latest entries of every city's activity log.
pub async fn general_log(Extension(executor): Extension<ShardExecutor>) -> Listing<Row> {
    rows(&executor, &Scope::All, |_| queries::general_log()).await
}
