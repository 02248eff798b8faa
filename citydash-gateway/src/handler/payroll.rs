use axum::extract::{Path, Query};
use axum::{Extension, Json};
use citydash_shard::shaping::{Payroll, PeriodFilter, shape_payroll};
use citydash_shard::{Scope, ShardExecutor};
use serde::Deserialize;

use super::queries;
use crate::error::GatewayError;

#[derive(Deserialize, Debug, Default)]
pub struct PayrollQuery {
    pub ciudad: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
}

/// Payment periods of one employee in the city that pays them. The city
/// is required: payroll is never searched across cities.
pub async fn payroll(
    Extension(executor): Extension<ShardExecutor>,
    Path(employee): Path<String>,
    Query(query): Query<PayrollQuery>,
) -> Result<Json<Payroll>, GatewayError> {
    let scope = Scope::parse(query.ciudad.as_deref());
    if !scope.is_single() {
        return Err(GatewayError::MissingParam("ciudad"));
    }
    let filter = PeriodFilter::parse(query.year.as_deref(), query.month.as_deref())?;
    // the procedure already narrows to the requested period
    let in_process = (!filter.is_exact()).then_some(&filter);

    let merged = executor
        .run_all_with(
            &scope,
            |_| queries::payroll(&employee, &filter),
            |_, sets| Ok(vec![shape_payroll(&sets, &employee, in_process)]),
        )
        .await?;
    let payroll = merged
        .into_rows()
        .into_iter()
        .next()
        .map(|tagged| tagged.item)
        .unwrap_or(Payroll {
            main_payroll: Vec::new(),
        });
    Ok(Json(payroll))
}
