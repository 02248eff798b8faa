//! SQL Server transport built on tiberius and a mobc pool per shard.

mod manager;
mod session;

use std::borrow::Cow;

use tiberius::error::Error as TdsError;
use tiberius::{ColumnData, FromSql, ToSql};

use crate::error::ShardError;
use crate::query::ParamValue;
use crate::row::{Row, SqlValue};

pub use manager::{TdsClient, TdsManager};
pub use session::{MssqlConnector, MssqlSession, PoolConfig};

impl ToSql for ParamValue {
    fn to_sql(&self) -> ColumnData<'_> {
        match self {
            ParamValue::Text(v) => ColumnData::String(v.as_deref().map(Cow::Borrowed)),
            ParamValue::Int(v) => ColumnData::I32(*v),
        }
    }
}

/// Server-side failures are query errors; everything else means the
/// connection can no longer be trusted.
pub(crate) fn classify(code: &str, error: TdsError) -> ShardError {
    match error {
        TdsError::Server(e) => ShardError::query_failed(code, e),
        e @ (TdsError::Conversion(_)
        | TdsError::Encoding(_)
        | TdsError::Utf8
        | TdsError::Utf16
        | TdsError::ParseInt(_)) => ShardError::query_failed(code, e),
        other => ShardError::unreachable(code, other),
    }
}

/// Groups a row stream into result sets. Every metadata token opens a
/// new set, so a statement that returned no rows keeps its position.
#[derive(Debug)]
pub(crate) struct ResultSetCollector<R> {
    sets: Vec<Vec<R>>,
}

impl<R> ResultSetCollector<R> {
    pub(crate) fn new() -> Self {
        Self { sets: Vec::new() }
    }

    pub(crate) fn metadata(&mut self) {
        self.sets.push(Vec::new());
    }

    pub(crate) fn row(&mut self, row: R) {
        match self.sets.last_mut() {
            Some(set) => set.push(row),
            None => self.sets.push(vec![row]),
        }
    }

    pub(crate) fn finish(self) -> Vec<Vec<R>> {
        self.sets
    }
}

pub(crate) fn convert_row(row: tiberius::Row) -> Row {
    let names: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
    let mut out = Row::new();
    for (name, data) in names.iter().zip(row) {
        out.push(name, convert_value(data));
    }
    out
}

fn convert_value(data: ColumnData<'static>) -> SqlValue {
    let temporal = |d: &ColumnData<'static>| -> SqlValue {
        match d {
            ColumnData::Date(_) => chrono::NaiveDate::from_sql(d).ok().flatten().into(),
            ColumnData::Time(_) => chrono::NaiveTime::from_sql(d).ok().flatten().into(),
            ColumnData::DateTimeOffset(_) => {
                chrono::DateTime::<chrono::FixedOffset>::from_sql(d)
                    .ok()
                    .flatten()
                    .into()
            }
            _ => chrono::NaiveDateTime::from_sql(d).ok().flatten().into(),
        }
    };
    match data {
        ColumnData::U8(v) => v.map(i64::from).into(),
        ColumnData::I16(v) => v.map(i64::from).into(),
        ColumnData::I32(v) => v.map(i64::from).into(),
        ColumnData::I64(v) => v.into(),
        ColumnData::F32(v) => v.map(f64::from).into(),
        ColumnData::F64(v) => v.into(),
        ColumnData::Bit(v) => v.into(),
        ColumnData::String(v) => v.map(Cow::into_owned).into(),
        ColumnData::Guid(v) => v.map(|g| g.to_string()).into(),
        ColumnData::Binary(v) => v.map_or(SqlValue::Null, |b| SqlValue::Bytes(b.into_owned())),
        ColumnData::Numeric(v) => v
            .map(|n| n.value() as f64 / 10f64.powi(i32::from(n.scale())))
            .into(),
        ColumnData::Xml(v) => v.map(|x| x.into_owned().into_string()).into(),
        other @ (ColumnData::DateTime(_)
        | ColumnData::SmallDateTime(_)
        | ColumnData::DateTime2(_)
        | ColumnData::Date(_)
        | ColumnData::Time(_)
        | ColumnData::DateTimeOffset(_)) => temporal(&other),
    }
}
