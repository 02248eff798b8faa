//! Payroll: payment periods of one employee joined with their bonus and
//! discount lines.

use serde::Serialize;

use crate::row::{RecordSets, Row, SqlValue};
use crate::scope::ALL_SHARDS;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayrollItem {
    pub id_detalle: SqlValue,
    pub tipo_detalle: SqlValue,
    pub fecha_detalle: SqlValue,
    pub valor_detalle: SqlValue,
    pub estado_detalle: SqlValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayrollPeriod {
    pub periodo_pago: SqlValue,
    pub empleado_id: SqlValue,
    pub sueldo_base: SqlValue,
    pub bonificaciones: SqlValue,
    pub descuentos: SqlValue,
    pub neto_a_pagar: SqlValue,
    pub estado_pago: SqlValue,
    pub details: Vec<PayrollItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payroll {
    pub main_payroll: Vec<PayrollPeriod>,
}

/// Year/month selection. `None` means every value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodFilter {
    pub year: Option<i32>,
    pub month: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field} '{value}'")]
pub struct PeriodFilterError {
    pub field: &'static str,
    pub value: String,
}

impl PeriodFilter {
    /// Missing values and `ALL` select everything. Months are compared as
    /// two digits, so `3` and `03` are the same month.
    pub fn parse(
        year: Option<&str>,
        month: Option<&str>,
    ) -> Result<Self, PeriodFilterError> {
        fn specific(v: Option<&str>) -> Option<&str> {
            v.map(str::trim)
                .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(ALL_SHARDS))
        }
        let year = match specific(year) {
            None => None,
            Some(y) => Some(y.parse::<i32>().map_err(|_| PeriodFilterError {
                field: "year",
                value: y.to_string(),
            })?),
        };
        let month = match specific(month) {
            None => None,
            Some(m) => match m.parse::<u8>() {
                Ok(n @ 1..=12) => Some(format!("{n:02}")),
                _ => {
                    return Err(PeriodFilterError {
                        field: "month",
                        value: m.to_string(),
                    });
                }
            },
        };
        Ok(Self { year, month })
    }

    /// Both year and month given: the procedure can do the filtering.
    pub fn is_exact(&self) -> bool {
        self.year.is_some() && self.month.is_some()
    }

    /// Matches a `YYYY-MM` period identifier.
    pub fn matches(&self, period: &str) -> bool {
        let mut parts = period.trim().splitn(3, '-');
        let year = parts.next().and_then(|y| y.trim().parse::<i32>().ok());
        let month = parts.next().map(str::trim);
        let year_ok = self.year.is_none_or(|want| year == Some(want));
        let month_ok = self
            .month
            .as_deref()
            .is_none_or(|want| month == Some(want));
        year_ok && month_ok
    }
}

/// Keeps the periods accepted by `filter` and the lines that belong to
/// them and to `employee`.
pub fn filter_periods<'a>(
    main: &'a [Row],
    details: &'a [Row],
    employee: &str,
    filter: &PeriodFilter,
) -> (Vec<&'a Row>, Vec<&'a Row>) {
    let periods: Vec<&Row> = main
        .iter()
        .filter(|row| row.key("Pago").is_some_and(|p| filter.matches(&p)))
        .collect();
    let keys: Vec<String> = periods.iter().filter_map(|r| r.key("Pago")).collect();
    let lines = details
        .iter()
        .filter(|row| {
            row.key("id_Pago").is_some_and(|p| keys.contains(&p))
                && row.key("id_Empleado").as_deref() == Some(employee.trim())
        })
        .collect();
    (periods, lines)
}

/// Attaches to every period the lines with the same employee and period.
pub fn combine_payroll<'a>(
    main: impl IntoIterator<Item = &'a Row>,
    details: &[&'a Row],
) -> Vec<PayrollPeriod> {
    main.into_iter()
        .map(|period| {
            let employee = period.key("Empleado");
            let pago = period.key("Pago");
            let items = details
                .iter()
                .filter(|d| {
                    d.key("id_Empleado") == employee && d.key("id_Pago") == pago
                })
                .map(|d| PayrollItem {
                    id_detalle: d.value("id_detalle").clone(),
                    tipo_detalle: d.value("tipo_detalle").clone(),
                    fecha_detalle: d.value("fecha").clone(),
                    valor_detalle: d.value("valor").clone(),
                    estado_detalle: d.value("estado").clone(),
                })
                .collect();
            PayrollPeriod {
                periodo_pago: period.value("Pago").clone(),
                empleado_id: period.value("Empleado").clone(),
                sueldo_base: period.value("Sueldo").clone(),
                bonificaciones: period.value("Bonificaciones").clone(),
                descuentos: period.value("Descuentos").clone(),
                neto_a_pagar: period.value("Neto").clone(),
                estado_pago: period.value("Estado").clone(),
                details: items,
            }
        })
        .collect()
}

/// Shapes the two payroll recordsets (periods, lines).
///
/// `filter` is applied in process when given; pass `None` when the
/// procedure already filtered by period.
pub fn shape_payroll(
    sets: &RecordSets,
    employee: &str,
    filter: Option<&PeriodFilter>,
) -> Payroll {
    let main = sets.first().map(Vec::as_slice).unwrap_or_default();
    let details = sets.get(1).map(Vec::as_slice).unwrap_or_default();
    let main_payroll = match filter {
        Some(filter) => {
            let (periods, lines) = filter_periods(main, details, employee, filter);
            combine_payroll(periods, &lines)
        }
        None => {
            let lines: Vec<&Row> = details.iter().collect();
            combine_payroll(main, &lines)
        }
    };
    Payroll { main_payroll }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(pago: &str, neto: f64) -> Row {
        Row::new()
            .with("Pago", pago)
            .with("Empleado", "E001      ")
            .with("Sueldo", 800.0)
            .with("Neto", neto)
    }

    fn line(id: &str, tipo: &str, pago: &str, valor: f64) -> Row {
        Row::new()
            .with("id_detalle", id)
            .with("tipo_detalle", tipo)
            .with("valor", valor)
            .with("id_Empleado", "E001")
            .with("id_Pago", pago)
    }

    fn sets() -> RecordSets {
        vec![
            vec![
                period("2024-02", 850.0),
                period("2024-01", 790.0),
                period("2023-12", 800.0),
            ],
            vec![
                line("B1", "BON", "2024-02", 50.0),
                line("D1", "DES", "2024-01", 10.0),
                line("B2", "BON", "2023-12", 0.0),
            ],
        ]
    }

    #[test]
    fn parse_filter() {
        assert_eq!(
            PeriodFilter::parse(Some("ALL"), None).unwrap(),
            PeriodFilter::default()
        );
        let f = PeriodFilter::parse(Some("2024"), Some("3")).unwrap();
        assert_eq!(f.month.as_deref(), Some("03"));
        assert!(f.is_exact());
        assert!(PeriodFilter::parse(Some("20x4"), None).is_err());
        assert!(PeriodFilter::parse(None, Some("13")).is_err());
    }

    #[test]
    fn joins_lines_to_periods() {
        let payroll = shape_payroll(&sets(), "E001", None);
        assert_eq!(payroll.main_payroll.len(), 3);
        let feb = &payroll.main_payroll[0];
        assert_eq!(feb.periodo_pago, SqlValue::from("2024-02"));
        assert_eq!(feb.details.len(), 1);
        assert_eq!(feb.details[0].id_detalle, SqlValue::from("B1"));
        assert_eq!(feb.details[0].valor_detalle, SqlValue::Float(50.0));
    }

    #[test]
    fn filters_by_year_in_process() {
        let filter = PeriodFilter::parse(Some("2024"), Some("ALL")).unwrap();
        let payroll = shape_payroll(&sets(), "E001", Some(&filter));
        let periods: Vec<_> = payroll
            .main_payroll
            .iter()
            .map(|p| p.periodo_pago.clone())
            .collect();
        assert_eq!(periods, vec![SqlValue::from("2024-02"), SqlValue::from("2024-01")]);
        assert_eq!(payroll.main_payroll[1].details[0].tipo_detalle, SqlValue::from("DES"));
    }

    #[test]
    fn filters_by_month_across_years() {
        let filter = PeriodFilter::parse(None, Some("12")).unwrap();
        let payroll = shape_payroll(&sets(), "E001", Some(&filter));
        assert_eq!(payroll.main_payroll.len(), 1);
        assert_eq!(payroll.main_payroll[0].details.len(), 1);
    }

    #[test]
    fn serializes_main_payroll_key() {
        let json = serde_json::to_value(shape_payroll(&vec![], "E001", None)).unwrap();
        assert_eq!(json, serde_json::json!({ "mainPayroll": [] }));
    }
}
