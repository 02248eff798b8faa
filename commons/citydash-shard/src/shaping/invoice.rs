//! Invoices. `sp_ver_factura_completa` answers with three recordsets:
//! header, lines and totals, each in positional columns `columna1`..`columna7`.

use serde::Serialize;

use crate::error::ShapeError;
use crate::row::{RecordSets, Row, SqlValue};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceHeader {
    pub id_factura: SqlValue,
    pub fecha_hora: SqlValue,
    pub cliente_nombre: SqlValue,
    pub cliente_ruc_ced: SqlValue,
    pub cliente_mail: SqlValue,
    pub descripcion_factura: SqlValue,
    pub estado_factura: SqlValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceLine {
    pub id_producto: SqlValue,
    pub descripcion_producto: SqlValue,
    pub unidad_medida: SqlValue,
    pub cantidad: SqlValue,
    pub precio_unitario: SqlValue,
    pub subtotal_producto: SqlValue,
    pub estado_detalle: SqlValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceDetail {
    pub header: InvoiceHeader,
    pub details: Vec<InvoiceLine>,
    /// Preformatted summary text from the totals recordset.
    pub totals_summary: SqlValue,
}

fn columna(row: &Row, n: usize) -> SqlValue {
    row.value(&format!("columna{n}")).clone()
}

pub fn shape_invoice(sets: &RecordSets) -> Result<InvoiceDetail, ShapeError> {
    let header = sets
        .first()
        .and_then(|set| set.first())
        .ok_or_else(|| ShapeError::MissingKind("invoice header".into()))?;
    let header = InvoiceHeader {
        id_factura: columna(header, 1),
        fecha_hora: columna(header, 2),
        cliente_nombre: columna(header, 3),
        cliente_ruc_ced: columna(header, 4),
        cliente_mail: columna(header, 5),
        descripcion_factura: columna(header, 6),
        estado_factura: columna(header, 7),
    };

    let details = sets
        .get(1)
        .map(|set| {
            set.iter()
                .map(|row| InvoiceLine {
                    id_producto: columna(row, 1),
                    descripcion_producto: columna(row, 2),
                    unidad_medida: columna(row, 3),
                    cantidad: columna(row, 4),
                    precio_unitario: columna(row, 5),
                    subtotal_producto: columna(row, 6),
                    estado_detalle: columna(row, 7),
                })
                .collect()
        })
        .unwrap_or_default();

    let totals_summary = sets
        .get(2)
        .and_then(|set| set.first())
        .map(|row| columna(row, 6))
        .unwrap_or(SqlValue::Null);

    Ok(InvoiceDetail {
        header,
        details,
        totals_summary,
    })
}

/// Sales view of the invoice listing procedure. Product columns are not
/// part of that procedure and are reported as `N/A`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(non_snake_case)]
pub struct SaleSummary {
    pub id_Factura: SqlValue,
    pub fac_Fecha_Hora: SqlValue,
    pub fac_Descripcion: SqlValue,
    pub fac_Subtotal: SqlValue,
    pub fac_IVA: SqlValue,
    pub fac_Total: SqlValue,
    pub cli_Nombre: SqlValue,
    pub CiudadCliente: SqlValue,
    pub pro_Descripcion: &'static str,
    pub pxf_Cantidad: &'static str,
    pub pxf_Valor: &'static str,
    pub ESTADO_FAC: SqlValue,
}

const NOT_AVAILABLE: &str = "N/A";

impl From<&Row> for SaleSummary {
    fn from(row: &Row) -> Self {
        let v = |c: &str| row.value(c).clone();
        Self {
            id_Factura: v("id_Factura"),
            fac_Fecha_Hora: v("fac_Fecha_Hora"),
            fac_Descripcion: v("fac_Descripcion"),
            fac_Subtotal: v("fac_Subtotal"),
            fac_IVA: v("fac_IVA"),
            fac_Total: v("fac_Total"),
            cli_Nombre: v("cli_Nombre_Completo"),
            CiudadCliente: v("CiudadCliente"),
            pro_Descripcion: NOT_AVAILABLE,
            pxf_Cantidad: NOT_AVAILABLE,
            pxf_Valor: NOT_AVAILABLE,
            ESTADO_FAC: v("ESTADO_FAC"),
        }
    }
}
