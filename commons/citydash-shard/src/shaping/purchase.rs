//! Purchase orders: `sp_ver_oc_completa` returns a single tagged recordset.

use serde::Serialize;

use crate::error::ShapeError;
use crate::row::{RecordSets, Row, SqlValue};
use crate::shaping::labelled::labelled_value;
use crate::shaping::tagged::{RowKind, TaggedDocument, TaggedLayout, demux};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseOrderHeader {
    pub id_orden_compra: SqlValue,
    pub proveedor_id: SqlValue,
    pub fecha_hora: SqlValue,
    pub estado_orden: SqlValue,
    pub usuario: SqlValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseOrderLine {
    pub id_producto: SqlValue,
    pub cantidad: SqlValue,
    pub precio_unitario: SqlValue,
    pub subtotal_producto: SqlValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseOrderTotals {
    pub subtotal: f64,
    pub iva: f64,
    pub total: f64,
}

pub type PurchaseOrder =
    TaggedDocument<PurchaseOrderHeader, PurchaseOrderLine, PurchaseOrderTotals>;

/// Rows tagged `OC_CABECERA`, `OC_DETALLE` and `TOTALES` in `tipo`,
/// values in positional columns `col1`..`col5`.
pub struct PurchaseOrderLayout;

impl TaggedLayout for PurchaseOrderLayout {
    type Header = PurchaseOrderHeader;
    type Detail = PurchaseOrderLine;
    type Totals = PurchaseOrderTotals;

    const TAG_COLUMN: &'static str = "tipo";
    const HEADER_TAG: &'static str = "OC_CABECERA";

    fn classify(
        tag: &str,
        row: &Row,
    ) -> Option<RowKind<Self::Header, Self::Detail, Self::Totals>> {
        let col = |n: usize| row.value(&format!("col{n}")).clone();
        match tag {
            "OC_CABECERA" => Some(RowKind::Header(PurchaseOrderHeader {
                id_orden_compra: col(1),
                proveedor_id: col(2),
                fecha_hora: col(3),
                estado_orden: col(4),
                usuario: col(5),
            })),
            // col4 is unused by the procedure
            "OC_DETALLE" => Some(RowKind::Detail(PurchaseOrderLine {
                id_producto: col(1),
                cantidad: col(2),
                precio_unitario: col(3),
                subtotal_producto: col(5),
            })),
            "TOTALES" => Some(RowKind::Totals(PurchaseOrderTotals {
                subtotal: labelled_value(row.value("col1"), "Subtotal"),
                iva: labelled_value(row.value("col2"), "IVA"),
                total: labelled_value(row.value("col3"), "Total"),
            })),
            _ => None,
        }
    }
}

pub fn shape_purchase_order(sets: &RecordSets) -> Result<PurchaseOrder, ShapeError> {
    let rows = sets.first().map(Vec::as_slice).unwrap_or_default();
    demux::<PurchaseOrderLayout>(rows)
}

/// One row of the purchase listing, with the total computed here.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(non_snake_case)]
pub struct PurchaseSummary {
    pub id_Compra: SqlValue,
    pub id_Proveedor: SqlValue,
    pub oc_Fecha_Hora: SqlValue,
    pub oc_Subtotal: SqlValue,
    pub oc_IVA: SqlValue,
    pub oc_Total: Option<f64>,
    pub ESTADO_OC: SqlValue,
}

impl From<&Row> for PurchaseSummary {
    fn from(row: &Row) -> Self {
        let subtotal = row.f64("oc_Subtotal");
        let iva = row.f64("oc_IVA");
        let total = match (subtotal, iva) {
            (None, None) => None,
            (s, i) => Some(s.unwrap_or(0.0) + i.unwrap_or(0.0)),
        };
        Self {
            id_Compra: row.value("id_Compra").clone(),
            id_Proveedor: row.value("id_Proveedor").clone(),
            oc_Fecha_Hora: row.value("oc_Fecha_Hora").clone(),
            oc_Subtotal: row.value("oc_Subtotal").clone(),
            oc_IVA: row.value("oc_IVA").clone(),
            oc_Total: total,
            ESTADO_OC: row.value("ESTADO_OC").clone(),
        }
    }
}
