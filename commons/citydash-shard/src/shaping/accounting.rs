//! Accounting entries (`sp_ver_asiento_completo`): header recordset then lines.

use serde::Serialize;

use crate::error::ShapeError;
use crate::row::{RecordSets, Row, SqlValue};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(non_snake_case)]
pub struct EntryHeader {
    pub id_Asiento: SqlValue,
    pub asi_Fecha_Hora: SqlValue,
    pub asi_Descripcion: SqlValue,
    pub asi_total_debe: SqlValue,
    pub asi_total_haber: SqlValue,
    pub ESTADO_ASI: SqlValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(non_snake_case)]
pub struct EntryLine {
    pub id_cuenta: SqlValue,
    pub cue_nombre: SqlValue,
    pub det_Debito: SqlValue,
    pub det_Credito: SqlValue,
    pub det_Descripcion: SqlValue,
    pub ESTADO_DET: SqlValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountingEntry {
    pub header: EntryHeader,
    pub details: Vec<EntryLine>,
}

impl From<&Row> for EntryLine {
    fn from(row: &Row) -> Self {
        let v = |c: &str| row.value(c).clone();
        Self {
            id_cuenta: v("id_Cuenta"),
            cue_nombre: v("cue_Nombre"),
            det_Debito: v("det_Debito"),
            det_Credito: v("det_Credito"),
            det_Descripcion: v("det_Descripcion"),
            ESTADO_DET: v("ESTADO_DET"),
        }
    }
}

pub fn shape_accounting_entry(
    sets: &RecordSets,
) -> Result<AccountingEntry, ShapeError> {
    let row = sets
        .first()
        .and_then(|set| set.first())
        .ok_or_else(|| ShapeError::MissingKind("entry header".into()))?;
    let v = |c: &str| row.value(c).clone();
    let header = EntryHeader {
        id_Asiento: v("id_Asiento"),
        asi_Fecha_Hora: v("asi_Fecha_Hora"),
        asi_Descripcion: v("asi_Descripcion"),
        asi_total_debe: v("asi_total_debe"),
        asi_total_haber: v("asi_total_haber"),
        ESTADO_ASI: v("ESTADO_ASI"),
    };
    let details = sets
        .get(1)
        .map(|set| set.iter().map(EntryLine::from).collect())
        .unwrap_or_default();
    Ok(AccountingEntry { header, details })
}
