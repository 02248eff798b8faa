//! Inventory adjustments. The procedure already returns named columns,
//! so rows pass through unchanged.

use serde::Serialize;

use crate::error::ShapeError;
use crate::row::{RecordSets, Row};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryAdjustment {
    pub header: Row,
    pub details: Vec<Row>,
}

pub fn shape_adjustment(
    sets: &RecordSets,
) -> Result<InventoryAdjustment, ShapeError> {
    let header = sets
        .first()
        .and_then(|set| set.first())
        .cloned()
        .ok_or_else(|| ShapeError::MissingKind("adjustment header".into()))?;
    let details = sets.get(1).cloned().unwrap_or_default();
    Ok(InventoryAdjustment { header, details })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_rows_through() {
        let sets = vec![
            vec![Row::new().with("id_Ajuste", "AJU-1")],
            vec![Row::new().with("id_Producto", "P-1").with("cantidad", 3)],
        ];
        let adjustment = shape_adjustment(&sets).unwrap();
        assert_eq!(adjustment.header.text("id_Ajuste"), Some("AJU-1"));
        assert_eq!(adjustment.details.len(), 1);
    }

    #[test]
    fn missing_header() {
        assert_eq!(
            shape_adjustment(&vec![]),
            Err(ShapeError::MissingKind("adjustment header".into()))
        );
    }
}
