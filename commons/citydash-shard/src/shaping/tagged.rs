//! Demultiplexing of recordsets whose rows carry a record-kind column.

use serde::Serialize;
use tracing::trace;

use crate::error::ShapeError;
use crate::row::Row;

/// The three record kinds a multi-purpose procedure interleaves.
#[derive(Debug, Clone, PartialEq)]
pub enum RowKind<H, D, T> {
    Header(H),
    Detail(D),
    Totals(T),
}

/// Mapping from one tagged recordset layout to named records.
pub trait TaggedLayout {
    type Header;
    type Detail;
    type Totals;

    /// Column holding the kind discriminator.
    const TAG_COLUMN: &'static str;
    /// Tag value of the header row, reported when it is missing.
    const HEADER_TAG: &'static str;

    /// Maps one row given its tag. Unknown tags return `None`.
    fn classify(
        tag: &str,
        row: &Row,
    ) -> Option<RowKind<Self::Header, Self::Detail, Self::Totals>>;
}

/// A header with its detail lines and optional totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaggedDocument<H, D, T> {
    pub header: H,
    pub details: Vec<D>,
    pub totals_summary: Option<T>,
}

/// Groups `rows` by their tag and assembles one document.
///
/// The first header and the first totals row win; detail rows keep their
/// recordset order. A recordset without a header row is malformed.
pub fn demux<L: TaggedLayout>(
    rows: &[Row],
) -> Result<TaggedDocument<L::Header, L::Detail, L::Totals>, ShapeError> {
    let mut header = None;
    let mut details = Vec::new();
    let mut totals = None;

    for row in rows {
        let Some(tag) = row.text(L::TAG_COLUMN).map(str::trim) else {
            trace!("row without '{}' column skipped", L::TAG_COLUMN);
            continue;
        };
        match L::classify(tag, row) {
            Some(RowKind::Header(h)) => {
                if header.is_none() {
                    header = Some(h);
                }
            }
            Some(RowKind::Detail(d)) => details.push(d),
            Some(RowKind::Totals(t)) => {
                if totals.is_none() {
                    totals = Some(t);
                }
            }
            None => trace!(tag, "row with unknown tag skipped"),
        }
    }

    let header =
        header.ok_or_else(|| ShapeError::MissingKind(L::HEADER_TAG.to_string()))?;
    Ok(TaggedDocument {
        header,
        details,
        totals_summary: totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::SqlValue;
    use crate::shaping::labelled::parse_labelled_number;

    struct Generic;

    #[derive(Debug, PartialEq)]
    struct Head(String);
    #[derive(Debug, PartialEq)]
    struct Line(String, f64);
    #[derive(Debug, PartialEq)]
    struct Sums {
        subtotal: f64,
        total: f64,
    }

    impl TaggedLayout for Generic {
        type Header = Head;
        type Detail = Line;
        type Totals = Sums;
        const TAG_COLUMN: &'static str = "kind";
        const HEADER_TAG: &'static str = "HEADER";

        fn classify(tag: &str, row: &Row) -> Option<RowKind<Head, Line, Sums>> {
            match tag {
                "HEADER" => Some(RowKind::Header(Head(
                    row.text("c1").unwrap_or_default().to_string(),
                ))),
                "DETAIL" => Some(RowKind::Detail(Line(
                    row.text("c1").unwrap_or_default().to_string(),
                    row.f64("c2").unwrap_or_default(),
                ))),
                "TOTAL" => Some(RowKind::Totals(Sums {
                    subtotal: parse_labelled_number(row.text("c1"), "Subtotal"),
                    total: parse_labelled_number(row.text("c2"), "Total"),
                })),
                _ => None,
            }
        }
    }

    fn row(kind: &str, c1: &str, c2: SqlValue) -> Row {
        Row::new().with("kind", kind).with("c1", c1).with("c2", c2)
    }

    #[test]
    fn groups_header_details_and_totals() {
        let rows = vec![
            row("DETAIL", "first", SqlValue::Float(2.0)),
            row("HEADER", "doc-1", SqlValue::Null),
            row("DETAIL", "second", SqlValue::Float(3.5)),
            row("TOTAL", "Subtotal=5.50", SqlValue::from("Total=6.16")),
        ];
        let doc = demux::<Generic>(&rows).unwrap();
        assert_eq!(doc.header, Head("doc-1".into()));
        assert_eq!(
            doc.details,
            vec![Line("first".into(), 2.0), Line("second".into(), 3.5)]
        );
        assert_eq!(
            doc.totals_summary,
            Some(Sums {
                subtotal: 5.5,
                total: 6.16
            })
        );
    }

    #[test]
    fn missing_header_is_malformed() {
        let rows = vec![row("DETAIL", "orphan", SqlValue::Float(1.0))];
        assert_eq!(
            demux::<Generic>(&rows),
            Err(ShapeError::MissingKind("HEADER".into()))
        );
    }

    #[test]
    fn unknown_and_untagged_rows_are_ignored() {
        let rows = vec![
            row("HEADER", "doc-2", SqlValue::Null),
            row("FOOTER", "x", SqlValue::Null),
            Row::new().with("c1", "no tag"),
        ];
        let doc = demux::<Generic>(&rows).unwrap();
        assert!(doc.details.is_empty());
        assert_eq!(doc.totals_summary, None);
    }
}
