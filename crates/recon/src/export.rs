//! Reconciled table -> delimited text.

use std::io::Write;

use crate::error::ReconError;
use crate::model::{ReconciledRow, RECONCILED_HEADERS};

/// Write the fixed 17-column header followed by one line per row. Cells
/// holding the delimiter, a quote or a newline are quoted.
pub fn write_reconciled_csv<W: Write>(
    writer: W,
    rows: &[ReconciledRow],
    delimiter: u8,
) -> Result<(), ReconError> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);

    wtr.write_record(RECONCILED_HEADERS)
        .map_err(|e| ReconError::Export(e.to_string()))?;
    for row in rows {
        wtr.write_record(row.cells())
            .map_err(|e| ReconError::Export(e.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Convenience wrapper returning the CSV as a string.
pub fn reconciled_csv_string(rows: &[ReconciledRow], delimiter: u8) -> Result<String, ReconError> {
    let mut buf = Vec::new();
    write_reconciled_csv(&mut buf, rows, delimiter)?;
    String::from_utf8(buf).map_err(|e| ReconError::Export(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::load_record_set;
    use crate::model::{Record, ReconInput, RecordSet, Role};
    use crate::reconcile::reconcile;

    fn rows() -> Vec<ReconciledRow> {
        let input = ReconInput {
            accounts: RecordSet::from_records(vec![
                Record::new()
                    .with("Company Name", "Acme, Inc.")
                    .with("Industry", "Construction")
                    .with("Revenue Range", "$1M-$5M"),
                Record::new()
                    .with("Company Name", "Quote \"Co\"")
                    .with("Industry", "Staffing"),
            ]),
            calls: Some(RecordSet::from_records(vec![Record::new()
                .with("Company Name", "Acme, Inc.")
                .with("Dials", "8")
                .with("Connects", "2")])),
            ..ReconInput::default()
        };
        reconcile(&input)
    }

    #[test]
    fn header_is_fixed() {
        let out = reconciled_csv_string(&[], b',').unwrap();
        assert_eq!(out.lines().next().unwrap(), RECONCILED_HEADERS.join(","));
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn delimiter_cells_are_quoted() {
        let out = reconciled_csv_string(&rows(), b',').unwrap();
        let line = out.lines().nth(1).unwrap();
        assert!(line.starts_with("\"Acme, Inc.\",Construction,,$1M-$5M,"));
        assert!(line.contains(",8,2,25.0%,"));
    }

    #[test]
    fn round_trips_through_reader() {
        let original = rows();
        let out = reconciled_csv_string(&original, b',').unwrap();
        let set = load_record_set(Role::Accounts, &out).unwrap();
        assert_eq!(set.columns, RECONCILED_HEADERS.to_vec());
        assert_eq!(set.len(), original.len());
        for (record, row) in set.records.iter().zip(&original) {
            for (header, cell) in RECONCILED_HEADERS.iter().zip(row.cells()) {
                assert_eq!(record.text(header), cell);
            }
        }
    }

    #[test]
    fn custom_delimiter() {
        let out = reconciled_csv_string(&rows(), b';').unwrap();
        let line = out.lines().nth(1).unwrap();
        assert!(line.starts_with("Acme, Inc.;Construction;"));
    }
}
