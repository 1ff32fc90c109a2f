use crate::models::{ContactTable, format_cell};

pub const CSV_FILE_NAME: &str = "contact_messages.csv";

/// CSV of `table` in its current row order: a header of field names, then one
/// line per row. No index column.
pub fn to_csv(table: &ContactTable) -> Result<Vec<u8>, csv::Error> {
    if table.columns().is_empty() {
        return Ok(Vec::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.values.iter().map(|cell| format_cell(cell.as_ref())))?;
    }

    writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))
}
