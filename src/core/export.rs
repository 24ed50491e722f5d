use crate::domain::model::TypedTable;
use crate::utils::error::{EtlError, Result};

/// Render the table as delimited text with a header row. Nulls are empty
/// cells.
pub fn to_delimited(table: &TypedTable, delimiter: u8) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    if !table.columns().is_empty() {
        writer.write_record(table.column_names())?;
    }

    for row in 0..table.row_count() {
        let cells: Vec<String> = table
            .columns()
            .iter()
            .map(|c| c.data.display(row).unwrap_or_default())
            .collect();
        writer.write_record(&cells)?;
    }

    let bytes = writer.into_inner().map_err(|e| EtlError::ProcessingError {
        message: format!("Failed to flush delimited output: {}", e),
    })?;
    String::from_utf8(bytes).map_err(|e| EtlError::ProcessingError {
        message: format!("Delimited output is not UTF-8: {}", e),
    })
}

pub fn to_csv(table: &TypedTable) -> Result<String> {
    to_delimited(table, b',')
}

pub fn to_tsv(table: &TypedTable) -> Result<String> {
    to_delimited(table, b'\t')
}

/// Rows as a pretty-printed JSON array.
pub fn to_json(table: &TypedTable) -> Result<String> {
    Ok(serde_json::to_string_pretty(&table.to_json_rows())?)
}

/// Console overview: one line per column (name, type, non-null count)
/// followed by the first `head` rows.
pub fn preview(table: &TypedTable, head: usize) -> String {
    let mut out = format!(
        "{} rows x {} columns\n",
        table.row_count(),
        table.columns().len()
    );

    for summary in table.summary() {
        out.push_str(&format!(
            "  {:<24} {:<12} {} non-null\n",
            summary.name, summary.column_type, summary.non_null
        ));
    }

    let rows = table.head(head);
    if !rows.is_empty() {
        out.push('\n');
        out.push_str(&table.column_names().join(" | "));
        out.push('\n');
        for row in rows {
            let cells: Vec<String> = row.into_iter().map(|c| c.unwrap_or_default()).collect();
            out.push_str(&cells.join(" | "));
            out.push('\n');
        }
    }

    out
}
