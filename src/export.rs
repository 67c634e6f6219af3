//! Export the grammar pointers to CSV.
//!
//! One row per record the model returned, numbered from 1, so the results can
//! be reviewed in a spreadsheet.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::grouper::AnnotationRow;

/// Write `rows` as CSV with header `,Satz,Satzteil,Fehler`
pub fn write_csv<W: Write>(writer: W, rows: &[AnnotationRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(["", "Satz", "Satzteil", "Fehler"])
        .context("Failed to write export CSV header")?;

    for (i, row) in rows.iter().enumerate() {
        let number = (i + 1).to_string();
        let category = row.category.as_ref().map(|c| c.label()).unwrap_or("");
        wtr.write_record([
            number.as_str(),
            row.sentence.as_str(),
            row.substring.as_str(),
            category,
        ])
        .context("Failed to write export CSV row")?;
    }

    wtr.flush().context("Failed to flush export CSV")?;
    Ok(())
}

/// File name for an export made on `date`, e.g. `Grammar-Pointers-5-3-2025.csv`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("Grammar-Pointers-{}.csv", date.format("%-d-%-m-%Y"))
}

/// Write the export into `dir`, named after today's date. Returns the path.
pub fn export_to_dir(dir: &Path, rows: &[AnnotationRow]) -> Result<PathBuf> {
    let path = dir.join(export_file_name(chrono::Local::now().date_naive()));
    let file = std::fs::File::create(&path)
        .with_context(|| format!("Failed to create export CSV '{}'", path.display()))?;

    write_csv(file, rows)?;
    tracing::info!("Exported {} rows to {}", rows.len(), path.display());

    Ok(path)
}
