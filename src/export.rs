use crate::{Error, Result, SpellError};
use rust_xlsxwriter::{Format, Workbook};
use std::fs;
use std::path::{Path, PathBuf};

pub const SHEET_NAME: &str = "Spell Errors";

/// Serialize records into an `.xlsx` workbook: one sheet, a header row,
/// then one row per record in the given order.
pub fn to_xlsx(records: &[SpellError]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, name) in SpellError::COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &header)?;
    }

    for (idx, record) in records.iter().enumerate() {
        let row = u32::try_from(idx + 1)
            .map_err(|_| Error::Export("too many rows for one worksheet".to_string()))?;
        sheet.write_string(row, 0, &record.document_file_name)?;
        sheet.write_string(row, 1, &record.misspelled_text)?;
        sheet.write_number(row, 2, record.page_number)?;
        sheet.write_number(row, 3, record.line_number)?;
        sheet.write_number(row, 4, record.position as f64)?;
        sheet.write_string(row, 5, &record.suggested_words)?;
    }

    sheet.set_freeze_panes(1, 0)?;
    sheet.autofit();

    Ok(workbook.save_to_buffer()?)
}

/// Write records to `path`, adding the `.xlsx` extension when there is none.
/// Returns the path actually written.
pub fn write_xlsx(path: &Path, records: &[SpellError]) -> Result<PathBuf> {
    let path = if path.extension().is_none() {
        path.with_extension("xlsx")
    } else {
        path.to_path_buf()
    };

    let bytes = to_xlsx(records)?;
    fs::write(&path, bytes)
        .map_err(|e| Error::Export(format!("cannot write {}: {}", path.display(), e)))?;

    tracing::info!("Exported {} record(s) to {}", records.len(), path.display());
    Ok(path)
}
